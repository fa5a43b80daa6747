#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`InventoryError`)
//! - [`entity`]: Entity accumulator (`EntityAccumulator`, `Entity`, `PropertyEntry`)
//! - [`property`]: Property key grammar (`PropertyKey`)
//! - [`xml`]: Minimal XML element tree (`XmlElement`)
//! - [`serializer`]: Entity list to XML fragment (`serialize`, `read_entities`)
//! - [`envelope`]: `<Inventory>` envelope (`wrap`)
//! - [`writer`]: `.inv` file output (`InventoryWriter`, `inventory_file_name`)
//!
//! # Data Flow
//!
//! ```text
//! start_entity / add_property
//!          |
//!   EntityAccumulator
//!          |  flush_and_clear (always clears)
//!   serialize -> wrap -> <agent>_<stamp>_<hex>.inv
//! ```

pub mod entity;
pub mod envelope;
pub mod error;
pub mod property;
pub mod serializer;
pub mod writer;
pub mod xml;

// --- Public API Re-exports ---

pub use entity::{DEFAULT_VALUE, Entity, EntityAccumulator, PropertyEntry};
pub use envelope::{wrap, wrap_at};
pub use error::InventoryError;
pub use property::PropertyKey;
pub use serializer::{read_entities, serialize};
pub use writer::{InventoryWriter, inventory_file_name};
pub use xml::XmlElement;
