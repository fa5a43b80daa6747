//! CLI-specific error types and their Notify rendering

use invcollect_core::error::{ConfigError, InvcollectError, ParamError};
use invcollect_core::notify::NotifyEvent;
use invcollect_http::HttpError;
use invcollect_inventory::InventoryError;

/// Process exit status for any fatal error.
pub const EXIT_FAILURE: u8 = 1;

/// CLI-specific error type.
///
/// Every variant is fatal for the run and is reported through a single
/// error Notify line by `main`.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Run configuration could not be resolved.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Run-parameter blob could not be decoded.
    #[error("parameter error: {0}")]
    Param(#[from] ParamError),

    /// Wrapped domain error from invcollect-core.
    #[error("{0}")]
    Core(#[from] InvcollectError),

    /// Inventory serialization or file output failed.
    #[error("inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// The HTTP client could not be built or a request could not be formed.
    #[error("http error: {0}")]
    Http(#[from] HttpError),

    /// The API answered with a failure status (or no answer at all).
    #[error("request to {url} failed ({status}): {message}")]
    Request {
        url: String,
        status: String,
        message: String,
    },

    /// The API answered with a body that is not usable JSON.
    #[error("invalid response from {url}: {reason}")]
    Response { url: String, reason: String },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Short error kind placed in the Notify `Info` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::Param(_) => "Configuration",
            Self::Core(InvcollectError::Config(_) | InvcollectError::Param(_)) => "Configuration",
            Self::Core(_) | Self::Io(_) | Self::JsonSerialize(_) => "Runtime",
            Self::Inventory(_) => "Serialization",
            Self::Http(_) | Self::Request { .. } | Self::Response { .. } => "Transport",
        }
    }

    /// Error Notify event (`Category=Error, State=Faulty, ItemResult=Error`).
    pub fn to_notify(&self, command: &str) -> NotifyEvent {
        NotifyEvent::error(command, self.to_string()).with_info(self.kind())
    }
}
