#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Local request errors (`HttpError`)
//! - [`url`]: Path/query re-encoding (`normalize_url`)
//! - [`proxy`]: Proxy descriptor from settings (`ProxyDescriptor`)
//! - [`retry`]: Retry policy (`RetryPolicy`)
//! - [`charset`]: Response body decoding (`decode_body`)
//! - [`debug`]: Masked request/response log (`DebugSink`)
//! - [`transport`]: Transport trait and reqwest implementation (`HttpTransport`)
//! - [`client`]: Resilient client (`HttpClient`, `HttpResult`)
//!
//! # Request Flow
//!
//! ```text
//! request(method, url, headers, body)
//!     |  normalize_url
//!   HttpTransport::send  <--- backoff sleep (GET + 5xx only)
//!     |  decode_body / extract_error_body
//!   HttpResult { is_success, status_code, headers, body }
//! ```

pub mod charset;
pub mod client;
pub mod debug;
pub mod error;
pub mod proxy;
pub mod retry;
pub mod transport;
pub mod url;

// --- Public API Re-exports ---

pub use client::{HttpClient, HttpResult, extract_error_body};
pub use debug::DebugSink;
pub use error::HttpError;
pub use proxy::{ProxyCredentials, ProxyDescriptor};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, Method, RawRequest, RawResponse, ReqwestTransport, TransportFailure};
pub use url::normalize_url;
