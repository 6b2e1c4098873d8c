//! I/O seam between the orchestrator and the remote processing API.
//!
//! `JobTransport` uploads one payload and returns the raw status and body;
//! interpretation (decode, error taxonomy) stays in the runner. Both traits
//! are blocking; async callers run them on `spawn_blocking`.

mod curl;
pub mod response;

pub use self::curl::CurlTransport;

use crate::job::{Payload, SubmitParams};

/// Status and body of the processing endpoint's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u32,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure before any response was received.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("{0}")]
    Curl(#[from] ::curl::Error),
    #[error("building upload form: {0}")]
    Form(#[from] ::curl::FormError),
    #[error("reading payload: {0}")]
    Io(#[from] std::io::Error),
}

/// Artifact download failure.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    Curl(#[from] ::curl::Error),
    #[error("HTTP {0}")]
    Http(u32),
    #[error("invalid artifact locator: {0}")]
    InvalidLocator(String),
}

/// Submits one file for remote processing.
pub trait JobTransport: Send + Sync {
    /// Upload `payload` with `params` as form fields. `on_upload(sent, total)`
    /// is called as bytes go out; `total` is 0 when the size is unknown.
    fn submit(
        &self,
        payload: &Payload,
        params: &SubmitParams,
        on_upload: &mut dyn FnMut(u64, u64),
    ) -> Result<RawResponse, TransportError>;
}

/// Retrieves a produced artifact by its locator.
pub trait ArtifactFetcher: Send + Sync {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, FetchError>;
}
