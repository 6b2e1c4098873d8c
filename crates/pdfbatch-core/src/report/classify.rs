//! Classify raw job failures into error kinds with display messages.

use crate::transport::response::error_message;

use super::error::{ErrorKind, JobError};

const QUOTA_MESSAGE: &str = "insufficient balance or free operations";

/// What actually went wrong, before classification.
#[derive(Debug, Clone)]
pub enum RawFailure {
    /// No response was received (connect, DNS, reset, timeout, task failure).
    Transport(String),
    /// Server answered with a non-success status.
    Status { code: u32, body: Vec<u8> },
    /// Success status, but the body did not decode into a result.
    Decode(String),
}

/// Map a raw failure to the per-job error taxonomy.
///
/// `quota_status` is the status code the API reserves for balance exhaustion
/// (402 by default); it is the only status mapped to `ErrorKind::Quota`.
pub fn report(failure: &RawFailure, quota_status: u32) -> JobError {
    match failure {
        RawFailure::Transport(msg) => {
            JobError::new(ErrorKind::Network, format!("network error: {}", msg))
        }
        RawFailure::Status { code, body } if *code == quota_status => {
            let msg = error_message(body).unwrap_or_else(|| QUOTA_MESSAGE.to_string());
            JobError::new(ErrorKind::Quota, msg)
        }
        RawFailure::Status { code, body } => {
            let msg = match error_message(body) {
                Some(m) => format!("{} (HTTP {})", m, code),
                None => format!("remote processing failed (HTTP {})", code),
            };
            JobError::new(ErrorKind::Remote, msg)
        }
        RawFailure::Decode(msg) => JobError::new(
            ErrorKind::Decode,
            format!("could not decode server response: {}", msg),
        ),
    }
}
