//! Retry and backoff policy for artifact fetches.
//!
//! Classification (timeouts, throttling, connection failures) and the
//! exponential backoff decision live here so the bundle and save paths share
//! one policy. Uploads are never retried here: a failed job is retried
//! explicitly by the caller.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{RetryDecision, RetryKind, RetryPolicy};
pub use run::run_with_retry;
