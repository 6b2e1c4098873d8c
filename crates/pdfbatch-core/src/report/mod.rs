//! Error taxonomy and reporting.
//!
//! Maps raw failures (transport, HTTP status, undecodable body) to a closed
//! set of per-job error kinds with a display message. Pure and stateless so
//! the CLI can reuse it to choose between a generic failure and a
//! specialized one (quota exhaustion routes to a top-up hint).

mod classify;
mod error;

pub use classify::{report, RawFailure};
pub use error::{ErrorKind, JobError, ValidationError};
