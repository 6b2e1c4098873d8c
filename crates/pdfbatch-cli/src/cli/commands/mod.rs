//! CLI command handlers, one per file.

mod completions;
mod compress;
mod config;

pub use completions::run_completions;
pub use compress::{run_compress, CompressArgs};
pub use config::run_config;
