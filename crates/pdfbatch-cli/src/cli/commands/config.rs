//! `pdfbatch config` – show where the config lives and what it contains.

use anyhow::Result;
use pdfbatch_core::{config, logging};

pub fn run_config() -> Result<()> {
    let path = config::config_path()?;
    let mut shown = config::load_or_init()?;
    println!("# config: {}", path.display());
    if let Ok(log) = logging::log_path() {
        println!("# log:    {}", log.display());
    }
    if shown.api_key.is_some() {
        shown.api_key = Some("********".to_string());
    }
    print!("{}", toml::to_string_pretty(&shown)?);
    Ok(())
}
