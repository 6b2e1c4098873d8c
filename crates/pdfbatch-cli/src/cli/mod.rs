//! CLI for the pdfbatch orchestrator.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pdfbatch_core::{config, Quality};
use std::path::PathBuf;

use commands::{run_completions, run_compress, run_config, CompressArgs};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pdfbatch")]
#[command(about = "pdfbatch: compress many PDFs through a remote API in one batch", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Upload files for compression and report per-file results.
    Compress {
        /// PDF files to process. Names must be unique within the batch.
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,

        /// Process files one at a time, in the order given.
        #[arg(long)]
        sequential: bool,

        /// Compression level: high, medium or low (defaults to the config value).
        #[arg(long, short = 'q')]
        quality: Option<Quality>,

        /// Maximum uploads in flight under the parallel policy (defaults to the config value).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,

        /// Extra form field sent with every file, as NAME=VALUE. Repeatable.
        #[arg(long = "field", value_name = "NAME=VALUE")]
        fields: Vec<String>,

        /// Write all outputs into one dated zip archive.
        #[arg(long)]
        bundle: bool,

        /// Save each output as its own file.
        #[arg(long)]
        save: bool,

        /// Directory for saved files and the archive (default: current directory).
        #[arg(long, short = 'o', value_name = "DIR")]
        out: Option<PathBuf>,

        /// Retry failed files up to N more rounds (quota failures are not retried).
        #[arg(long, default_value = "0", value_name = "N")]
        retry_failed: u32,
    },

    /// Show the config file path and effective settings.
    Config,

    /// Print shell completions to stdout.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Compress {
                files,
                sequential,
                quality,
                jobs,
                fields,
                bundle,
                save,
                out,
                retry_failed,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                let args = CompressArgs {
                    files,
                    sequential,
                    quality,
                    jobs,
                    fields,
                    bundle,
                    save,
                    out,
                    retry_failed,
                };
                run_compress(cfg, args).await?;
            }
            CliCommand::Config => run_config()?,
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
