//! `pdfbatch compress` – submit files, run the batch, report and collect results.

use anyhow::{bail, Context, Result};
use pdfbatch_core::config::BatchConfig;
use pdfbatch_core::summary::{format_signed_size, format_size};
use pdfbatch_core::{
    BatchHandle, JobEvent, JobPhase, JobStatus, Orchestrator, Payload, Policy, Quality, RunOutcome,
    SubmitParams,
};
use std::path::PathBuf;
use std::time::Instant;

const PROGRESS_INTERVAL_MS: u64 = 500;

#[derive(Debug)]
pub struct CompressArgs {
    pub files: Vec<PathBuf>,
    pub sequential: bool,
    pub quality: Option<Quality>,
    pub jobs: Option<usize>,
    pub fields: Vec<String>,
    pub bundle: bool,
    pub save: bool,
    pub out: Option<PathBuf>,
    pub retry_failed: u32,
}

/// Split `NAME=VALUE`; the name must be non-empty.
pub fn parse_field(s: &str) -> Result<(String, String)> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => bail!("invalid field '{}' (expected NAME=VALUE)", s),
    }
}

fn build_params(cfg: &BatchConfig, args: &CompressArgs) -> Result<SubmitParams> {
    let mut params = SubmitParams::new(args.quality.unwrap_or(cfg.default_quality));
    for f in &args.fields {
        let (name, value) = parse_field(f)?;
        params = params.with_field(name, value);
    }
    Ok(params)
}

pub async fn run_compress(mut cfg: BatchConfig, args: CompressArgs) -> Result<()> {
    if let Some(jobs) = args.jobs {
        cfg.max_parallel = jobs.max(1);
    }
    let params = build_params(&cfg, &args)?;
    let policy = if args.sequential {
        Policy::Sequential
    } else {
        Policy::Parallel
    };

    let payloads = args
        .files
        .iter()
        .map(|p| Payload::from_path(p).with_context(|| format!("cannot read {}", p.display())))
        .collect::<Result<Vec<_>>>()?;

    let orch = Orchestrator::from_config(cfg)?;
    let handle = orch.submit(payloads)?;
    println!(
        "Processing {} file(s) ({:?}, quality {})",
        handle.jobs().len(),
        policy,
        params.quality
    );

    let mut outcome = run_round(&orch, &handle, policy, params.clone()).await;
    let mut round = 0;
    while outcome.failed > 0 && round < args.retry_failed {
        let reset = orch.retry_failed(&handle);
        if reset.is_empty() {
            break;
        }
        round += 1;
        println!("Retrying {} failed file(s) (round {})", reset.len(), round);
        outcome = run_round(&orch, &handle, policy, params.clone()).await;
    }

    print_results(&handle);
    print_summary(&orch, &handle);

    let out_dir = match args.out {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let has_completed = handle.jobs().iter().any(|j| j.status() == JobStatus::Completed);
    if args.save && has_completed {
        let saved = orch.save_outputs(&handle, &out_dir).await?;
        for (_, path) in &saved.saved {
            println!("Saved {}", path.display());
        }
        for id in &saved.skipped {
            println!("Could not download output for {}", id);
        }
    }
    if args.bundle && has_completed {
        let archive = orch.bundle(&handle, &out_dir).await?;
        println!(
            "Archive {} ({} file(s), sha256 {})",
            archive.path.display(),
            archive.entries.len(),
            archive.sha256
        );
        if !archive.skipped.is_empty() {
            println!("  {} output(s) could not be downloaded and were left out", archive.skipped.len());
        }
    }

    let failed = handle.jobs().iter().filter(|j| j.status() == JobStatus::Failed).count();
    if failed > 0 {
        bail!("{} of {} file(s) failed", failed, handle.jobs().len());
    }
    Ok(())
}

/// One `execute` call with a progress printer fed by the event channel.
async fn run_round(
    orch: &Orchestrator,
    handle: &BatchHandle,
    policy: Policy,
    params: SubmitParams,
) -> RunOutcome {
    let (tx, mut rx) = tokio::sync::mpsc::channel::<JobEvent>(256);
    let watched = handle.clone();
    let printer = tokio::spawn(async move {
        let mut last_print = Instant::now();
        while let Some(ev) = rx.recv().await {
            let now = Instant::now();
            if now.duration_since(last_print).as_millis() as u64 >= PROGRESS_INTERVAL_MS
                || ev.status.is_terminal()
            {
                println!(
                    "\r  [{:>3}%] {} {} {}%  ",
                    watched.overall_progress(),
                    ev.id,
                    ev.status,
                    ev.progress
                );
                last_print = now;
            }
        }
    });
    let outcome = orch.execute(handle, policy, params, Some(tx)).await;
    let _ = printer.await;
    outcome
}

fn print_results(handle: &BatchHandle) {
    println!();
    for job in handle.jobs() {
        match &job.phase {
            JobPhase::Completed(r) => println!(
                "  ok     {}  {} -> {} ({})  {}",
                job.id,
                format_size(r.original_size),
                format_size(r.output_size),
                r.reduction_ratio,
                r.output_name
            ),
            JobPhase::Failed { error, .. } => {
                println!("  failed {}  {}", job.id, error);
                if error.needs_top_up() {
                    println!("         insufficient balance: top up your account or check your API key, then rerun");
                }
            }
            other => println!("  {:<6} {}", other.status(), job.id),
        }
    }
}

fn print_summary(orch: &Orchestrator, handle: &BatchHandle) {
    match orch.summary(handle) {
        Some(s) => println!(
            "\n{} file(s) compressed: {} -> {}, saved {} ({:.1}%)",
            s.completed,
            format_size(s.total_original),
            format_size(s.total_output),
            format_signed_size(s.total_saved),
            s.percentage_saved
        ),
        None => println!("\nNo files were compressed."),
    }
}
