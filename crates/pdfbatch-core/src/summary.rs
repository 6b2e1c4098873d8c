//! Aggregate statistics over the completed jobs of a batch.

use crate::job::Job;

/// Totals over every completed job.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub completed: usize,
    pub total_original: u64,
    pub total_output: u64,
    /// Negative when outputs came out larger than their inputs.
    pub total_saved: i64,
    /// `total_saved / total_original * 100`; 0.0 when nothing was measured.
    pub percentage_saved: f64,
}

/// Summarize completed jobs. `None` when no job has completed.
pub fn summarize(jobs: &[Job]) -> Option<BatchSummary> {
    let results: Vec<_> = jobs.iter().filter_map(|j| j.phase.result()).collect();
    if results.is_empty() {
        return None;
    }
    let total_original: u64 = results.iter().map(|r| r.original_size).sum();
    let total_output: u64 = results.iter().map(|r| r.output_size).sum();
    let total_saved = total_original as i64 - total_output as i64;
    let percentage_saved = if total_original > 0 {
        total_saved as f64 / total_original as f64 * 100.0
    } else {
        0.0
    };
    Some(BatchSummary {
        completed: results.len(),
        total_original,
        total_output,
        total_saved,
        percentage_saved,
    })
}

/// Human-readable size: `512 B`, `1.50 KB`, `2.00 MB`.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < MB {
        format!("{:.2} KB", b / KB)
    } else {
        format!("{:.2} MB", b / MB)
    }
}

/// Signed variant of `format_size` for savings that may be negative.
pub fn format_signed_size(bytes: i64) -> String {
    if bytes < 0 {
        format!("-{}", format_size(bytes.unsigned_abs()))
    } else {
        format_size(bytes as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobPhase, JobResult, Payload};
    use crate::report::{ErrorKind, JobError};

    fn completed(name: &str, original: u64, output: u64) -> Job {
        let mut j = Job::new(Payload::from_bytes(name, vec![0u8])).unwrap();
        j.phase = JobPhase::Completed(JobResult {
            original_size: original,
            output_size: output,
            reduction_ratio: String::new(),
            locator: String::new(),
            output_name: name.to_string(),
            stored_name: None,
        });
        j
    }

    fn failed(name: &str) -> Job {
        let mut j = Job::new(Payload::from_bytes(name, vec![0u8])).unwrap();
        j.phase = JobPhase::Failed {
            error: JobError::new(ErrorKind::Network, "down"),
            progress: 10,
        };
        j
    }

    #[test]
    fn totals_over_completed_only() {
        let jobs = vec![
            completed("a.pdf", 1000, 500),
            completed("b.pdf", 2000, 1000),
            completed("c.pdf", 3000, 1500),
            failed("d.pdf"),
        ];
        let s = summarize(&jobs).unwrap();
        assert_eq!(s.completed, 3);
        assert_eq!(s.total_original, 6000);
        assert_eq!(s.total_output, 3000);
        assert_eq!(s.total_saved, 3000);
        assert!((s.percentage_saved - 50.0).abs() < 1e-9);
    }

    #[test]
    fn none_without_completed_jobs() {
        assert!(summarize(&[]).is_none());
        assert!(summarize(&[failed("a.pdf")]).is_none());
    }

    #[test]
    fn growth_gives_negative_savings() {
        let s = summarize(&[completed("a.pdf", 1000, 1200)]).unwrap();
        assert_eq!(s.total_saved, -200);
        assert!((s.percentage_saved + 20.0).abs() < 1e-9);
    }

    #[test]
    fn zero_original_does_not_divide() {
        let s = summarize(&[completed("a.pdf", 0, 0)]).unwrap();
        assert_eq!(s.percentage_saved, 0.0);
    }

    #[test]
    fn order_does_not_matter() {
        let a = vec![completed("a.pdf", 10, 3), completed("b.pdf", 7, 7)];
        let b = vec![completed("b.pdf", 7, 7), completed("a.pdf", 10, 3)];
        assert_eq!(summarize(&a), summarize(&b));
    }

    #[test]
    fn sizes() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(2 * 1024 * 1024), "2.00 MB");
        assert_eq!(format_signed_size(-2048), "-2.00 KB");
    }
}
