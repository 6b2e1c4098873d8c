//! Batch progress: per-job change events and the derived overall figure.

use crate::job::{Job, JobId, JobStatus};

/// One status or progress change, published while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEvent {
    pub id: JobId,
    pub status: JobStatus,
    pub progress: u8,
}

impl JobEvent {
    pub fn from_job(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            status: job.status(),
            progress: job.progress(),
        }
    }
}

/// Mean job progress, rounded to the nearest integer percent. 0 for an empty batch.
pub fn overall_progress(jobs: &[Job]) -> u8 {
    if jobs.is_empty() {
        return 0;
    }
    let sum: u64 = jobs.iter().map(|j| u64::from(j.progress())).sum();
    let n = jobs.len() as u64;
    // round(sum / n) in integers, halves rounding up.
    ((sum * 2 + n) / (2 * n)).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobPhase, Payload};

    fn job_at(name: &str, phase: JobPhase) -> Job {
        let mut j = Job::new(Payload::from_bytes(name, vec![1u8])).unwrap();
        j.phase = phase;
        j
    }

    #[test]
    fn empty_batch_is_zero() {
        assert_eq!(overall_progress(&[]), 0);
    }

    #[test]
    fn mean_is_rounded() {
        let jobs = vec![
            job_at("a", JobPhase::Uploading { progress: 10 }),
            job_at("b", JobPhase::Processing { progress: 50 }),
            job_at("c", JobPhase::Idle),
        ];
        // 60 / 3 = 20
        assert_eq!(overall_progress(&jobs), 20);

        let jobs = vec![
            job_at("a", JobPhase::Uploading { progress: 1 }),
            job_at("b", JobPhase::Idle),
        ];
        // 0.5 rounds up
        assert_eq!(overall_progress(&jobs), 1);

        let jobs = vec![
            job_at("a", JobPhase::Uploading { progress: 1 }),
            job_at("b", JobPhase::Idle),
            job_at("c", JobPhase::Idle),
        ];
        assert_eq!(overall_progress(&jobs), 0);
    }

    #[test]
    fn failed_jobs_count_their_last_progress() {
        use crate::report::{ErrorKind, JobError};
        let jobs = vec![
            job_at(
                "a",
                JobPhase::Failed {
                    error: JobError::new(ErrorKind::Remote, "x"),
                    progress: 50,
                },
            ),
            job_at("b", JobPhase::Uploading { progress: 50 }),
        ];
        assert_eq!(overall_progress(&jobs), 50);
    }

    #[test]
    fn event_mirrors_job() {
        let ev = JobEvent::from_job(&job_at("a", JobPhase::Processing { progress: 50 }));
        assert_eq!(ev.status, JobStatus::Processing);
        assert_eq!(ev.progress, 50);
        assert_eq!(ev.id.as_str(), "a");
    }
}
