//! In-memory job store for one batch.
//!
//! Holds the ordered job sequence and each job's mutable record. Membership
//! (add/remove/order) sits behind one `RwLock` that is only held long enough
//! to look up a record; every record has its own `Mutex`, so writes to
//! different jobs never serialize on each other.
//!
//! Status changes go through a `Claim`: `claim` moves an idle job to
//! `Queued` and hands out a token, and only the holder of the current token
//! can move the job further. A job therefore belongs to at most one run.

mod error;
mod update;

pub use error::StoreError;
pub use update::JobUpdate;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::job::{Job, JobId, JobPhase};
use crate::report::ValidationError;

struct Slot {
    job: Job,
    /// Token of the run that owns this job, if any.
    claim: Option<u64>,
}

type Record = Arc<Mutex<Slot>>;

/// Right to drive one job through one run. Stale once the job is removed,
/// retried, or re-admitted under the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    id: JobId,
    token: u64,
}

impl Claim {
    pub fn id(&self) -> &JobId {
        &self.id
    }
}

#[derive(Default)]
struct Index {
    order: Vec<JobId>,
    records: HashMap<JobId, Record>,
}

/// Shared store of jobs. Clone the surrounding `Arc` to share it between tasks.
#[derive(Default)]
pub struct BatchStore {
    index: RwLock<Index>,
    next_token: AtomicU64,
}

fn lock(record: &Record) -> MutexGuard<'_, Slot> {
    record.lock().unwrap_or_else(PoisonError::into_inner)
}

impl BatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Index> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Index> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, id: &JobId) -> Option<Record> {
        self.read().records.get(id).cloned()
    }

    /// Admit one job. A job whose id is already in the batch is rejected.
    pub fn add(&self, job: Job) -> Result<(), ValidationError> {
        self.add_all(vec![job])
    }

    /// Admit a set of jobs atomically: either every job is inserted or none is.
    ///
    /// Rejects an empty set, duplicate names within the set, and names already
    /// present in the batch.
    pub fn add_all(&self, jobs: Vec<Job>) -> Result<(), ValidationError> {
        if jobs.is_empty() {
            return Err(ValidationError::Empty);
        }
        let mut index = self.write();
        let mut seen = HashSet::with_capacity(jobs.len());
        for job in &jobs {
            if index.records.contains_key(&job.id) || !seen.insert(&job.id) {
                return Err(ValidationError::Duplicate(job.id.clone()));
            }
        }
        for job in jobs {
            index.order.push(job.id.clone());
            let slot = Slot { job, claim: None };
            index.records.insert(slot.job.id.clone(), Arc::new(Mutex::new(slot)));
        }
        Ok(())
    }

    /// Remove a job and everything derived from it. Returns the removed record
    /// so the caller can release any local handles tied to it.
    pub fn remove(&self, id: &JobId) -> Option<Job> {
        let record = {
            let mut index = self.write();
            let record = index.records.remove(id)?;
            index.order.retain(|j| j != id);
            record
        };
        let job = lock(&record).job.clone();
        Some(job)
    }

    /// Remove every job; returns them in batch order.
    pub fn clear(&self) -> Vec<Job> {
        let drained: Vec<Record> = {
            let mut index = self.write();
            let order = std::mem::take(&mut index.order);
            let mut records = std::mem::take(&mut index.records);
            order.iter().filter_map(|id| records.remove(id)).collect()
        };
        drained.iter().map(|r| lock(r).job.clone()).collect()
    }

    /// Take an idle job for one run: `Idle` to `Queued`. Fails for any other
    /// status, so two runs never hold the same job.
    pub fn claim(&self, id: &JobId) -> Result<Claim, StoreError> {
        let record = self
            .record(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let mut slot = lock(&record);
        update::apply(&mut slot.job, JobUpdate::Queued)?;
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        slot.claim = Some(token);
        Ok(Claim {
            id: id.clone(),
            token,
        })
    }

    /// Apply a status change on behalf of the run holding `claim`. See
    /// `JobUpdate` for the transition rules.
    pub fn update(&self, claim: &Claim, change: JobUpdate) -> Result<Job, StoreError> {
        let record = self
            .record(&claim.id)
            .ok_or_else(|| StoreError::NotFound(claim.id.clone()))?;
        let mut slot = lock(&record);
        if slot.claim != Some(claim.token) {
            return Err(StoreError::Stale(claim.id.clone()));
        }
        update::apply(&mut slot.job, change)?;
        Ok(slot.job.clone())
    }

    /// Reset a failed job to `Idle` with progress 0 and no result or error.
    /// Any claim on it is dropped.
    pub fn retry(&self, id: &JobId) -> Result<Job, StoreError> {
        let record = self
            .record(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let mut slot = lock(&record);
        if !matches!(slot.job.phase, JobPhase::Failed { .. }) {
            return Err(StoreError::NotRetryable {
                id: id.clone(),
                status: slot.job.status(),
            });
        }
        slot.job.phase = JobPhase::Idle;
        slot.claim = None;
        Ok(slot.job.clone())
    }

    pub fn get(&self, id: &JobId) -> Option<Job> {
        let record = self.record(id)?;
        let job = lock(&record).job.clone();
        Some(job)
    }

    /// Snapshot of every job in batch (admission) order.
    pub fn all(&self) -> Vec<Job> {
        let records: Vec<Record> = {
            let index = self.read();
            index
                .order
                .iter()
                .filter_map(|id| index.records.get(id).cloned())
                .collect()
        };
        records.iter().map(|r| lock(r).job.clone()).collect()
    }

    pub fn contains(&self, id: &JobId) -> bool {
        self.read().records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True iff every job is terminal. An empty batch is settled.
    pub fn is_settled(&self) -> bool {
        self.all().iter().all(|j| j.phase.is_terminal())
    }
}
