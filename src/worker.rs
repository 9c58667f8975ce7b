//! Bounded fan-out of independent jobs with join-all semantics.

use std::sync::Mutex;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::warn;

use crate::error::{PicGeniusError, Result};

pub const DEFAULT_MAX_THREADS: usize = 4;

pub struct WorkerPool {
    pool: ThreadPool,
    max_threads: usize,
}

impl WorkerPool {
    pub fn new(max_threads: usize) -> Result<Self> {
        if max_threads == 0 {
            return Err(PicGeniusError::configuration(
                "worker pool needs at least 1 thread",
            ));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(max_threads)
            .thread_name(|index| format!("picgenius-worker-{}", index))
            .build()
            .map_err(|e| PicGeniusError::resource(format!("failed to start worker pool: {}", e)))?;
        Ok(Self { pool, max_threads })
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    /// Run every job and wait for all of them.
    ///
    /// Jobs are pulled from `jobs` as they are submitted. A failing job never
    /// cancels its siblings; once everything has finished, all failures are
    /// returned together. A batch of a single job returns its failure as is.
    pub fn run_all<I, F>(&self, jobs: I) -> Result<usize>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> Result<()> + Send,
    {
        let failures = Mutex::new(Vec::new());
        let mut total = 0usize;

        self.pool.in_place_scope(|scope| {
            for job in jobs {
                total += 1;
                let failures = &failures;
                scope.spawn(move |_| {
                    if let Err(err) = job() {
                        warn!(error = %err, "job failed");
                        failures
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner())
                            .push(err);
                    }
                });
            }
        });

        let mut failures = failures
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match failures.len() {
            0 => Ok(total),
            1 if total == 1 => Err(failures.remove(0)),
            _ => Err(PicGeniusError::Batch { total, failures }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn zero_threads_is_rejected() {
        assert!(WorkerPool::new(0).is_err());
    }

    #[test]
    fn runs_every_job() {
        let pool = WorkerPool::new(3).expect("pool");
        let counter = AtomicUsize::new(0);
        let jobs = (0..10).map(|_| {
            let counter = &counter;
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        assert_eq!(pool.run_all(jobs).expect("run"), 10);
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn failures_do_not_cancel_siblings() {
        let pool = WorkerPool::new(2).expect("pool");
        let finished = AtomicUsize::new(0);
        let jobs = (0..6).map(|i| {
            let finished = &finished;
            move || {
                finished.fetch_add(1, Ordering::SeqCst);
                if i % 2 == 0 {
                    Err(PicGeniusError::numeric(format!("job {i}")))
                } else {
                    Ok(())
                }
            }
        });

        let err = pool.run_all(jobs).unwrap_err();
        assert_eq!(finished.load(Ordering::SeqCst), 6);
        match err {
            PicGeniusError::Batch { total, failures } => {
                assert_eq!(total, 6);
                assert_eq!(failures.len(), 3);
            }
            other => panic!("expected batch error, got {other}"),
        }
    }

    #[test]
    fn single_job_failure_keeps_its_kind() {
        let pool = WorkerPool::new(1).expect("pool");
        let err = pool
            .run_all([|| Err(PicGeniusError::validation("bad"))])
            .unwrap_err();
        assert!(matches!(err, PicGeniusError::Validation(_)));
    }
}
