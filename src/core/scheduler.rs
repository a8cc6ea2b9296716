use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use log::debug;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::core::collaborator::{run_module_tests, Collaborator};
use crate::core::error::{Result, RegressionError};
use crate::core::job::JobResult;

/// Fixed-size pool that runs one job per module and hands results back as they finish.
pub struct Scheduler {
    pool: ThreadPool,
    workers: usize,
}

impl Scheduler {
    /// Build a pool for `jobs` jobs with at most `workers` of them running at once.
    ///
    /// No more threads are started than there are jobs to run.
    pub fn new(workers: usize, jobs: usize) -> Result<Self> {
        if workers == 0 {
            return Err(RegressionError::Usage(
                "worker count must be a positive integer".to_string(),
            ));
        }

        let threads = workers.min(jobs).max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("regrun-worker-{}", index))
            .build()
            .map_err(|e| RegressionError::Pool(e.to_string()))?;

        Ok(Self { pool, workers })
    }

    /// The requested concurrency ceiling.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Threads actually started.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Submit every module up front, then feed each result to `on_result` on the
    /// calling thread in completion order. Returns once all modules have reported.
    pub fn run<F>(
        &self,
        modules: &[String],
        collaborator: Arc<dyn Collaborator>,
        mut on_result: F,
    ) -> usize
    where
        F: FnMut(JobResult),
    {
        let (tx, rx) = mpsc::channel();

        for module in modules {
            let tx = tx.clone();
            let collaborator = Arc::clone(&collaborator);
            let module = module.clone();

            self.pool.spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    run_module_tests(collaborator.as_ref(), &module)
                }));

                let result = match outcome {
                    Ok(outcome) => JobResult::completed(module, outcome),
                    Err(payload) => JobResult::errored(module, panic_message(payload.as_ref())),
                };

                // The receiver only goes away if the caller itself panicked.
                let _ = tx.send(result);
            });
        }

        // Only the workers' clones remain, so the loop below ends after the last job.
        drop(tx);

        let mut delivered = 0;
        for result in rx {
            debug!("Result for {} ({})", result.module(), result.status().as_str());
            delivered += 1;
            on_result(result);
        }
        delivered
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("job panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("job panicked: {}", message)
    } else {
        "job panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;
    use crate::core::job::JobStatus;

    /// Fails `drt`, panics on `grt`, passes everything else.
    struct ScriptedCollaborator;

    impl Collaborator for ScriptedCollaborator {
        fn invoke(&self, module: &str) -> Result<String> {
            match module {
                "drt" => Ok("a (tcl) ) fail\nb (tcl) ) fail".to_string()),
                "grt" => panic!("helper output was garbage"),
                _ => Ok(format!("{} (py) ) pass", module)),
            }
        }
    }

    /// Tracks how many invocations run at the same time.
    struct Concurrency {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Collaborator for Concurrency {
        fn invoke(&self, _module: &str) -> Result<String> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(String::new())
        }
    }

    fn modules(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_rejects_zero_workers() {
        assert!(Scheduler::new(0, 5).is_err());
    }

    #[test]
    fn test_one_result_per_module_for_any_worker_count() {
        let names = modules(&["ant", "cts", "dpl", "drt", "fin", "gpl", "gui"]);

        for workers in [1, 2, 3, 16] {
            let scheduler = Scheduler::new(workers, names.len()).unwrap();
            let mut seen = Vec::new();
            let delivered = scheduler.run(&names, Arc::new(ScriptedCollaborator), |r| {
                seen.push(r.module().to_string())
            });

            assert_eq!(delivered, names.len());
            let unique: HashSet<_> = seen.iter().cloned().collect();
            assert_eq!(unique.len(), names.len());
            assert_eq!(unique, names.iter().cloned().collect::<HashSet<_>>());
        }
    }

    #[test]
    fn test_panicking_job_becomes_errored() {
        let scheduler = Scheduler::new(2, 3).unwrap();
        let mut results = Vec::new();
        scheduler.run(&modules(&["grt", "drt", "utl"]), Arc::new(ScriptedCollaborator), |r| {
            results.push(r)
        });

        assert_eq!(results.len(), 3);
        let grt = results.iter().find(|r| r.module() == "grt").unwrap();
        match grt {
            JobResult::Errored { message, .. } => assert!(message.contains("garbage")),
            other => panic!("expected errored result, got {:?}", other),
        }
        let drt = results.iter().find(|r| r.module() == "drt").unwrap();
        assert_eq!(drt.status(), JobStatus::Failed);
    }

    #[test]
    fn test_respects_worker_ceiling() {
        let collaborator = Arc::new(Concurrency {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let names: Vec<String> = (0..12).map(|i| format!("m{}", i)).collect();

        let scheduler = Scheduler::new(3, names.len()).unwrap();
        let delivered = scheduler.run(&names, collaborator.clone(), |_| {});

        assert_eq!(delivered, 12);
        assert!(collaborator.peak.load(Ordering::SeqCst) <= 3);
    }

    #[test]
    fn test_huge_worker_count_is_capped_by_jobs() {
        let names = modules(&["gui", "utl"]);
        let scheduler = Scheduler::new(100_000, names.len()).unwrap();

        assert_eq!(scheduler.workers(), 100_000);
        assert_eq!(scheduler.threads(), 2);

        let mut seen = Vec::new();
        let delivered = scheduler.run(&names, Arc::new(ScriptedCollaborator), |r| {
            seen.push(r.module().to_string())
        });
        seen.sort();
        assert_eq!(delivered, 2);
        assert_eq!(seen, names);
    }

    #[test]
    fn test_empty_module_list() {
        let scheduler = Scheduler::new(4, 0).unwrap();
        assert_eq!(scheduler.threads(), 1);
        let delivered = scheduler.run(&[], Arc::new(ScriptedCollaborator), |_| {});
        assert_eq!(delivered, 0);
    }
}
