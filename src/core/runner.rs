use std::sync::Arc;
use log::info;

use crate::core::collaborator::Collaborator;
use crate::core::config::RunConfig;
use crate::core::error::Result;
use crate::core::progress::{ProgressAggregator, RunSummary};
use crate::core::scheduler::Scheduler;
use crate::reporters::Reporter;

/// Regression execution engine
pub struct RegressionRunner {
    config: RunConfig,
    collaborator: Arc<dyn Collaborator>,
    reporter: Box<dyn Reporter + Send + Sync>,
}

impl RegressionRunner {
    /// Create a new regression runner
    pub fn new(
        config: RunConfig,
        collaborator: Arc<dyn Collaborator>,
        reporter: Box<dyn Reporter + Send + Sync>,
    ) -> Self {
        Self {
            config,
            collaborator,
            reporter,
        }
    }

    /// Run every configured module and collect the results
    pub fn execute_all(self) -> Result<RunSummary> {
        self.config.validate()?;

        let scheduler = Scheduler::new(self.config.workers, self.config.modules.len())?;
        info!(
            "Running {} modules with up to {} workers ({} threads)",
            self.config.modules.len(),
            scheduler.workers(),
            scheduler.threads()
        );

        self.reporter.report_start(&self.config);
        self.reporter.report_info("Starting regression run");

        let mut aggregator = ProgressAggregator::new(&self.config.modules, self.reporter);
        let delivered = scheduler.run(
            &self.config.modules,
            Arc::clone(&self.collaborator),
            |result| aggregator.on_result(result),
        );
        drop(scheduler);

        let summary = aggregator.finish();
        info!(
            "Run finished: {} results delivered, exit code {}",
            delivered, summary.exit_code
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use crate::core::config::DEFAULT_MODULES;
    use crate::core::error::RegressionError;
    use crate::core::job::JobResult;
    use crate::core::progress::RunState;

    struct Silent;

    impl Reporter for Silent {
        fn report_start(&self, _config: &RunConfig) {}
        fn report_progress(&self, _state: &RunState, _latest: &JobResult) {}
        fn report_summary(&self, _summary: &RunSummary) {}
        fn report_warning(&self, _message: &str) {}
        fn report_info(&self, _message: &str) {}
    }

    /// Every module passes except `gui`, whose helper cannot be launched.
    struct GuiUnlaunchable;

    impl Collaborator for GuiUnlaunchable {
        fn invoke(&self, module: &str) -> Result<String> {
            if module == "gui" {
                return Err(RegressionError::Spawn {
                    module: module.to_string(),
                    source: io::Error::new(io::ErrorKind::NotFound, "helper missing"),
                });
            }
            Ok(format!("Running {}\ncheck_{} (py) ) pass\n", module, module))
        }
    }

    struct AllPass;

    impl Collaborator for AllPass {
        fn invoke(&self, module: &str) -> Result<String> {
            Ok(format!("{} (tcl) ) pass", module))
        }
    }

    fn config(workers: usize) -> RunConfig {
        RunConfig { workers, ..RunConfig::default() }
    }

    #[test]
    fn test_all_modules_pass() {
        let runner = RegressionRunner::new(config(4), Arc::new(AllPass), Box::new(Silent));
        let summary = runner.execute_all().unwrap();

        assert_eq!(summary.exit_code, 0);
        assert!(summary.is_success());
        assert_eq!(summary.state.succeeded().len(), DEFAULT_MODULES.len());
        assert!(summary.state.failed().is_empty());
        assert!(summary.state.errored().is_empty());
        assert!(summary.untested_modules().is_empty());
    }

    #[test]
    fn test_spawn_fault_counts_against_exit_code() {
        let runner = RegressionRunner::new(config(3), Arc::new(GuiUnlaunchable), Box::new(Silent));
        let summary = runner.execute_all().unwrap();

        assert_eq!(summary.state.failed().get("gui"), Some(&1));
        assert_eq!(summary.state.succeeded().len(), DEFAULT_MODULES.len() - 1);
        assert_eq!(summary.exit_code, 1);
    }

    #[test]
    fn test_invalid_config_is_rejected_before_running() {
        let runner = RegressionRunner::new(config(0), Arc::new(AllPass), Box::new(Silent));
        let err = runner.execute_all().unwrap_err();
        assert!(err.is_usage());
    }
}
