use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use log::warn;

use crate::core::job::JobResult;
use crate::reporters::Reporter;

/// Bucketed view of a run: every module is either still waiting or sits in
/// exactly one of the succeeded, failed and errored buckets.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    total: usize,
    waiting: BTreeSet<String>,
    succeeded: Vec<String>,
    failed: BTreeMap<String, u32>,
    errored: Vec<(String, String)>,
}

impl RunState {
    pub fn new(modules: &[String]) -> Self {
        let waiting: BTreeSet<String> = modules.iter().cloned().collect();
        Self {
            total: waiting.len(),
            waiting,
            ..Self::default()
        }
    }

    /// Move the result's module out of `waiting` into its bucket.
    ///
    /// Returns `false`, leaving the state untouched, when the module is not
    /// waiting (unknown or already reported).
    pub fn apply(&mut self, result: &JobResult) -> bool {
        if !self.waiting.remove(result.module()) {
            return false;
        }

        match result {
            JobResult::Completed { module, failures: 0, .. } => {
                self.succeeded.push(module.clone());
            }
            JobResult::Completed { module, failures, .. } => {
                self.failed.insert(module.clone(), *failures);
            }
            JobResult::Errored { module, message } => {
                self.errored.push((module.clone(), message.clone()));
            }
        }
        true
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.total - self.waiting.len()
    }

    pub fn is_finished(&self) -> bool {
        self.waiting.is_empty()
    }

    pub fn waiting(&self) -> &BTreeSet<String> {
        &self.waiting
    }

    pub fn succeeded(&self) -> &[String] {
        &self.succeeded
    }

    pub fn failed(&self) -> &BTreeMap<String, u32> {
        &self.failed
    }

    pub fn errored(&self) -> &[(String, String)] {
        &self.errored
    }

    /// Errored modules plus modules with at least one failing test.
    pub fn exit_code(&self) -> usize {
        self.errored.len() + self.failed.len()
    }
}

/// Final, read-only outcome of a run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub state: RunState,
    pub results: Vec<JobResult>,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub end_time: chrono::DateTime<chrono::Utc>,
    pub duration: Duration,
    pub exit_code: usize,
}

impl RunSummary {
    /// Modules that finished without any recognised test lines.
    pub fn untested_modules(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter_map(|r| match r {
                JobResult::Completed { module, test_lines: 0, failures: 0 } => Some(module.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Sole owner of the run state. Results arrive one at a time from the
/// scheduler's draining loop and each one triggers a redraw.
pub struct ProgressAggregator {
    state: RunState,
    results: Vec<JobResult>,
    reporter: Box<dyn Reporter + Send + Sync>,
    start_time: chrono::DateTime<chrono::Utc>,
}

impl ProgressAggregator {
    pub fn new(modules: &[String], reporter: Box<dyn Reporter + Send + Sync>) -> Self {
        Self {
            state: RunState::new(modules),
            results: Vec::with_capacity(modules.len()),
            reporter,
            start_time: chrono::Utc::now(),
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn on_result(&mut self, result: JobResult) {
        if !self.state.apply(&result) {
            warn!("Ignoring unexpected result for module {}", result.module());
            self.reporter
                .report_warning(&format!("unexpected result for module {}", result.module()));
            return;
        }

        self.reporter.report_progress(&self.state, &result);
        self.results.push(result);
    }

    /// Freeze the state and report the final summary.
    pub fn finish(self) -> RunSummary {
        let end_time = chrono::Utc::now();
        let duration = (end_time - self.start_time).to_std().unwrap_or_default();

        if !self.state.is_finished() {
            warn!("{} module(s) never reported a result", self.state.waiting().len());
        }

        let summary = RunSummary {
            exit_code: self.state.exit_code(),
            state: self.state,
            results: self.results,
            start_time: self.start_time,
            end_time,
            duration,
        };
        self.reporter.report_summary(&summary);
        summary
    }
}
