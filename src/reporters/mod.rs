pub mod text;
pub mod json;
pub mod csv;

use crate::core::config::RunConfig;
use crate::core::job::JobResult;
use crate::core::progress::{RunState, RunSummary};

/// Reporter trait for outputting run progress and results
pub trait Reporter {
    /// Report the start of a run
    fn report_start(&self, config: &RunConfig);

    /// Report the state after one more module finished
    fn report_progress(&self, state: &RunState, latest: &JobResult);

    /// Report the final results of the run
    fn report_summary(&self, summary: &RunSummary);

    /// Report a warning message
    fn report_warning(&self, message: &str);

    /// Report an informational message
    fn report_info(&self, message: &str);
}
