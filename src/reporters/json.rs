use std::io::{self, Write};
use std::fs::File;
use std::path::PathBuf;
use serde_json::{json, Value};

use crate::core::config::RunConfig;
use crate::core::job::JobResult;
use crate::core::progress::{RunState, RunSummary};
use crate::reporters::Reporter;

/// JSON reporter for machine-readable output
pub struct JsonReporter {
    output_file: Option<PathBuf>,
    verbose: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter
    pub fn new(output_file: Option<PathBuf>, verbose: bool) -> Self {
        Self { output_file, verbose }
    }

    /// Write JSON to file or stdout
    fn write_json(&self, json_value: &Value) -> io::Result<()> {
        let json_string = serde_json::to_string_pretty(json_value)?;

        match &self.output_file {
            Some(path) => {
                let mut file = File::create(path)?;
                file.write_all(json_string.as_bytes())?;
            }
            None => {
                println!("{}", json_string);
            }
        }

        Ok(())
    }

    /// Build the final summary document
    pub fn summary_value(summary: &RunSummary) -> Value {
        let state = &summary.state;
        let errored: Vec<Value> = state
            .errored()
            .iter()
            .map(|(module, message)| json!({ "module": module, "message": message }))
            .collect();

        json!({
            "start_time": summary.start_time.to_rfc3339(),
            "end_time": summary.end_time.to_rfc3339(),
            "duration_seconds": summary.duration.as_secs_f64(),
            "total": state.total(),
            "completed": state.completed(),
            "succeeded": state.succeeded(),
            "failed": state.failed(),
            "errored": errored,
            "waiting": state.waiting(),
            "untested": summary.untested_modules(),
            "results": summary.results,
            "exit_code": summary.exit_code,
        })
    }
}

impl Reporter for JsonReporter {
    fn report_start(&self, config: &RunConfig) {
        if self.verbose && self.output_file.is_none() {
            let start_info = json!({
                "event": "run_start",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "workers": config.workers,
                "modules": config.modules,
            });
            let _ = self.write_json(&start_info);
        }
    }

    fn report_progress(&self, state: &RunState, latest: &JobResult) {
        if self.verbose && self.output_file.is_none() {
            let event = json!({
                "event": "module_result",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "completed": state.completed(),
                "total": state.total(),
                "result": latest,
            });
            let _ = self.write_json(&event);
        }
    }

    fn report_summary(&self, summary: &RunSummary) {
        if let Err(e) = self.write_json(&Self::summary_value(summary)) {
            eprintln!("Error writing JSON report: {}", e);
        }
    }

    fn report_warning(&self, message: &str) {
        eprintln!("{}", json!({ "level": "warning", "message": message }));
    }

    fn report_info(&self, message: &str) {
        if self.verbose {
            eprintln!("{}", json!({ "level": "info", "message": message }));
        }
    }
}
