use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use csv::Writer;

use crate::core::config::RunConfig;
use crate::core::job::JobResult;
use crate::core::progress::{RunState, RunSummary};
use crate::reporters::Reporter;

/// CSV reporter for spreadsheet-compatible output
pub struct CsvReporter {
    output_file: Option<PathBuf>,
}

impl CsvReporter {
    /// Create a new CSV reporter
    pub fn new(output_file: Option<PathBuf>) -> Self {
        Self { output_file }
    }

    /// Create a CSV writer
    fn create_writer(&self) -> io::Result<Writer<Box<dyn Write>>> {
        match &self.output_file {
            Some(path) => {
                let file = File::create(path)?;
                Ok(csv::Writer::from_writer(Box::new(file) as Box<dyn Write>))
            }
            None => {
                Ok(csv::Writer::from_writer(Box::new(io::stdout()) as Box<dyn Write>))
            }
        }
    }

    /// Write one row per module, in completion order
    pub fn write_summary<W: Write>(writer: &mut Writer<W>, summary: &RunSummary) -> csv::Result<()> {
        writer.write_record(["module", "status", "failures", "test_lines", "message"])?;

        for result in &summary.results {
            let status = result.status().as_str();
            match result {
                JobResult::Completed { module, failures, test_lines } => {
                    let failures = failures.to_string();
                    let test_lines = test_lines.to_string();
                    writer.write_record([
                        module.as_str(),
                        status,
                        failures.as_str(),
                        test_lines.as_str(),
                        "",
                    ])?;
                }
                JobResult::Errored { module, message } => {
                    writer.write_record([module.as_str(), status, "", "", message.as_str()])?;
                }
            }
        }

        for module in summary.state.waiting() {
            writer.write_record([module.as_str(), "PENDING", "", "", ""])?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl Reporter for CsvReporter {
    fn report_start(&self, _config: &RunConfig) {
        // CSV reporter doesn't output anything at start
    }

    fn report_progress(&self, _state: &RunState, _latest: &JobResult) {
        // Rows are only written with the final summary
    }

    fn report_summary(&self, summary: &RunSummary) {
        let mut writer = match self.create_writer() {
            Ok(w) => w,
            Err(e) => {
                eprintln!("Error creating CSV writer: {}", e);
                return;
            }
        };

        if let Err(e) = Self::write_summary(&mut writer, summary) {
            eprintln!("Error writing CSV report: {}", e);
        }
    }

    fn report_warning(&self, message: &str) {
        eprintln!("WARNING: {}", message);
    }

    fn report_info(&self, _message: &str) {}
}
