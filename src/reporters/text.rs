use std::fmt::Write as _;
use std::io::{self, Write};
use std::time::Duration;
use colored::*;
use chrono::Local;

use crate::core::config::RunConfig;
use crate::core::job::JobResult;
use crate::core::progress::{RunState, RunSummary};
use crate::reporters::Reporter;

/// Clears the terminal and homes the cursor.
const CLEAR_SCREEN: &str = "\x1B[2J\x1B[1;1H";

/// Dashboard reporter for console output
pub struct TextReporter {
    verbose: bool,
    quiet: bool,
}

impl TextReporter {
    /// Create a new text reporter
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Format a duration to whole seconds
    fn format_duration(duration: Duration) -> String {
        humantime::format_duration(Duration::from_secs(duration.as_secs())).to_string()
    }

    fn flush() {
        let _ = io::stdout().flush();
    }
}

fn quoted_list<'a>(names: impl IntoIterator<Item = &'a String>) -> String {
    let items: Vec<String> = names.into_iter().map(|n| format!("'{}'", n)).collect();
    format!("[{}]", items.join(", "))
}

/// Render one dashboard frame for the given state.
pub fn render_dashboard(state: &RunState) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "\nCompleted Jobs: {}/{}", state.completed(), state.total());
    let _ = writeln!(out, "Successfully: {}", quoted_list(state.succeeded()).green());

    let failed: Vec<String> = state
        .failed()
        .iter()
        .map(|(module, count)| format!("'{}': {}", module, count))
        .collect();
    let _ = writeln!(out, "Failed: {}", format!("{{{}}}", failed.join(", ")).red());

    let _ = writeln!(out, "\nWaiting Jobs:");
    let _ = writeln!(out, "{}", quoted_list(state.waiting()).yellow());

    if !state.errored().is_empty() {
        let _ = writeln!(out, "{}", "\nJobs with Errors:".red());
        for (module, message) in state.errored() {
            let _ = writeln!(out, "{}", format!("- {}: {}", module, message).red());
        }
    }

    out
}

impl Reporter for TextReporter {
    fn report_start(&self, config: &RunConfig) {
        if self.quiet {
            return;
        }

        println!("Starting...");

        if self.verbose {
            println!("{}", "REGRESSION RUN".bold());
            println!("Started: {}", Local::now().format("%Y-%m-%d %H:%M:%S %Z"));
            println!("  Workers: {}", config.workers);
            println!("  Modules: {}", config.modules.len());
            println!(
                "  Helper: {} {}",
                config.helper.interpreter.display(),
                config.helper.script.display()
            );
        }

        Self::flush();
    }

    fn report_progress(&self, state: &RunState, latest: &JobResult) {
        if self.quiet {
            return;
        }

        print!("{}{}", CLEAR_SCREEN, render_dashboard(state));
        if self.verbose {
            println!(
                "\nLast finished: {} ({})",
                latest.module().cyan(),
                latest.status().as_str()
            );
        }
        Self::flush();
    }

    fn report_summary(&self, summary: &RunSummary) {
        let state = &summary.state;
        let verdict = if summary.is_success() {
            "✓ ALL MODULES PASSED".green().bold()
        } else {
            "✗ REGRESSIONS DETECTED".red().bold()
        };

        if self.quiet {
            println!(
                "{} ({} failed, {} errored)",
                verdict,
                state.failed().len(),
                state.errored().len()
            );
            return;
        }

        println!("\n{}", verdict);
        println!(
            "{} passed, {} failed, {} errored of {} modules in {}",
            state.succeeded().len(),
            state.failed().len(),
            state.errored().len(),
            state.total(),
            Self::format_duration(summary.duration)
        );

        let untested = summary.untested_modules();
        if !untested.is_empty() {
            self.report_warning(&format!("no tests detected for: {}", untested.join(", ")));
        }

        Self::flush();
    }

    fn report_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        eprintln!("{}: {}", "WARNING".yellow().bold(), message);
    }

    fn report_info(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.verbose {
            println!("{}: {}", "INFO".blue().bold(), message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::job::ModuleOutcome;

    fn state_after(results: &[JobResult]) -> RunState {
        let modules: Vec<String> = ["ant", "drt", "gui", "utl"].iter().map(|m| m.to_string()).collect();
        let mut state = RunState::new(&modules);
        for result in results {
            state.apply(result);
        }
        state
    }

    #[test]
    fn test_dashboard_sections() {
        colored::control::set_override(false);

        let state = state_after(&[
            JobResult::completed("utl", ModuleOutcome { failures: 0, test_lines: 2 }),
            JobResult::completed("drt", ModuleOutcome { failures: 2, test_lines: 7 }),
        ]);
        let frame = render_dashboard(&state);

        assert!(frame.contains("Completed Jobs: 2/4"));
        assert!(frame.contains("Successfully: ['utl']"));
        assert!(frame.contains("Failed: {'drt': 2}"));
        assert!(frame.contains("Waiting Jobs:\n['ant', 'gui']"));
        assert!(!frame.contains("Jobs with Errors"));
    }

    #[test]
    fn test_dashboard_lists_errors_when_present() {
        colored::control::set_override(false);

        let state = state_after(&[JobResult::errored("gui", "job panicked: bad output")]);
        let frame = render_dashboard(&state);

        assert!(frame.contains("Completed Jobs: 1/4"));
        assert!(frame.contains("Jobs with Errors:"));
        assert!(frame.contains("- gui: job panicked: bad output"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(TextReporter::format_duration(Duration::from_millis(61_500)), "1m 1s");
        assert_eq!(TextReporter::format_duration(Duration::from_secs(3)), "3s");
    }
}
