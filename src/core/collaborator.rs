use std::path::PathBuf;
use std::process::{Command, Stdio};
use log::{debug, warn};

use crate::core::config::HelperConfig;
use crate::core::error::{Result, RegressionError};
use crate::core::job::ModuleOutcome;

/// Tags the helper prints on lines that report a single test case.
pub const TEST_KIND_MARKERS: [&str; 2] = ["(py)", "(tcl)"];

/// Substring that marks a test case as passed.
pub const PASS_TOKEN: &str = ") pass";

/// Something that can run one module's tests and hand back its standard output.
pub trait Collaborator: Send + Sync {
    fn invoke(&self, module: &str) -> Result<String>;
}

/// Runs the external regression helper as `<interpreter> <script> <module>`.
#[derive(Debug, Clone)]
pub struct HelperScript {
    interpreter: PathBuf,
    script: PathBuf,
}

impl HelperScript {
    pub fn new(interpreter: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
        }
    }
}

impl From<&HelperConfig> for HelperScript {
    fn from(config: &HelperConfig) -> Self {
        Self::new(config.interpreter.clone(), config.script.clone())
    }
}

impl Collaborator for HelperScript {
    fn invoke(&self, module: &str) -> Result<String> {
        debug!(
            "Invoking {} {} {}",
            self.interpreter.display(),
            self.script.display(),
            module
        );

        let child = Command::new(&self.interpreter)
            .arg(&self.script)
            .arg(module)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RegressionError::Spawn {
                module: module.to_string(),
                source,
            })?;

        // Drains stdout and stderr together so a chatty helper never stalls on a full pipe.
        let output = child.wait_with_output()?;

        if !output.status.success() {
            debug!(
                "Helper for {} exited with {} ({} bytes on stderr)",
                module,
                output.status,
                output.stderr.len()
            );
        }

        decode_stdout(module, output.stdout)
    }
}

/// Helper output must be valid UTF-8; anything else cannot be scored.
pub fn decode_stdout(module: &str, stdout: Vec<u8>) -> Result<String> {
    String::from_utf8(stdout).map_err(|source| RegressionError::Decode {
        module: module.to_string(),
        source,
    })
}

/// How a single line of helper output is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Noise,
    Pass,
    Fail,
}

/// Running totals over a block of helper output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputTally {
    pub test_lines: u32,
    pub failures: u32,
}

pub fn classify_line(line: &str) -> LineKind {
    if !TEST_KIND_MARKERS.iter().any(|marker| line.contains(marker)) {
        LineKind::Noise
    } else if line.contains(PASS_TOKEN) {
        LineKind::Pass
    } else {
        LineKind::Fail
    }
}

pub fn count_failures(output: &str) -> OutputTally {
    output
        .lines()
        .fold(OutputTally::default(), |mut tally, line| {
            match classify_line(line) {
                LineKind::Noise => {}
                LineKind::Pass => tally.test_lines += 1,
                LineKind::Fail => {
                    tally.test_lines += 1;
                    tally.failures += 1;
                }
            }
            tally
        })
}

/// Run one module through the collaborator and reduce its output to a failure count.
///
/// A helper that cannot be invoked at all counts as a single failure so the
/// module never reads as healthy.
pub fn run_module_tests(collaborator: &dyn Collaborator, module: &str) -> ModuleOutcome {
    match collaborator.invoke(module) {
        Ok(stdout) => {
            let tally = count_failures(&stdout);
            if tally.test_lines == 0 {
                warn!("No test results detected in output for module {}", module);
            }
            debug!(
                "Module {}: {} test lines, {} failures",
                module, tally.test_lines, tally.failures
            );
            ModuleOutcome {
                failures: tally.failures,
                test_lines: tally.test_lines,
            }
        }
        Err(e) => {
            warn!("{}", e);
            ModuleOutcome {
                failures: 1,
                test_lines: 0,
            }
        }
    }
}
