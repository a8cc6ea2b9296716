use serde::{Serialize, Deserialize};

/// What one module's helper run reduced to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleOutcome {
    /// Candidate test lines lacking the pass token, or 1 when the helper could not be invoked.
    pub failures: u32,
    /// Candidate test lines seen in the helper's output.
    pub test_lines: u32,
}

/// The single result delivered for each scheduled module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobResult {
    Completed {
        module: String,
        failures: u32,
        test_lines: u32,
    },
    Errored {
        module: String,
        message: String,
    },
}

/// Status label used by the reporters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Passed,
    Failed,
    Errored,
}

impl JobResult {
    pub fn completed(module: impl Into<String>, outcome: ModuleOutcome) -> Self {
        JobResult::Completed {
            module: module.into(),
            failures: outcome.failures,
            test_lines: outcome.test_lines,
        }
    }

    pub fn errored(module: impl Into<String>, message: impl Into<String>) -> Self {
        JobResult::Errored {
            module: module.into(),
            message: message.into(),
        }
    }

    pub fn module(&self) -> &str {
        match self {
            JobResult::Completed { module, .. } | JobResult::Errored { module, .. } => module,
        }
    }

    pub fn status(&self) -> JobStatus {
        match self {
            JobResult::Completed { failures: 0, .. } => JobStatus::Passed,
            JobResult::Completed { .. } => JobStatus::Failed,
            JobResult::Errored { .. } => JobStatus::Errored,
        }
    }
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Passed => "PASS",
            JobStatus::Failed => "FAIL",
            JobStatus::Errored => "ERROR",
        }
    }
}
