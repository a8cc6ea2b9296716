use serde::{Serialize, Deserialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::core::error::{Result, RegressionError};

/// Modules exercised by a default run, in submission order.
pub const DEFAULT_MODULES: &[&str] = &[
    "ant", "dbSta", "dft", "dpl", "drt", "fin", "gpl", "cts", "grt",
    "gui", "ifp", "mpl", "dpo", "mpl2", "OpenDB", "pad", "par", "pdn",
    "ppl", "psm", "rcx", "rmp", "rsz", "stt", "tap", "upf", "utl",
];


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub workers: usize,
    pub modules: Vec<String>,
    pub helper: HelperConfig,
    pub output_format: OutputFormat,
    pub output_file: Option<PathBuf>,
    pub verbose: bool,
    pub quiet: bool,
}

/// How the per-module test helper is launched: `<interpreter> <script> <module>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperConfig {
    pub interpreter: PathBuf,
    pub script: PathBuf,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from("/bin/bash"),
            script: PathBuf::from("./test/regression_helper"),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            modules: DEFAULT_MODULES.iter().map(|m| m.to_string()).collect(),
            helper: HelperConfig::default(),
            output_format: OutputFormat::Text,
            output_file: None,
            verbose: false,
            quiet: false,
        }
    }
}

impl RunConfig {
    /// Load a configuration file. Files ending in `.toml` are parsed as TOML,
    /// anything else as JSON. Missing fields fall back to the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RegressionError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            RegressionError::Config(format!("Failed to read config file: {}", e))
        })?;

        if path.extension().and_then(|ext| ext.to_str()) == Some("toml") {
            Self::from_toml_str(&contents)
        } else {
            serde_json::from_str::<Self>(&contents)
                .map_err(|e| RegressionError::Config(format!("Failed to parse JSON config: {}", e)))
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str::<Self>(contents)
            .map_err(|e| RegressionError::Config(format!("Failed to parse TOML config: {}", e)))
    }

    /// Check the invariants a run depends on.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(RegressionError::Usage(
                "worker count must be a positive integer".to_string(),
            ));
        }

        if self.modules.is_empty() {
            return Err(RegressionError::Config("module list is empty".to_string()));
        }

        if self.output_format == OutputFormat::Text {
            if let Some(path) = &self.output_file {
                return Err(RegressionError::Usage(format!(
                    "the text dashboard is written to the terminal; use json or csv format to write {}",
                    path.display()
                )));
            }
        }

        let mut seen = HashSet::new();
        for module in &self.modules {
            if module.trim().is_empty() {
                return Err(RegressionError::Config("module names must not be blank".to_string()));
            }
            if !seen.insert(module.as_str()) {
                return Err(RegressionError::Config(format!("duplicate module: {}", module)));
            }
        }

        Ok(())
    }
}
