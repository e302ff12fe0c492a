//! Scan configuration

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::classifier::{FieldClassifier, FieldRule, DEFAULT_COMBINATORIAL_THRESHOLD};
use crate::error::{PiiError, Result};

/// Batch scan settings.
///
/// Every key is optional in the config file; command-line flags override
/// whatever the file sets.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Column correlating output rows with input rows
    #[serde(default = "default_id_column")]
    pub id_column: String,
    /// Column holding the embedded JSON payload
    #[serde(default = "default_data_column")]
    pub data_column: String,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Replacement field table; the builtin table is used when absent
    #[serde(default)]
    pub rules: Option<Vec<FieldRule>>,
    #[serde(default = "default_threshold")]
    pub combinatorial_threshold: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            id_column: default_id_column(),
            data_column: default_data_column(),
            output: default_output(),
            log_level: default_log_level(),
            rules: None,
            combinatorial_threshold: default_threshold(),
        }
    }
}

fn default_id_column() -> String {
    "record_id".into()
}
fn default_data_column() -> String {
    "data_json".into()
}
fn default_output() -> PathBuf {
    PathBuf::from("redacted_output_candidate_full_name.csv")
}
fn default_log_level() -> String {
    "info".into()
}
fn default_threshold() -> usize {
    DEFAULT_COMBINATORIAL_THRESHOLD
}

impl ScanConfig {
    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: ScanConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.id_column.trim().is_empty() {
            return Err(PiiError::Config("id_column must not be empty".into()));
        }
        if self.data_column.trim().is_empty() {
            return Err(PiiError::Config("data_column must not be empty".into()));
        }
        if self.id_column == self.data_column {
            return Err(PiiError::Config(format!(
                "id_column and data_column are both '{}'",
                self.id_column
            )));
        }
        if self.combinatorial_threshold < 2 {
            return Err(PiiError::Config(format!(
                "combinatorial_threshold must be at least 2, got {}",
                self.combinatorial_threshold
            )));
        }
        Ok(())
    }

    /// Build a classifier for custom rules or a non-default threshold.
    ///
    /// Returns `None` when the builtin table applies unchanged.
    pub fn build_classifier(&self) -> Result<Option<FieldClassifier>> {
        let default_threshold = self.combinatorial_threshold == DEFAULT_COMBINATORIAL_THRESHOLD;
        if self.rules.is_none() && default_threshold {
            return Ok(None);
        }
        let rules = match &self.rules {
            Some(rules) => rules.clone(),
            None => crate::classifier::default_field_rules(),
        };
        let classifier =
            FieldClassifier::new(&rules)?.with_threshold(self.combinatorial_threshold)?;
        Ok(Some(classifier))
    }
}
