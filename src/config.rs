//! TOML configuration file support.
//!
//! ```toml
//! # ezexp.toml
//! [experiment]
//! participant_column = "Subject"
//! encoding = "gbk"
//! separator = ";"
//! time_unit = "ms"
//! result_columns = ["speed", "accuracy"]
//! output_dir = "results"
//! ```

use anyhow::{Context, Result};
use ezexp_experiment::ExperimentConfig;
use serde::Deserialize;
use std::path::Path;

/// Root of an ezexp.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub experiment: ExperimentConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ezexp_core::FileFormat;

    #[test]
    fn test_parse_config() {
        let config = Config::from_str(
            r#"
            [experiment]
            participant_column = "Subject"
            encoding = "gbk"
            output_format = "json"
            result_columns = ["speed", "accuracy"]
            "#,
        )
        .unwrap();
        assert_eq!(config.experiment.participant_column, "Subject");
        assert_eq!(config.experiment.encoding, "gbk");
        assert_eq!(config.experiment.output_format, FileFormat::Json);
        assert_eq!(config.experiment.separator, ',');
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.experiment, ExperimentConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        assert!(Config::from_str("[experiment]\nseparator = 3").is_err());
    }
}
