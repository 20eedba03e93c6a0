use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use ezexp_core::FileFormat;
use ezexp_timing::TimeUnit;
use serde::Deserialize;

use crate::error::{ExperimentError, Result};

/// How an experiment source is read and where its results go
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Column holding participant ids
    pub participant_column: String,
    /// Encoding label understood by `encoding_rs`, e.g. `utf-8` or `gbk`
    pub encoding: String,
    pub separator: char,
    pub input_format: FileFormat,
    pub output_format: FileFormat,
    /// Unit used for the main trial duration and for serialized timers
    pub time_unit: TimeUnit,
    /// Result columns always written, in this order, before any other result
    pub result_columns: Vec<String>,
    /// Directory for the default output file; the source's directory when unset
    pub output_dir: Option<PathBuf>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            participant_column: "USER_ID".to_string(),
            encoding: "utf-8".to_string(),
            separator: ',',
            input_format: FileFormat::Csv,
            output_format: FileFormat::Csv,
            time_unit: TimeUnit::Minutes,
            result_columns: Vec::new(),
            output_dir: None,
        }
    }
}

impl ExperimentConfig {
    pub fn encoding(&self) -> Result<&'static Encoding> {
        Encoding::for_label(self.encoding.trim().as_bytes())
            .ok_or_else(|| ExperimentError::UnknownEncoding(self.encoding.clone()))
    }

    pub fn separator_byte(&self) -> Result<u8> {
        if self.separator.is_ascii() {
            Ok(self.separator as u8)
        } else {
            Err(ExperimentError::InvalidSeparator(self.separator))
        }
    }

    /// `<dir>/<participant>-results.<ext>`
    pub fn default_output_path(&self, source: &Path, participant_id: &str) -> PathBuf {
        let dir = match &self.output_dir {
            Some(dir) => dir.clone(),
            None => source.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        dir.join(format!(
            "{participant_id}-results.{}",
            self.output_format.extension()
        ))
    }
}
