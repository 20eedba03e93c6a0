use ezexp_core::{FileFormat, TrialStateError};
use ezexp_timing::TimerError;

pub type Result<T> = std::result::Result<T, ExperimentError>;

/// Errors raised while loading, driving or saving an experiment
#[derive(Debug, thiserror::Error)]
pub enum ExperimentError {
    /// The source was scanned completely without a row for this participant
    #[error("participant '{participant}' not found in column '{column}' of {source_path}")]
    ParticipantNotFound {
        participant: String,
        column: String,
        source_path: String,
    },

    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("unknown result '{0}'")]
    UnknownResult(String),

    #[error("unknown timer '{0}'")]
    UnknownTimer(String),

    /// Trial was built without the header of an experiment
    #[error("trial is not bound to an experiment header")]
    NotBound,

    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error("illegal trial transition: {0}")]
    TrialState(#[from] TrialStateError),

    #[error("all trials have been performed")]
    AllTrialsPerformed,

    #[error("no trial loaded, call load_next_trial first")]
    NoTrialLoaded,

    #[error("no experiment is active")]
    NoExperimentActive,

    /// Only ever logged; `"main"` belongs to the trial itself
    #[error("timer name '{0}' is reserved")]
    ReservedName(String),

    #[error("{format} is not supported for {operation}")]
    UnsupportedFormat {
        format: FileFormat,
        operation: &'static str,
    },

    #[error("unknown encoding '{0}'")]
    UnknownEncoding(String),

    #[error("separator '{0}' must be a single ASCII character")]
    InvalidSeparator(char),

    #[error("row {row}: expected {expected} fields, found {found}")]
    RowLengthMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("{0} contains no header line")]
    EmptySource(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_not_found_names_everything() {
        let error = ExperimentError::ParticipantNotFound {
            participant: "U9".to_string(),
            column: "USER_ID".to_string(),
            source_path: "trials.csv".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("U9"));
        assert!(message.contains("USER_ID"));
        assert!(message.contains("trials.csv"));
    }

    #[test]
    fn state_errors_keep_their_message() {
        let error = ExperimentError::from(TrialStateError::AlreadyEnded);
        assert_eq!(error.to_string(), "illegal trial transition: trial already ended");
    }

    #[test]
    fn unsupported_format_mentions_operation() {
        let error = ExperimentError::UnsupportedFormat {
            format: FileFormat::Xml,
            operation: "loading",
        };
        assert_eq!(error.to_string(), "xml is not supported for loading");
    }
}
