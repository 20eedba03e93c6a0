use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle of a single trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrialState {
    #[default]
    NotStarted,
    Started,
    Ended,
}

/// Illegal lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrialStateError {
    #[error("trial already started")]
    AlreadyStarted,
    #[error("trial already ended")]
    AlreadyEnded,
    #[error("trial not started yet")]
    NotStartedYet,
}

impl TrialState {
    /// NotStarted -> Started
    pub fn start(self) -> Result<Self, TrialStateError> {
        match self {
            TrialState::NotStarted => Ok(TrialState::Started),
            TrialState::Started => Err(TrialStateError::AlreadyStarted),
            TrialState::Ended => Err(TrialStateError::AlreadyEnded),
        }
    }

    /// Started -> Ended
    pub fn end(self) -> Result<Self, TrialStateError> {
        match self {
            TrialState::Started => Ok(TrialState::Ended),
            TrialState::NotStarted => Err(TrialStateError::NotStartedYet),
            TrialState::Ended => Err(TrialStateError::AlreadyEnded),
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self, TrialState::Started)
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, TrialState::Ended)
    }

    /// A trial counts as processed once it has been started.
    pub fn is_processed(&self) -> bool {
        !matches!(self, TrialState::NotStarted)
    }
}
