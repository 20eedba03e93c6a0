use std::time::Duration;

use log::debug;
use thiserror::Error;

use crate::clock::{Clock, MonotonicClock};
use crate::unit::TimeUnit;

/// Timer misuse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("timer '{name}': {reason}")]
    InvalidState { name: String, reason: &'static str },
    #[error("timer '{name}' has not been stopped")]
    NotFinished { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Idle,
    Running,
    Paused,
    Stopped,
}

/// Named stopwatch.
///
/// Elapsed time accumulates over running segments, so a paused timer keeps what it
/// measured so far and picks up again on resume.
#[derive(Debug, Clone)]
pub struct Timer<C: Clock = MonotonicClock> {
    name: String,
    clock: C,
    status: Status,
    started_at: Option<Duration>,
    stopped_at: Option<Duration>,
    segment_start: Duration,
    accumulated: Duration,
}

impl<C: Clock> Timer<C> {
    pub fn new(name: impl Into<String>, clock: C) -> Self {
        Self {
            name: name.into(),
            clock,
            status: Status::Idle,
            started_at: None,
            stopped_at: None,
            segment_start: Duration::ZERO,
            accumulated: Duration::ZERO,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// (Re)starts the timer. Any previous measurement is discarded.
    pub fn start(&mut self) {
        let now = self.clock.now();
        self.started_at = Some(now);
        self.stopped_at = None;
        self.segment_start = now;
        self.accumulated = Duration::ZERO;
        self.status = Status::Running;
        debug!("timer '{}' started at {:?}", self.name, now);
    }

    pub fn stop(&mut self) -> Result<(), TimerError> {
        let now = self.clock.now();
        match self.status {
            Status::Running => {
                self.accumulated += now.saturating_sub(self.segment_start);
            }
            Status::Paused => {}
            Status::Idle => return Err(self.invalid("timer never started")),
            Status::Stopped => return Err(self.invalid("timer already stopped")),
        }
        self.stopped_at = Some(now);
        self.status = Status::Stopped;
        debug!("timer '{}' stopped after {:?}", self.name, self.accumulated);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), TimerError> {
        match self.status {
            Status::Running => {
                self.accumulated += self.clock.now().saturating_sub(self.segment_start);
                self.status = Status::Paused;
                Ok(())
            }
            Status::Paused => Err(self.invalid("timer already paused")),
            Status::Idle => Err(self.invalid("timer never started")),
            Status::Stopped => Err(self.invalid("timer already stopped")),
        }
    }

    pub fn resume(&mut self) -> Result<(), TimerError> {
        match self.status {
            Status::Paused => {
                self.segment_start = self.clock.now();
                self.status = Status::Running;
                Ok(())
            }
            Status::Running => Err(self.invalid("timer is not paused")),
            Status::Idle => Err(self.invalid("timer never started")),
            Status::Stopped => Err(self.invalid("timer already stopped")),
        }
    }

    /// Measured duration of a stopped timer
    pub fn elapsed(&self) -> Result<Duration, TimerError> {
        match self.stopped_at {
            Some(_) => Ok(self.accumulated),
            None => Err(TimerError::NotFinished {
                name: self.name.clone(),
            }),
        }
    }

    pub fn elapsed_as(&self, unit: TimeUnit) -> Result<String, TimerError> {
        self.elapsed().map(|elapsed| unit.format(elapsed))
    }

    /// Time measured so far, whether or not the timer is still running
    pub fn running_elapsed(&self) -> Duration {
        match self.status {
            Status::Running => {
                self.accumulated + self.clock.now().saturating_sub(self.segment_start)
            }
            _ => self.accumulated,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    pub fn is_paused(&self) -> bool {
        self.status == Status::Paused
    }

    pub fn started_at(&self) -> Option<Duration> {
        self.started_at
    }

    pub fn stopped_at(&self) -> Option<Duration> {
        self.stopped_at
    }

    fn invalid(&self, reason: &'static str) -> TimerError {
        TimerError::InvalidState {
            name: self.name.clone(),
            reason,
        }
    }
}
