use std::sync::Arc;

use ezexp_core::{NamedValues, TrialState};
use ezexp_timing::{Clock, MonotonicClock, TimeUnit, Timer};
use log::{debug, info, warn};

use crate::error::{ExperimentError, Result};

/// Timer spanning `start_trial` to `end_trial`
pub const MAIN_TIMER: &str = "main";
/// Result key the main timer's duration is recorded under when the trial ends
pub const MAIN_DURATION_RESULT: &str = "main_duration";

/// Column names of an experiment source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    names: Vec<String>,
}

impl Header {
    /// Names are whitespace-trimmed.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|name| name.as_ref().trim().to_string())
                .collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// What `start_timer` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStart {
    Created,
    /// A timer with that name existed and its measurement was discarded
    Replaced,
    /// The name is reserved for the trial's main timer; nothing was started
    Reserved,
}

/// One participant row plus everything recorded while running it
#[derive(Debug, Clone)]
pub struct Trial<C: Clock = MonotonicClock> {
    index: usize,
    header: Option<Arc<Header>>,
    values: Vec<String>,
    results: NamedValues<String>,
    timers: NamedValues<Timer<C>>,
    state: TrialState,
    time_unit: TimeUnit,
    clock: C,
}

impl<C: Clock> Trial<C> {
    pub fn new(index: usize, header: Arc<Header>, values: Vec<String>, clock: C) -> Result<Self> {
        check_row_length(index, &header, &values)?;
        let mut trial = Self::unbound(values, clock);
        trial.index = index;
        trial.header = Some(header);
        Ok(trial)
    }

    /// Trial with values only; name lookups fail with `NotBound` until [`Trial::bind`].
    pub fn unbound(values: Vec<String>, clock: C) -> Self {
        Self {
            index: 0,
            header: None,
            values,
            results: NamedValues::new(),
            timers: NamedValues::new(),
            state: TrialState::NotStarted,
            time_unit: TimeUnit::default(),
            clock,
        }
    }

    pub fn bind(&mut self, header: Arc<Header>) -> Result<()> {
        check_row_length(self.index, &header, &self.values)?;
        self.header = Some(header);
        Ok(())
    }

    pub fn with_time_unit(mut self, unit: TimeUnit) -> Self {
        self.time_unit = unit;
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> TrialState {
        self.state
    }

    pub fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    pub fn parameter_value(&self, name: &str) -> Result<&str> {
        let header = self.header.as_ref().ok_or(ExperimentError::NotBound)?;
        let idx = header
            .index_of(name)
            .ok_or_else(|| ExperimentError::UnknownParameter(name.to_string()))?;
        Ok(&self.values[idx])
    }

    pub fn parameter_values(&self) -> Vec<String> {
        self.values.clone()
    }

    /// Returns true when an existing result was overwritten.
    pub fn set_result(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        self.results.insert(name, value.into()).is_some()
    }

    pub fn result(&self, name: &str) -> Result<&str> {
        self.results
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ExperimentError::UnknownResult(name.to_string()))
    }

    pub fn results(&self) -> NamedValues<String> {
        self.results.clone()
    }

    pub fn result_names(&self) -> impl Iterator<Item = &str> {
        self.results.names()
    }

    pub fn remove_result(&mut self, name: &str) -> bool {
        self.results.remove(name).is_some()
    }

    pub fn start_timer(&mut self, name: &str) -> TimerStart {
        if self.refuse_reserved(name) {
            return TimerStart::Reserved;
        }

        let mut timer = Timer::new(name, self.clock.clone());
        timer.start();
        match self.timers.insert(name, timer) {
            Some(_) => {
                warn!(
                    "trial {}: timer '{}' restarted, previous measurement discarded",
                    self.index, name
                );
                TimerStart::Replaced
            }
            None => TimerStart::Created,
        }
    }

    /// Pauses the timer. The main timer is left alone.
    pub fn pause_timer(&mut self, name: &str) -> Result<()> {
        if !self.refuse_reserved(name) {
            self.timer_mut(name)?.pause()?;
        }
        Ok(())
    }

    pub fn resume_timer(&mut self, name: &str) -> Result<()> {
        if !self.refuse_reserved(name) {
            self.timer_mut(name)?.resume()?;
        }
        Ok(())
    }

    /// Stops and removes the timer, returning its duration rendered in `unit`.
    ///
    /// The main timer keeps running; its elapsed time so far is returned instead.
    pub fn end_timer(&mut self, name: &str, unit: TimeUnit) -> Result<String> {
        if self.refuse_reserved(name) {
            let main = self
                .timers
                .get(MAIN_TIMER)
                .ok_or_else(|| ExperimentError::UnknownTimer(name.to_string()))?;
            return Ok(unit.format(main.running_elapsed()));
        }
        let mut timer = self
            .timers
            .remove(name)
            .ok_or_else(|| ExperimentError::UnknownTimer(name.to_string()))?;
        timer.stop()?;
        let elapsed = timer.elapsed_as(unit)?;
        debug!("trial {}: timer '{}' ended at {}", self.index, name, elapsed);
        Ok(elapsed)
    }

    pub fn timer(&self, name: &str) -> Option<&Timer<C>> {
        self.timers.get(name)
    }

    pub fn timer_names(&self) -> Vec<String> {
        self.timers.names().map(str::to_string).collect()
    }

    pub fn start_trial(&mut self) -> Result<()> {
        self.state = self.state.start()?;
        let mut main = Timer::new(MAIN_TIMER, self.clock.clone());
        main.start();
        self.timers.insert(MAIN_TIMER, main);
        info!("trial {} started", self.index);
        Ok(())
    }

    /// Ends the trial and records the main timer under [`MAIN_DURATION_RESULT`].
    pub fn end_trial(&mut self) -> Result<()> {
        let next = self.state.end()?;
        match self.timers.remove(MAIN_TIMER) {
            Some(mut main) => {
                main.stop()?;
                let duration = main.elapsed_as(self.time_unit)?;
                info!("trial {} ended after {}", self.index, duration);
                self.results.insert(MAIN_DURATION_RESULT, duration);
            }
            None => warn!("trial {} ended without a main timer", self.index),
        }
        self.state = next;
        Ok(())
    }

    /// `name=value` pairs for every parameter, then results and live timers on request.
    pub fn serialize(
        &self,
        separator: &str,
        include_results: bool,
        include_timers: bool,
    ) -> Result<String> {
        let header = self.header.as_ref().ok_or(ExperimentError::NotBound)?;

        let mut pairs: Vec<String> = header
            .names()
            .iter()
            .zip(&self.values)
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        if include_results {
            pairs.extend(self.results.iter().map(|(name, value)| format!("{name}={value}")));
        }
        if include_timers {
            pairs.extend(self.timers.iter().map(|(name, timer)| {
                format!("{name}={}", self.time_unit.format(timer.running_elapsed()))
            }));
        }
        Ok(pairs.join(separator))
    }

    /// Warns and returns `true` when `name` is the main timer.
    fn refuse_reserved(&self, name: &str) -> bool {
        if name != MAIN_TIMER {
            return false;
        }
        warn!(
            "trial {}: {}, it is managed by start_trial/end_trial",
            self.index,
            ExperimentError::ReservedName(name.to_string())
        );
        true
    }

    fn timer_mut(&mut self, name: &str) -> Result<&mut Timer<C>> {
        self.timers
            .get_mut(name)
            .ok_or_else(|| ExperimentError::UnknownTimer(name.to_string()))
    }
}

fn check_row_length(row: usize, header: &Header, values: &[String]) -> Result<()> {
    if header.len() == values.len() {
        Ok(())
    } else {
        Err(ExperimentError::RowLengthMismatch {
            row,
            expected: header.len(),
            found: values.len(),
        })
    }
}
