use std::path::Path;

use ezexp_core::FileFormat;
use ezexp_timing::{Clock, MonotonicClock, TimeUnit};
use log::info;

use crate::config::ExperimentConfig;
use crate::error::{ExperimentError, Result};
use crate::state::Experiment;
use crate::trial::{TimerStart, Trial};

/// Entry point an application holds to drive at most one active experiment.
///
/// Constructed once by the host and passed around explicitly; every call on an
/// inactive facade fails with `NoExperimentActive`.
#[derive(Debug)]
pub struct ExperimentFacade<C: Clock = MonotonicClock> {
    config: ExperimentConfig,
    clock: C,
    experiment: Option<Experiment<C>>,
}

impl ExperimentFacade<MonotonicClock> {
    pub fn new(config: ExperimentConfig) -> Self {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl<C: Clock> ExperimentFacade<C> {
    pub fn with_clock(config: ExperimentConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            experiment: None,
        }
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Loads a new experiment and makes it the active one.
    ///
    /// The previous experiment is dropped without saving. If loading fails the
    /// previous experiment stays active.
    pub fn init_experiment(
        &mut self,
        source: impl AsRef<Path>,
        participant_id: &str,
        participant_column: &str,
        input_format: FileFormat,
        output_format: FileFormat,
    ) -> Result<&mut Experiment<C>> {
        let config = ExperimentConfig {
            participant_column: participant_column.to_string(),
            input_format,
            output_format,
            ..self.config.clone()
        };
        let experiment = Experiment::load(source, participant_id, &config, self.clock.clone())?;
        Ok(self.activate(experiment))
    }

    /// Makes an already loaded experiment the active one, returning the one it replaces.
    pub fn set_experiment(&mut self, experiment: Experiment<C>) -> Option<Experiment<C>> {
        self.experiment.replace(experiment)
    }

    /// Tears down the active experiment and hands it back.
    pub fn release(&mut self) -> Option<Experiment<C>> {
        let released = self.experiment.take();
        if let Some(experiment) = &released {
            info!(
                "released experiment for participant '{}'",
                experiment.participant_id()
            );
        }
        released
    }

    pub fn is_active(&self) -> bool {
        self.experiment.is_some()
    }

    pub fn experiment(&self) -> Result<&Experiment<C>> {
        self.experiment
            .as_ref()
            .ok_or(ExperimentError::NoExperimentActive)
    }

    pub fn experiment_mut(&mut self) -> Result<&mut Experiment<C>> {
        self.experiment
            .as_mut()
            .ok_or(ExperimentError::NoExperimentActive)
    }

    pub fn load_next_trial(&mut self) -> Result<&mut Trial<C>> {
        self.experiment_mut()?.load_next_trial()
    }

    pub fn current_trial(&self) -> Result<&Trial<C>> {
        self.experiment()?.current_trial()
    }

    pub fn parameter_value(&self, name: &str) -> Result<&str> {
        self.experiment()?.parameter_value(name)
    }

    pub fn start_trial(&mut self) -> Result<()> {
        self.experiment_mut()?.start_trial()
    }

    pub fn end_trial(&mut self) -> Result<()> {
        self.experiment_mut()?.end_trial()
    }

    pub fn set_result(&mut self, name: &str, value: impl Into<String>) -> Result<bool> {
        self.experiment_mut()?.set_result(name, value)
    }

    pub fn result(&self, name: &str) -> Result<&str> {
        self.experiment()?.result(name)
    }

    pub fn start_timer(&mut self, name: &str) -> Result<TimerStart> {
        self.experiment_mut()?.start_timer(name)
    }

    pub fn pause_timer(&mut self, name: &str) -> Result<()> {
        self.experiment_mut()?.pause_timer(name)
    }

    pub fn resume_timer(&mut self, name: &str) -> Result<()> {
        self.experiment_mut()?.resume_timer(name)
    }

    pub fn end_timer(&mut self, name: &str, unit: TimeUnit) -> Result<String> {
        self.experiment_mut()?.end_timer(name, unit)
    }

    pub fn save(&self) -> Result<usize> {
        self.experiment()?.save()
    }

    fn activate(&mut self, experiment: Experiment<C>) -> &mut Experiment<C> {
        if let Some(previous) = self.experiment.as_ref() {
            info!(
                "replacing experiment for participant '{}'",
                previous.participant_id()
            );
        }
        self.experiment.insert(experiment)
    }
}
