use std::path::{Path, PathBuf};
use std::sync::Arc;

use encoding_rs::Encoding;
use ezexp_core::FileFormat;
use ezexp_timing::{Clock, MonotonicClock, TimeUnit};
use log::{debug, info};

use super::config::ExperimentConfig;
use super::error::{ExperimentError, Result};
use super::tabular::{self, TabularReader, TabularWriter};
use super::trial::{Header, TimerStart, Trial};

/// Trials of one participant, loaded from one source, with a cursor over them
#[derive(Debug)]
pub struct Experiment<C: Clock = MonotonicClock> {
    header: Arc<Header>,
    trials: Vec<Trial<C>>,
    /// `None` before the first `load_next_trial`, `Some(trials.len())` once exhausted
    cursor: Option<usize>,
    participant_id: String,
    participant_column: String,
    source_path: PathBuf,
    output_path: PathBuf,
    output_format: FileFormat,
    separator: u8,
    encoding: &'static Encoding,
    result_columns: Vec<String>,
}

impl<C: Clock> Experiment<C> {
    pub fn load(
        source: impl AsRef<Path>,
        participant_id: &str,
        config: &ExperimentConfig,
        clock: C,
    ) -> Result<Self> {
        let reader = tabular::reader_for(config.input_format, config.separator_byte()?)?;
        Self::load_with(source, participant_id, config, clock, reader.as_ref())
    }

    /// Loads through an explicit reader.
    ///
    /// The reader has already dropped comment lines. The first record is the header; every
    /// other one must have as many fields and becomes a trial when its participant column
    /// equals `participant_id` exactly.
    pub fn load_with(
        source: impl AsRef<Path>,
        participant_id: &str,
        config: &ExperimentConfig,
        clock: C,
        reader: &dyn TabularReader,
    ) -> Result<Self> {
        let source = source.as_ref();
        let encoding = config.encoding()?;
        let separator = config.separator_byte()?;
        let records = reader.read_all(source, encoding)?;

        let mut rows = records.into_iter().enumerate();
        let (_, names) = rows
            .next()
            .ok_or_else(|| ExperimentError::EmptySource(source.display().to_string()))?;
        let header = Arc::new(Header::new(names));
        let column = header
            .index_of(&config.participant_column)
            .ok_or_else(|| ExperimentError::UnknownParameter(config.participant_column.clone()))?;

        let mut trials = Vec::new();
        for (record, values) in rows {
            if values.len() != header.len() {
                return Err(ExperimentError::RowLengthMismatch {
                    row: record + 1,
                    expected: header.len(),
                    found: values.len(),
                });
            }
            if values[column] != participant_id {
                continue;
            }
            let trial = Trial::new(trials.len(), Arc::clone(&header), values, clock.clone())?
                .with_time_unit(config.time_unit);
            trials.push(trial);
        }

        if trials.is_empty() {
            return Err(ExperimentError::ParticipantNotFound {
                participant: participant_id.to_string(),
                column: config.participant_column.clone(),
                source_path: source.display().to_string(),
            });
        }

        info!(
            "loaded {} trials for participant '{}' from {}",
            trials.len(),
            participant_id,
            source.display()
        );

        Ok(Self {
            header,
            trials,
            cursor: None,
            participant_id: participant_id.to_string(),
            participant_column: config.participant_column.clone(),
            source_path: source.to_path_buf(),
            output_path: config.default_output_path(source, participant_id),
            output_format: config.output_format,
            separator,
            encoding,
            result_columns: config.result_columns.clone(),
        })
    }

    pub fn parameter_names(&self) -> &[String] {
        self.header.names()
    }

    pub fn parameter_index(&self, name: &str) -> Result<usize> {
        self.header
            .index_of(name)
            .ok_or_else(|| ExperimentError::UnknownParameter(name.to_string()))
    }

    pub fn trials(&self) -> &[Trial<C>] {
        &self.trials
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn participant_column(&self) -> &str {
        &self.participant_column
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn set_output_path(&mut self, path: impl Into<PathBuf>) {
        self.output_path = path.into();
    }

    pub fn output_format(&self) -> FileFormat {
        self.output_format
    }

    pub fn set_output_format(&mut self, format: FileFormat) {
        self.output_format = format;
    }

    pub fn result_columns(&self) -> &[String] {
        &self.result_columns
    }

    /// Declares result columns written ahead of any other result, even when unset.
    pub fn set_result_columns<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.result_columns = names.into_iter().map(Into::into).collect();
    }

    /// Index of the current trial, if one is loaded and the list is not exhausted
    pub fn current_trial_index(&self) -> Option<usize> {
        self.cursor.filter(|&idx| idx < self.trials.len())
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor == Some(self.trials.len())
    }

    /// Advances the cursor. Once past the last trial it stays exhausted.
    pub fn load_next_trial(&mut self) -> Result<&mut Trial<C>> {
        let next = match self.cursor {
            None => 0,
            Some(idx) => (idx + 1).min(self.trials.len()),
        };
        self.cursor = Some(next);
        debug!("cursor moved to {} of {}", next, self.trials.len());
        self.trials
            .get_mut(next)
            .ok_or(ExperimentError::AllTrialsPerformed)
    }

    pub fn current_trial(&self) -> Result<&Trial<C>> {
        let idx = self.cursor.ok_or(ExperimentError::NoTrialLoaded)?;
        self.trials.get(idx).ok_or(ExperimentError::AllTrialsPerformed)
    }

    pub fn current_trial_mut(&mut self) -> Result<&mut Trial<C>> {
        let idx = self.cursor.ok_or(ExperimentError::NoTrialLoaded)?;
        self.trials
            .get_mut(idx)
            .ok_or(ExperimentError::AllTrialsPerformed)
    }

    pub fn parameter_value(&self, name: &str) -> Result<&str> {
        self.current_trial()?.parameter_value(name)
    }

    pub fn start_trial(&mut self) -> Result<()> {
        self.current_trial_mut()?.start_trial()
    }

    pub fn end_trial(&mut self) -> Result<()> {
        self.current_trial_mut()?.end_trial()
    }

    pub fn set_result(&mut self, name: &str, value: impl Into<String>) -> Result<bool> {
        Ok(self.current_trial_mut()?.set_result(name, value))
    }

    pub fn result(&self, name: &str) -> Result<&str> {
        self.current_trial()?.result(name)
    }

    pub fn start_timer(&mut self, name: &str) -> Result<TimerStart> {
        Ok(self.current_trial_mut()?.start_timer(name))
    }

    pub fn pause_timer(&mut self, name: &str) -> Result<()> {
        self.current_trial_mut()?.pause_timer(name)
    }

    pub fn resume_timer(&mut self, name: &str) -> Result<()> {
        self.current_trial_mut()?.resume_timer(name)
    }

    pub fn end_timer(&mut self, name: &str, unit: TimeUnit) -> Result<String> {
        self.current_trial_mut()?.end_timer(name, unit)
    }

    /// Header and rows of every started trial: parameters, then declared result
    /// columns, then other results in first-seen order. Missing results are empty.
    pub fn results_table(&self) -> (Vec<String>, Vec<Vec<String>>) {
        let processed: Vec<&Trial<C>> = self
            .trials
            .iter()
            .filter(|trial| trial.state().is_processed())
            .collect();

        let mut result_names = self.result_columns.clone();
        for trial in &processed {
            for name in trial.result_names() {
                if !result_names.iter().any(|known| known == name) {
                    result_names.push(name.to_string());
                }
            }
        }

        let mut header = self.header.names().to_vec();
        header.extend(result_names.iter().cloned());

        let rows = processed
            .iter()
            .map(|trial| {
                let mut row = trial.parameter_values();
                row.extend(
                    result_names
                        .iter()
                        .map(|name| trial.result(name).unwrap_or_default().to_string()),
                );
                row
            })
            .collect();

        (header, rows)
    }

    /// Writes every started trial to the output path; returns the number of rows.
    pub fn save(&self) -> Result<usize> {
        let writer = tabular::writer_for(self.output_format, self.separator)?;
        self.save_with(writer.as_ref())
    }

    pub fn save_with(&self, writer: &dyn TabularWriter) -> Result<usize> {
        let (header, rows) = self.results_table();
        writer.write_all(&header, &rows, &self.output_path, self.encoding)?;
        info!(
            "saved {} trials for participant '{}' to {}",
            rows.len(),
            self.participant_id,
            self.output_path.display()
        );
        Ok(rows.len())
    }
}
