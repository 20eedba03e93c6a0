pub mod config;
pub mod error;
pub mod facade;
pub mod state;
pub mod tabular;
pub mod trial;

pub use config::ExperimentConfig;
pub use error::{ExperimentError, Result};
pub use facade::ExperimentFacade;
pub use state::Experiment;
pub use tabular::{CsvTable, JsonTable, TabularReader, TabularWriter};
pub use trial::{Header, MAIN_DURATION_RESULT, MAIN_TIMER, TimerStart, Trial};
