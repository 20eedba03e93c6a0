pub mod format;
pub mod named;
pub mod trial;

pub use format::FileFormat;
pub use named::NamedValues;
pub use trial::{TrialState, TrialStateError};
