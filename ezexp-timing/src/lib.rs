pub mod clock;
pub mod timer;
pub mod unit;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use timer::{Timer, TimerError};
pub use unit::TimeUnit;
