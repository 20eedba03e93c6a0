use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Granularity used when rendering an elapsed duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Whole milliseconds, e.g. `75250`
    #[serde(alias = "ms")]
    Milliseconds,
    /// `M:SS.fff` once a minute has passed, `SS.fff` before that
    #[serde(alias = "s")]
    Seconds,
    /// Same rendering as [`TimeUnit::Seconds`]
    #[default]
    #[serde(alias = "min")]
    Minutes,
}

impl TimeUnit {
    pub fn format(&self, elapsed: Duration) -> String {
        let millis = elapsed.subsec_millis();
        let secs = elapsed.as_secs();
        match self {
            TimeUnit::Milliseconds => elapsed.as_millis().to_string(),
            TimeUnit::Seconds | TimeUnit::Minutes => {
                let minutes = secs / 60;
                if minutes > 0 {
                    format!("{minutes}:{:02}.{millis:03}", secs % 60)
                } else {
                    format!("{secs:02}.{millis:03}")
                }
            }
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeUnit::Milliseconds => "milliseconds",
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
        })
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ms" | "millis" | "milliseconds" => Ok(TimeUnit::Milliseconds),
            "s" | "sec" | "seconds" => Ok(TimeUnit::Seconds),
            "min" | "minutes" => Ok(TimeUnit::Minutes),
            other => Err(format!("unknown time unit '{other}'")),
        }
    }
}
