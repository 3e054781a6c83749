use humantime::format_duration;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
    time::Duration,
};

/// Duration wrapper with a human-readable form ("60s", "14m") for
/// configuration fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanDuration {
    duration: Duration,
}

impl HumanDuration {
    pub const fn new(duration: Duration) -> HumanDuration {
        HumanDuration { duration }
    }

    pub const fn from_secs(secs: u64) -> HumanDuration {
        HumanDuration {
            duration: Duration::from_secs(secs),
        }
    }

    pub fn as_secs(&self) -> u64 {
        self.duration.as_secs()
    }

    pub fn get_duration(&self) -> Duration {
        self.duration
    }

    pub fn is_zero(&self) -> bool {
        self.duration.is_zero()
    }
}

impl FromStr for HumanDuration {
    type Err = humantime::DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = &s.to_lowercase();
        if s == "0" || s == "disabled" || s == "none" {
            Ok(HumanDuration {
                duration: Duration::new(0, 0),
            })
        } else {
            Ok(HumanDuration {
                duration: humantime::parse_duration(s)?,
            })
        }
    }
}

impl From<Duration> for HumanDuration {
    fn from(duration: Duration) -> Self {
        HumanDuration { duration }
    }
}

impl Display for HumanDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_duration(self.duration))
    }
}
