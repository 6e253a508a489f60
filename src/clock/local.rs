//! Local system clock

use chrono::{DateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ClockError;

/// Port for the local clock path.
///
/// A failure here has no further fallback.
pub trait LocalClock: Send + Sync {
    fn now_utc(&self) -> Result<DateTime<Utc>, ClockError>;
}

#[derive(Clone, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl LocalClock for SystemClock {
    fn now_utc(&self) -> Result<DateTime<Utc>, ClockError> {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ClockError::LocalClockUnavailable(format!("system clock before epoch: {e}")))?;

        let secs = i64::try_from(since_epoch.as_secs()).map_err(|_| {
            ClockError::LocalClockUnavailable("system clock out of range".into())
        })?;

        DateTime::from_timestamp(secs, since_epoch.subsec_nanos()).ok_or_else(|| {
            ClockError::LocalClockUnavailable("system clock out of range".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_tracks_chrono_now() {
        let before = Utc::now();
        let now = SystemClock::new().now_utc().unwrap();
        let after = Utc::now();
        assert!(now >= before && now <= after);
    }
}
