//! Clock source selection
//!
//! Every call tries the network source first and falls back to the local clock.
//! No state is carried between calls.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, warn};
use std::sync::Arc;

use crate::clock::local::LocalClock;
use crate::clock::quote::{CLOCK_TEXT_FORMAT, Source, TimeQuote};
use crate::clock::sntp::NetworkTime;
use crate::error::ClockError;

/// An instant tagged with the source that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub source: Source,
    pub instant: DateTime<Utc>,
}

pub struct ClockSource {
    network: Arc<dyn NetworkTime>,
    local: Arc<dyn LocalClock>,
}

impl ClockSource {
    pub fn new(network: Arc<dyn NetworkTime>, local: Arc<dyn LocalClock>) -> Self {
        Self { network, local }
    }

    /// Reads the current instant, preferring the network source.
    pub async fn read(&self) -> Result<Reading, ClockError> {
        let network = self.network.fetch().await;
        select_source(network, self.local.as_ref())
    }

    /// Resolves the current time rendered in `zone`.
    pub async fn now(&self, zone: Tz) -> Result<TimeQuote, ClockError> {
        let reading = self.read().await?;
        Ok(render(reading, zone))
    }
}

/// The fallback policy: a network instant wins, any network failure defers to the local clock.
pub fn select_source(
    network: Result<DateTime<Utc>, ClockError>,
    local: &dyn LocalClock,
) -> Result<Reading, ClockError> {
    match network {
        Ok(instant) => Ok(Reading {
            source: Source::Internet,
            instant,
        }),
        Err(e) => {
            debug!("Network time unavailable, using local clock: {}", e);
            let instant = local.now_utc().inspect_err(|e| {
                warn!("Local clock failed after network fallback: {}", e);
            })?;
            Ok(Reading {
                source: Source::Local,
                instant,
            })
        }
    }
}

pub fn render(reading: Reading, zone: Tz) -> TimeQuote {
    let clock_text = reading
        .instant
        .with_timezone(&zone)
        .format(CLOCK_TEXT_FORMAT)
        .to_string();
    TimeQuote::new(reading.source, clock_text, zone.name())
}
