//! Zone resolution
//!
//! Maps a requested IANA zone identifier onto a usable zone, substituting
//! `Etc/UTC` for anything empty or unknown.

use chrono_tz::Tz;
use log::debug;

/// Zone used whenever the requested identifier cannot be honoured.
pub const DEFAULT_ZONE: Tz = Tz::Etc__UTC;

/// Validates zone identifiers against the compiled-in tz database.
#[derive(Debug, Clone, Copy)]
pub struct ZoneResolver {
    default: Tz,
}

impl Default for ZoneResolver {
    fn default() -> Self {
        Self {
            default: DEFAULT_ZONE,
        }
    }
}

impl ZoneResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never fails. Lookup is exact and case-sensitive, so a recognised
    /// identifier comes back unchanged from `Tz::name`.
    pub fn resolve(&self, requested: Option<&str>) -> Tz {
        match requested {
            Some(id) if !id.is_empty() => id.parse::<Tz>().unwrap_or_else(|_| {
                debug!("Unknown zone {:?}, using {}", id, self.default.name());
                self.default
            }),
            _ => self.default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_zones_pass_through() {
        let resolver = ZoneResolver::new();
        for id in [
            "Etc/UTC",
            "Africa/Addis_Ababa",
            "America/New_York",
            "America/Los_Angeles",
            "Europe/London",
            "Europe/Paris",
            "Asia/Tokyo",
            "Asia/Dubai",
            "Australia/Sydney",
        ] {
            assert_eq!(resolver.resolve(Some(id)).name(), id);
        }
    }

    #[test]
    fn unknown_empty_and_missing_fall_back() {
        let resolver = ZoneResolver::new();
        for requested in [None, Some(""), Some("Mars/Olympus"), Some("asia/tokyo"), Some(" Asia/Tokyo")] {
            assert_eq!(resolver.resolve(requested), DEFAULT_ZONE);
        }
        assert_eq!(DEFAULT_ZONE.name(), "Etc/UTC");
    }
}
