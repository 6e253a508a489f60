//! Time response encoding
//!
//! `SOURCE|CLOCK_TEXT|ZONE_ID`, three fields in fixed order, no escaping.
//! Zone ids and clock text never contain `|`: zone ids come from the tz
//! database and clock text from `CLOCK_TEXT_FORMAT`.

use crate::clock::{Source, TimeQuote};

pub const DELIMITER: char = '|';

pub fn encode(quote: &TimeQuote) -> String {
    format!(
        "{}{}{}{}{}",
        quote.source, DELIMITER, quote.clock_text, DELIMITER, quote.zone_id
    )
}

/// A decoded time response.
///
/// Anything that is not exactly three fields with a known source tag is kept
/// as opaque display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeResponse {
    Quote(TimeQuote),
    Opaque(String),
}

impl TimeResponse {
    /// Text to show as the clock.
    pub fn display_text(&self) -> &str {
        match self {
            TimeResponse::Quote(q) => &q.clock_text,
            TimeResponse::Opaque(raw) => raw,
        }
    }

    pub fn status_text(&self) -> &'static str {
        match self {
            TimeResponse::Quote(q) if q.source == Source::Internet => "INTERNET time",
            TimeResponse::Quote(_) => "LOCAL fallback time",
            TimeResponse::Opaque(_) => "Unknown format",
        }
    }
}

pub fn decode(raw: &str) -> TimeResponse {
    let fields: Vec<&str> = raw.split(DELIMITER).collect();
    if let [source, clock_text, zone_id] = fields.as_slice() {
        if let Ok(source) = source.parse::<Source>() {
            return TimeResponse::Quote(TimeQuote::new(source, *clock_text, *zone_id));
        }
    }
    TimeResponse::Opaque(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_fields_in_order() {
        let quote = TimeQuote::new(Source::Local, "2024-02-29 12:00:00", "Europe/London");
        assert_eq!(encode(&quote), "LOCAL|2024-02-29 12:00:00|Europe/London");
        assert_eq!(decode(&encode(&quote)), TimeResponse::Quote(quote));
    }

    #[test]
    fn wrong_field_count_degrades_to_opaque() {
        for raw in ["", "12:00:00", "LOCAL|12:00:00", "LOCAL|a|b|c", "Error: timeout"] {
            let decoded = decode(raw);
            assert_eq!(decoded, TimeResponse::Opaque(raw.to_string()));
            assert_eq!(decoded.display_text(), raw);
            assert_eq!(decoded.status_text(), "Unknown format");
        }
    }

    #[test]
    fn unknown_source_tag_degrades_to_opaque() {
        let raw = "GPS|2024-01-01 00:00:00|Etc/UTC";
        assert_eq!(decode(raw), TimeResponse::Opaque(raw.to_string()));
    }

    #[test]
    fn status_text_follows_source() {
        let internet = decode("INTERNET|2024-01-01 00:00:00|Etc/UTC");
        assert_eq!(internet.status_text(), "INTERNET time");
        assert_eq!(internet.display_text(), "2024-01-01 00:00:00");

        let local = decode("LOCAL|2024-01-01 00:00:00|Etc/UTC");
        assert_eq!(local.status_text(), "LOCAL fallback time");
    }
}
