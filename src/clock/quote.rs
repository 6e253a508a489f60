//! Time quote types
//!
//! A `TimeQuote` is the outcome of one time resolution: which source answered,
//! the rendered wall clock, and the zone it was rendered in.

use std::fmt;
use std::str::FromStr;

/// Rendering used for `TimeQuote::clock_text`.
pub const CLOCK_TEXT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Which clock satisfied a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Internet,
    Local,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Internet => "INTERNET",
            Source::Local => "LOCAL",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INTERNET" => Ok(Source::Internet),
            "LOCAL" => Ok(Source::Local),
            other => Err(format!("unknown time source tag: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeQuote {
    pub source: Source,
    pub clock_text: String,
    pub zone_id: String,
}

impl TimeQuote {
    pub fn new(source: Source, clock_text: impl Into<String>, zone_id: impl Into<String>) -> Self {
        Self {
            source,
            clock_text: clock_text.into(),
            zone_id: zone_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_tags_are_uppercase_words() {
        assert_eq!(Source::Internet.to_string(), "INTERNET");
        assert_eq!(Source::Local.to_string(), "LOCAL");
        assert_eq!("LOCAL".parse::<Source>(), Ok(Source::Local));
        assert!("local".parse::<Source>().is_err());
        assert!("".parse::<Source>().is_err());
    }
}
