//! Clock sources
//!
//! Network time (SNTP) with a local system clock fallback.

pub mod local;
pub mod quote;
pub mod sntp;
pub mod source;

pub use local::{LocalClock, SystemClock};
pub use quote::{CLOCK_TEXT_FORMAT, Source, TimeQuote};
pub use sntp::{NetworkTime, SntpClient};
pub use source::{ClockSource, Reading};
