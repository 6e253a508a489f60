//! Time service protocol implementation
//!
//! Handles request parsing, reply formatting, the time response codec and
//! command dispatch.

pub mod commands;
pub mod handlers;
pub mod responses;
pub mod wire;

pub use commands::{Command, CommandResult, CommandStatus, parse_command};
pub use handlers::{handle_command, handle_lookup_command};
pub use wire::{TimeResponse, decode, encode};
