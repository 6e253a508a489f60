//! Error types
//!
//! Defines domain-specific error types for each module of the time server.

use std::fmt;
use std::io;
use std::time::Duration;

/// Clock module errors
#[derive(Debug)]
pub enum ClockError {
    /// The external source did not answer within the allotted time.
    NetworkTimeout(Duration),
    /// The external source could not be reached or resolved.
    NetworkUnreachable(io::Error),
    /// The external source answered with something that is not a usable time.
    MalformedResponse(String),
    /// The local system clock cannot produce a valid instant.
    LocalClockUnavailable(String),
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockError::NetworkTimeout(d) => {
                write!(f, "Network time lookup timed out after {} ms", d.as_millis())
            }
            ClockError::NetworkUnreachable(e) => write!(f, "Network time unreachable: {}", e),
            ClockError::MalformedResponse(s) => write!(f, "Malformed network time response: {}", s),
            ClockError::LocalClockUnavailable(s) => write!(f, "Local clock unavailable: {}", s),
        }
    }
}

impl std::error::Error for ClockError {}

impl From<io::Error> for ClockError {
    fn from(error: io::Error) -> Self {
        ClockError::NetworkUnreachable(error)
    }
}

/// Service directory errors
#[derive(Debug, PartialEq, Eq)]
pub enum DirectoryError {
    ServiceNotFound(String),
    AlreadyBound(String),
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryError::ServiceNotFound(name) => write!(f, "Service not found: {}", name),
            DirectoryError::AlreadyBound(name) => write!(f, "Service already bound: {}", name),
        }
    }
}

impl std::error::Error for DirectoryError {}

/// Protocol errors raised while reading or parsing request lines
#[derive(Debug, PartialEq, Eq)]
pub enum ProtocolError {
    CommandTooLong(usize),
    MissingArgument(&'static str),
    UnknownCommand(String),
    NotBound,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::CommandTooLong(len) => write!(f, "Command too long ({} bytes)", len),
            ProtocolError::MissingArgument(cmd) => write!(f, "{} requires an argument", cmd),
            ProtocolError::UnknownCommand(cmd) => write!(f, "Unknown command: {}", cmd),
            ProtocolError::NotBound => write!(f, "No service bound to this session"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Errors seen by callers of a remote time service handle
#[derive(Debug)]
pub enum RemoteError {
    /// Discovery failed before any operation was invoked.
    ServiceUnreachable(String),
    /// The call failed in flight.
    Transport(io::Error),
    /// The server answered with a non-success reply.
    Remote { code: u16, message: String },
    /// The server answered with something that is not a reply line.
    Protocol(String),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::ServiceUnreachable(s) => write!(f, "Service unreachable: {}", s),
            RemoteError::Transport(e) => write!(f, "Transport error: {}", e),
            RemoteError::Remote { code, message } => write!(f, "Remote error {}: {}", code, message),
            RemoteError::Protocol(s) => write!(f, "Protocol error: {}", s),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<io::Error> for RemoteError {
    fn from(error: io::Error) -> Self {
        RemoteError::Transport(error)
    }
}

/// General time server error that encompasses all error types
#[derive(Debug)]
pub enum TimeServerError {
    Clock(ClockError),
    Directory(DirectoryError),
    Protocol(ProtocolError),
    Config(config::ConfigError),
    IoError(io::Error),
}

impl fmt::Display for TimeServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeServerError::Clock(e) => write!(f, "Clock error: {}", e),
            TimeServerError::Directory(e) => write!(f, "Directory error: {}", e),
            TimeServerError::Protocol(e) => write!(f, "Protocol error: {}", e),
            TimeServerError::Config(e) => write!(f, "Configuration error: {}", e),
            TimeServerError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for TimeServerError {}

impl From<ClockError> for TimeServerError {
    fn from(error: ClockError) -> Self {
        TimeServerError::Clock(error)
    }
}

impl From<DirectoryError> for TimeServerError {
    fn from(error: DirectoryError) -> Self {
        TimeServerError::Directory(error)
    }
}

impl From<ProtocolError> for TimeServerError {
    fn from(error: ProtocolError) -> Self {
        TimeServerError::Protocol(error)
    }
}

impl From<config::ConfigError> for TimeServerError {
    fn from(error: config::ConfigError) -> Self {
        TimeServerError::Config(error)
    }
}

impl From<io::Error> for TimeServerError {
    fn from(error: io::Error) -> Self {
        TimeServerError::IoError(error)
    }
}
