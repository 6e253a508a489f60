//! Module `commands`
//!
//! Defines the request commands understood by the time server, their parsed
//! representation, and the result of executing one.

use crate::error::ProtocolError;

/// Represents a request parsed from a client line.
///
/// Arguments are taken verbatim from the remainder of the line after the first
/// space, so client ids may contain spaces or be empty.
#[derive(Debug, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Command {
    LOOKUP(String),         // Resolve a service name to a handle
    NAMES,                  // List bound service names
    REGISTER(String),       // Register the caller under a client id
    TIME(Option<String>),   // Time for a zone, default zone when absent
    CLIENTS,                // Snapshot of registered clients
    QUIT,                   // Close the connection
    UNKNOWN(String),        // Unknown or unsupported command
}

impl Command {
    pub fn name(&self) -> &str {
        match self {
            Command::LOOKUP(_) => "LOOKUP",
            Command::NAMES => "NAMES",
            Command::REGISTER(_) => "REGISTER",
            Command::TIME(_) => "TIME",
            Command::CLIENTS => "CLIENTS",
            Command::QUIT => "QUIT",
            Command::UNKNOWN(cmd) => cmd,
        }
    }
}

/// Represents the outcome status of executing a command.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Struct encapsulating the full result of a command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<String>,
}

impl CommandResult {
    pub fn success(message: String) -> Self {
        Self {
            status: CommandStatus::Success,
            message: Some(message),
        }
    }

    pub fn failure(reason: impl Into<String>, message: String) -> Self {
        Self {
            status: CommandStatus::Failure(reason.into()),
            message: Some(message),
        }
    }

    pub fn close(message: String) -> Self {
        Self {
            status: CommandStatus::CloseConnection,
            message: Some(message),
        }
    }
}

/// Parses one request line into a `Command`.
///
/// The command word is case-insensitive. A trailing CRLF or LF is ignored.
pub fn parse_command(raw: &str) -> Result<Command, ProtocolError> {
    let line = raw.trim_end_matches(['\r', '\n']);
    let (word, arg) = match line.split_once(' ') {
        Some((word, arg)) => (word, Some(arg)),
        None => (line, None),
    };

    let command = match word.to_ascii_uppercase().as_str() {
        "LOOKUP" => match arg.map(str::trim) {
            Some(name) if !name.is_empty() => Command::LOOKUP(name.to_string()),
            _ => return Err(ProtocolError::MissingArgument("LOOKUP")),
        },
        "NAMES" => Command::NAMES,
        "REGISTER" => Command::REGISTER(arg.unwrap_or("").to_string()),
        "TIME" => Command::TIME(arg.map(str::to_string)),
        "CLIENTS" => Command::CLIENTS,
        "QUIT" | "Q" => Command::QUIT,
        _ => Command::UNKNOWN(word.to_string()),
    };
    Ok(command)
}
