//! Error handlers
//!
//! Maps errors onto reply codes and logs them.

use crate::error::types::{ProtocolError, TimeServerError};
use crate::protocol::responses;
use log::error;

/// Handle a time server error
pub fn handle_error(err: &TimeServerError) {
    error!("Time Server Error: {}", err);
}

/// Convert error to a protocol reply code
pub fn error_to_reply_code(err: &TimeServerError) -> u16 {
    match err {
        TimeServerError::Clock(_) => responses::CLOCK_UNAVAILABLE,
        TimeServerError::Directory(_) => responses::SERVICE_NOT_FOUND,
        TimeServerError::Protocol(ProtocolError::NotBound) => responses::NOT_BOUND,
        TimeServerError::Protocol(ProtocolError::MissingArgument(_)) => responses::SYNTAX_ERROR,
        TimeServerError::Protocol(_) => responses::UNKNOWN_COMMAND,
        TimeServerError::Config(_) => responses::SERVICE_UNAVAILABLE,
        TimeServerError::IoError(_) => responses::SERVICE_UNAVAILABLE,
    }
}

/// Render an error as a complete reply line
pub fn error_to_reply(err: &TimeServerError) -> String {
    let message = match err {
        // Inner message only, the category prefix is noise on the wire.
        TimeServerError::Clock(e) => e.to_string(),
        TimeServerError::Directory(e) => e.to_string(),
        TimeServerError::Protocol(ProtocolError::NotBound) => {
            "Please LOOKUP a service first".to_string()
        }
        TimeServerError::Protocol(ProtocolError::UnknownCommand(_)) => {
            "Unknown command".to_string()
        }
        TimeServerError::Protocol(ProtocolError::CommandTooLong(_)) => {
            "Command too long".to_string()
        }
        TimeServerError::Protocol(e) => e.to_string(),
        other => other.to_string(),
    };
    responses::format_response(error_to_reply_code(err), &message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::types::{ClockError, DirectoryError};

    #[test]
    fn clock_failure_maps_to_451() {
        let err = TimeServerError::from(ClockError::LocalClockUnavailable("before epoch".into()));
        assert_eq!(error_to_reply_code(&err), 451);
        assert_eq!(
            error_to_reply(&err),
            "451 Local clock unavailable: before epoch\r\n"
        );
    }

    #[test]
    fn directory_and_protocol_errors_use_their_own_codes() {
        let missing = TimeServerError::from(DirectoryError::ServiceNotFound("Nope".into()));
        assert_eq!(error_to_reply(&missing), "550 Service not found: Nope\r\n");

        let unbound = TimeServerError::from(ProtocolError::NotBound);
        assert_eq!(error_to_reply(&unbound), "530 Please LOOKUP a service first\r\n");

        let unknown = TimeServerError::from(ProtocolError::UnknownCommand("FOO".into()));
        assert_eq!(error_to_reply(&unknown), "500 Unknown command\r\n");

        let syntax = TimeServerError::from(ProtocolError::MissingArgument("LOOKUP"));
        assert_eq!(error_to_reply(&syntax), "501 LOOKUP requires an argument\r\n");
    }
}
