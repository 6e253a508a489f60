//! Reply handling
//!
//! Defines reply codes and the `<code> <text>\r\n` line format.

/// Reply codes
pub const OK: u16 = 200;
pub const READY: u16 = 220;
pub const GOODBYE: u16 = 221;
pub const BOUND: u16 = 250;
pub const SERVICE_UNAVAILABLE: u16 = 421;
pub const CLOCK_UNAVAILABLE: u16 = 451;
pub const UNKNOWN_COMMAND: u16 = 500;
pub const SYNTAX_ERROR: u16 = 501;
pub const NOT_BOUND: u16 = 530;
pub const SERVICE_NOT_FOUND: u16 = 550;

/// Format a reply line
pub fn format_response(code: u16, message: &str) -> String {
    format!("{} {}\r\n", code, message)
}

/// Split a reply line into code and text.
pub fn parse_response(line: &str) -> Result<(u16, String), String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (code, text) = match line.split_once(' ') {
        Some((code, text)) => (code, text),
        None => (line, ""),
    };

    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("not a reply line: {line:?}"));
    }

    let code = code
        .parse::<u16>()
        .map_err(|e| format!("bad reply code {code:?}: {e}"))?;
    Ok((code, text.to_string()))
}

pub fn is_success(code: u16) -> bool {
    (200..300).contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_lines_split_on_first_space_only() {
        let line = format_response(OK, "INTERNET|2024-01-01 00:00:00|Etc/UTC");
        assert_eq!(line, "200 INTERNET|2024-01-01 00:00:00|Etc/UTC\r\n");
        assert_eq!(
            parse_response(&line),
            Ok((200, "INTERNET|2024-01-01 00:00:00|Etc/UTC".to_string()))
        );
    }

    #[test]
    fn rejects_lines_without_a_code() {
        assert!(parse_response("hello world\r\n").is_err());
        assert!(parse_response("20 short").is_err());
        assert!(parse_response("").is_err());
        assert_eq!(parse_response("221"), Ok((221, String::new())));
    }

    #[test]
    fn success_range() {
        assert!(is_success(OK));
        assert!(is_success(BOUND));
        assert!(!is_success(CLOCK_UNAVAILABLE));
        assert!(!is_success(READY - 100));
    }
}
