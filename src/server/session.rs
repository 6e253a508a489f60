//! Per-connection session
//!
//! Holds the state of one connection and runs its request loop once a service
//! handle has been acquired.

use log::{error, info};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::ServerConfig;
use crate::error::ProtocolError;
use crate::protocol::handlers::error_result;
use crate::protocol::{CommandResult, CommandStatus, handle_command, parse_command};
use crate::service::{ServiceDirectory, TimeService};

/// State of one connection.
///
/// The peer address is fixed at accept time and is the only address ever
/// recorded for registrations made on this connection.
pub struct Session {
    peer: SocketAddr,
    service_name: Option<String>,
    service: Option<Arc<TimeService>>,
}

impl Session {
    pub fn new(peer: SocketAddr) -> Self {
        Self {
            peer,
            service_name: None,
            service: None,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn peer_ip(&self) -> IpAddr {
        self.peer.ip()
    }

    pub fn is_bound(&self) -> bool {
        self.service.is_some()
    }

    pub fn service(&self) -> Option<&Arc<TimeService>> {
        self.service.as_ref()
    }

    pub fn service_name(&self) -> Option<&str> {
        self.service_name.as_deref()
    }

    pub fn bind(&mut self, name: &str, service: Arc<TimeService>) {
        self.service_name = Some(name.to_string());
        self.service = Some(service);
    }

    /// Drops the service handle.
    pub fn release(&mut self) {
        self.service_name = None;
        self.service = None;
    }
}

/// Outcome of reading one request line.
pub enum Request {
    Line,
    TooLong(usize),
    Closed,
}

/// Reads one line into `line`, enforcing `max_len`.
///
/// At most `max_len + 1` bytes are buffered. The remainder of an oversized
/// line is discarded and `line` is left empty.
pub async fn read_request<R>(reader: &mut R, line: &mut String, max_len: usize) -> std::io::Result<Request>
where
    R: AsyncBufRead + Unpin,
{
    line.clear();
    let mut buf = Vec::new();
    let n = (&mut *reader)
        .take(max_len as u64 + 1)
        .read_until(b'\n', &mut buf)
        .await?;
    if n == 0 {
        return Ok(Request::Closed);
    }
    if n > max_len {
        let skipped = if buf.ends_with(b"\n") {
            0
        } else {
            discard_line(reader).await?
        };
        return Ok(Request::TooLong(n + skipped));
    }
    line.push_str(&String::from_utf8_lossy(&buf));
    Ok(Request::Line)
}

/// Consumes input up to and including the next newline. Returns the byte count.
async fn discard_line<R>(reader: &mut R) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut discarded = 0;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(discarded);
        }
        let newline = available.iter().position(|b| *b == b'\n');
        let len = available.len();
        match newline {
            Some(i) => {
                reader.consume(i + 1);
                return Ok(discarded + i + 1);
            }
            None => {
                reader.consume(len);
                discarded += len;
            }
        }
    }
}

/// Writes the reply of `result`. Returns true when the connection should close.
pub async fn write_result<W>(writer: &mut W, result: &CommandResult) -> std::io::Result<bool>
where
    W: AsyncWrite + Unpin,
{
    if let Some(msg) = &result.message {
        writer.write_all(msg.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(result.status == CommandStatus::CloseConnection)
}

/// Runs the request loop of a bound session until the client quits or disconnects.
pub async fn handle_session<R, W>(
    mut reader: R,
    mut writer: W,
    mut session: Session,
    directory: Arc<ServiceDirectory>,
    config: Arc<ServerConfig>,
) where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let peer = session.peer();
    let mut line = String::new();

    loop {
        match read_request(&mut reader, &mut line, config.max_command_length).await {
            Ok(Request::Closed) => {
                info!("Connection closed by client {}", peer);
                break;
            }
            Ok(Request::TooLong(len)) => {
                let result = error_result(ProtocolError::CommandTooLong(len).into());
                if write_result(&mut writer, &result).await.is_err() {
                    break;
                }
            }
            Ok(Request::Line) => {
                let result = match parse_command(&line) {
                    Ok(command) => {
                        info!(
                            "Received from {} ({}): {:?}",
                            peer,
                            session.service_name().unwrap_or("-"),
                            &command
                        );
                        handle_command(&mut session, &command, &directory).await
                    }
                    Err(e) => error_result(e.into()),
                };

                match write_result(&mut writer, &result).await {
                    Ok(true) => {
                        info!("Client {} requested to quit", peer);
                        break;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        error!("Failed to write to {}: {}", peer, e);
                        break;
                    }
                }
            }
            Err(e) => {
                error!("Failed to read from {}: {}", peer, e);
                break;
            }
        }
    }
}
