//! Remote handle to a `TimeService`
//!
//! One request line, one reply line. Calls are not retried.

use log::debug;
use std::collections::BTreeMap;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::error::RemoteError;
use crate::protocol::responses::{self, is_success, parse_response};
use crate::protocol::wire::{TimeResponse, decode};

/// Connects to the directory at `host:port` and resolves `name` to a handle.
pub async fn lookup(host: &str, port: u16, name: &str) -> Result<TimeServiceStub, RemoteError> {
    let address = format!("{host}:{port}");
    let stream = TcpStream::connect(&address)
        .await
        .map_err(|e| RemoteError::ServiceUnreachable(format!("{address}: {e}")))?;

    let (read_half, write_half) = stream.into_split();
    let mut stub = TimeServiceStub {
        reader: BufReader::new(read_half),
        writer: write_half,
        service_name: name.to_string(),
    };

    let (code, text) = stub.read_reply().await?;
    if code != responses::READY {
        return Err(RemoteError::ServiceUnreachable(format!(
            "unexpected greeting from {address}: {code} {text}"
        )));
    }

    match stub.call(&format!("LOOKUP {name}")).await {
        Ok(_) => {
            debug!("Resolved {} at {}", name, address);
            Ok(stub)
        }
        Err(RemoteError::Remote { code, message }) => Err(RemoteError::ServiceUnreachable(
            format!("{name} at {address}: {code} {message}"),
        )),
        Err(e) => Err(e),
    }
}

pub struct TimeServiceStub {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    service_name: String,
}

impl TimeServiceStub {
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Registers under `client_id`; returns the address the server saw.
    pub async fn register_client(&mut self, client_id: &str) -> Result<String, RemoteError> {
        self.call(&format!("REGISTER {client_id}")).await
    }

    /// Raw wire response for `zone_id`.
    pub async fn get_time_for_zone(&mut self, zone_id: &str) -> Result<String, RemoteError> {
        self.call(&format!("TIME {zone_id}")).await
    }

    /// Decoded response for `zone_id`.
    pub async fn time_for_zone(&mut self, zone_id: &str) -> Result<TimeResponse, RemoteError> {
        let raw = self.get_time_for_zone(zone_id).await?;
        Ok(decode(&raw))
    }

    pub async fn get_connected_clients(&mut self) -> Result<BTreeMap<String, String>, RemoteError> {
        let json = self.call("CLIENTS").await?;
        serde_json::from_str(&json)
            .map_err(|e| RemoteError::Protocol(format!("bad client list: {e}")))
    }

    /// Names bound in the directory this handle came from.
    pub async fn names(&mut self) -> Result<Vec<String>, RemoteError> {
        let list = self.call("NAMES").await?;
        Ok(list
            .split(',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Ends the session politely.
    pub async fn close(mut self) -> Result<(), RemoteError> {
        self.call("QUIT").await.map(|_| ())
    }

    async fn call(&mut self, request: &str) -> Result<String, RemoteError> {
        if request.contains(['\r', '\n']) {
            return Err(RemoteError::Protocol(
                "request arguments cannot contain line breaks".into(),
            ));
        }

        self.writer.write_all(request.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;

        let (code, text) = self.read_reply().await?;
        if is_success(code) {
            Ok(text)
        } else {
            Err(RemoteError::Remote {
                code,
                message: text,
            })
        }
    }

    async fn read_reply(&mut self) -> Result<(u16, String), RemoteError> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(RemoteError::Transport(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "server closed the connection",
            )));
        }
        parse_response(&line).map_err(RemoteError::Protocol)
    }
}
