//! Command handlers for the RAX time server.
//!
//! Handlers run against one connection's `Session` and the shared
//! `ServiceDirectory`. Discovery commands are always available; service
//! operations need a handle obtained with `LOOKUP`.

use log::{info, warn};
use std::net::IpAddr;
use std::sync::Arc;

use crate::error::handlers::{error_to_reply, handle_error};
use crate::error::{ProtocolError, TimeServerError};
use crate::protocol::responses::{self, format_response};
use crate::protocol::{Command, CommandResult};
use crate::server::session::Session;
use crate::service::{ServiceDirectory, TimeService};

/// Dispatches a command received before the session holds a service handle.
pub async fn handle_lookup_command(
    session: &mut Session,
    command: &Command,
    directory: &ServiceDirectory,
) -> CommandResult {
    match command {
        Command::LOOKUP(name) => handle_cmd_lookup(session, name, directory).await,
        Command::NAMES => handle_cmd_names(directory).await,
        Command::QUIT => handle_cmd_quit(session),
        _ => error_result(ProtocolError::NotBound.into()),
    }
}

/// Dispatches a command on a bound session.
pub async fn handle_command(
    session: &mut Session,
    command: &Command,
    directory: &ServiceDirectory,
) -> CommandResult {
    let service = match session.service() {
        Some(service) => Arc::clone(service),
        None => return handle_lookup_command(session, command, directory).await,
    };

    match command {
        Command::LOOKUP(name) => handle_cmd_lookup(session, name, directory).await,
        Command::NAMES => handle_cmd_names(directory).await,
        Command::QUIT => handle_cmd_quit(session),
        Command::REGISTER(client_id) => {
            handle_cmd_register(&service, client_id, session.peer_ip()).await
        }
        Command::TIME(zone_id) => handle_cmd_time(&service, zone_id.as_deref()).await,
        Command::CLIENTS => handle_cmd_clients(&service).await,
        Command::UNKNOWN(word) => {
            error_result(ProtocolError::UnknownCommand(word.clone()).into())
        }
    }
}

/// Builds a failure result from an error, using its reply code and text.
pub fn error_result(err: TimeServerError) -> CommandResult {
    CommandResult::failure(err.to_string(), error_to_reply(&err))
}

/// Handles LOOKUP: binds the session to the named service.
///
/// A failed lookup leaves any existing binding in place.
async fn handle_cmd_lookup(
    session: &mut Session,
    name: &str,
    directory: &ServiceDirectory,
) -> CommandResult {
    match directory.lookup(name).await {
        Ok(service) => {
            session.bind(name, service);
            info!("Client {} bound to {}", session.peer(), name);
            CommandResult::success(format_response(responses::BOUND, name))
        }
        Err(e) => {
            warn!("Client {} failed lookup: {}", session.peer(), e);
            error_result(e.into())
        }
    }
}

/// Handles NAMES: comma-separated list of bound services.
async fn handle_cmd_names(directory: &ServiceDirectory) -> CommandResult {
    let names = directory.names().await.join(",");
    CommandResult::success(format_response(responses::OK, &names))
}

/// Handles QUIT: releases the handle and signals connection close.
fn handle_cmd_quit(session: &mut Session) -> CommandResult {
    session.release();
    CommandResult::close(format_response(responses::GOODBYE, "Goodbye"))
}

/// Handles REGISTER: records the id against the peer address of this connection.
async fn handle_cmd_register(service: &TimeService, client_id: &str, peer: IpAddr) -> CommandResult {
    let address = service.register_client(client_id, peer).await;
    CommandResult::success(format_response(responses::OK, &address))
}

/// Handles TIME: wire-encoded quote, or 451 if no clock could answer.
async fn handle_cmd_time(service: &TimeService, zone_id: Option<&str>) -> CommandResult {
    match service.get_time_for_zone(zone_id).await {
        Ok(encoded) => CommandResult::success(format_response(responses::OK, &encoded)),
        Err(e) => {
            let err = TimeServerError::from(e);
            handle_error(&err);
            error_result(err)
        }
    }
}

/// Handles CLIENTS: JSON object of client id to address.
async fn handle_cmd_clients(service: &TimeService) -> CommandResult {
    let clients = service.get_connected_clients().await;
    match serde_json::to_string(&clients) {
        Ok(json) => CommandResult::success(format_response(responses::OK, &json)),
        Err(e) => CommandResult::failure(
            e.to_string(),
            format_response(responses::SERVICE_UNAVAILABLE, "Failed to encode client list"),
        ),
    }
}
