use log::{error, info, warn};
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::error::{ProtocolError, TimeServerError};
use crate::protocol::handlers::error_result;
use crate::protocol::responses::{self, format_response};
use crate::protocol::{handle_lookup_command, parse_command};
use crate::server::session::{Request, Session, handle_session, read_request, write_result};
use crate::service::{ServiceDirectory, TimeService};

type ConnectionTable = Arc<Mutex<HashMap<SocketAddr, Instant>>>;

pub struct Server {
    connections: ConnectionTable,
    directory: Arc<ServiceDirectory>,
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Binds the listener and publishes a production `TimeService` under `config.service_name`.
    pub async fn new(config: ServerConfig) -> Result<Self, TimeServerError> {
        let service = Arc::new(TimeService::from_config(&config));
        Self::with_service(config, service).await
    }

    /// Binds the listener and publishes `service` under `config.service_name`.
    ///
    /// `config` is used as given; port 0 binds an ephemeral port.
    pub async fn with_service(
        config: ServerConfig,
        service: Arc<TimeService>,
    ) -> Result<Self, TimeServerError> {
        let socket = config.listen_socket();

        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(e.into());
            }
        };

        let directory = Arc::new(ServiceDirectory::new());
        directory.bind(&config.service_name, service).await?;

        Ok(Self {
            connections: Arc::new(Mutex::new(HashMap::new())),
            directory,
            listener,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn directory(&self) -> Arc<ServiceDirectory> {
        Arc::clone(&self.directory)
    }

    pub async fn start(&self) {
        info!(
            "Starting RAX time server on {} (service {}, max {} clients)",
            self.config.listen_socket(),
            self.config.service_name,
            self.config.max_clients
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let connections = Arc::clone(&self.connections);
                    let directory = Arc::clone(&self.directory);
                    let config = Arc::clone(&self.config);

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_new_client(stream, addr, connections, directory, config).await
                        {
                            warn!("Failed to handle client {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }

    /// Serves until `shutdown` completes.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            _ = self.start() => {}
            _ = shutdown => {
                info!("Shutdown requested, no longer accepting connections");
            }
        }
    }
}

/// Handles a new client: enforces the connection limit, greets, and serves it.
async fn handle_new_client(
    mut stream: TcpStream,
    client_addr: SocketAddr,
    connections: ConnectionTable,
    directory: Arc<ServiceDirectory>,
    config: Arc<ServerConfig>,
) -> Result<(), std::io::Error> {
    {
        let mut table = connections.lock().await;
        if table.len() >= config.max_clients {
            drop(table);
            let msg = format_response(
                responses::SERVICE_UNAVAILABLE,
                "Too many connections. Try again later.",
            );
            stream.write_all(msg.as_bytes()).await?;
            return Ok(()); // Close connection
        }
        table.insert(client_addr, Instant::now());
        info!(
            "Accepted client: {} ({}/{} connections)",
            client_addr,
            table.len(),
            config.max_clients
        );
    }

    let result = serve_connection(stream, client_addr, directory, config).await;

    let mut table = connections.lock().await;
    if let Some(since) = table.remove(&client_addr) {
        info!(
            "Client {} disconnected after {:?}",
            client_addr,
            since.elapsed()
        );
    }
    result
}

/// Greets the client and runs the discovery phase, then hands off to the session loop.
async fn serve_connection(
    stream: TcpStream,
    client_addr: SocketAddr,
    directory: Arc<ServiceDirectory>,
    config: Arc<ServerConfig>,
) -> Result<(), std::io::Error> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();

    let greeting = format_response(responses::READY, "Time service directory ready");
    write_half.write_all(greeting.as_bytes()).await?;
    write_half.flush().await?;

    let mut session = Session::new(client_addr);

    loop {
        let result = match read_request(&mut reader, &mut line, config.max_command_length).await? {
            Request::Closed => {
                info!("Client {} disconnected before LOOKUP", client_addr);
                return Ok(());
            }
            Request::TooLong(len) => error_result(ProtocolError::CommandTooLong(len).into()),
            Request::Line => match parse_command(&line) {
                Ok(command) => handle_lookup_command(&mut session, &command, &directory).await,
                Err(e) => error_result(e.into()),
            },
        };

        if write_result(&mut write_half, &result).await? {
            return Ok(());
        }

        if session.is_bound() {
            break;
        }
    }

    // Hand off to session handler
    handle_session(reader, write_half, session, directory, config).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncBufReadExt;

    async fn accepted_pair() -> (TcpStream, TcpStream, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).await.unwrap();
        let (server_side, peer) = listener.accept().await.unwrap();
        (client, server_side, peer)
    }

    #[tokio::test]
    async fn disconnect_before_lookup_is_a_clean_close() {
        let (client, server_side, peer) = accepted_pair().await;
        let directory = Arc::new(ServiceDirectory::new());
        let config = Arc::new(ServerConfig::default());

        let serving = tokio::spawn(serve_connection(server_side, peer, directory, config));

        let mut reader = BufReader::new(client);
        let mut greeting = String::new();
        reader.read_line(&mut greeting).await.unwrap();
        assert_eq!(greeting, "220 Time service directory ready\r\n");
        drop(reader);

        assert!(serving.await.unwrap().is_ok());
    }
}
