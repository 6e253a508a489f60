//! RAX Time Client
//!
//! Headless driver for the time service. Remote calls run on a worker task;
//! the main task is the only one that prints.

use clap::Parser;
use log::{info, warn};
use std::collections::BTreeMap;
use std::process;
use std::time::Duration;
use tokio::sync::mpsc;

use rax_time_server::config::{DEFAULT_PORT, DEFAULT_SERVICE_NAME};
use rax_time_server::error::RemoteError;
use rax_time_server::protocol::TimeResponse;
use rax_time_server::remote::{TimeServiceStub, lookup};

#[derive(Parser, Debug, Clone)]
#[command(name = "time-client", about = "Register with a RAX time server and fetch the time")]
struct Args {
    /// Host running the time server directory
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Directory port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Service name to look up
    #[arg(long, default_value = DEFAULT_SERVICE_NAME)]
    service: String,

    /// Identifier to register under
    #[arg(long, default_value = "FXClient")]
    client_id: String,

    /// IANA zone to request
    #[arg(long, default_value = "Etc/UTC")]
    zone: String,

    /// Refresh every SECS seconds instead of fetching once
    #[arg(long, value_name = "SECS")]
    watch: Option<u64>,

    /// Also print the server's client registry
    #[arg(long)]
    clients: bool,
}

/// Results marshalled from the worker task to the printing task.
enum Update {
    Connected(String),
    Registered(String),
    Time { zone: String, response: TimeResponse },
    Clients(BTreeMap<String, String>),
    Failed(String),
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let (tx, mut rx) = mpsc::channel(16);
    let worker = tokio::spawn(drive(args.clone(), tx));

    let mut failed = false;
    while let Some(update) = rx.recv().await {
        failed |= matches!(update, Update::Failed(_));
        render(&args, &update);
    }

    if let Err(e) = worker.await {
        warn!("Worker task ended abnormally: {}", e);
        failed = true;
    }

    if failed {
        process::exit(1);
    }
}

async fn drive(args: Args, tx: mpsc::Sender<Update>) {
    let mut stub = match lookup(&args.host, args.port, &args.service).await {
        Ok(stub) => stub,
        Err(e) => {
            let _ = tx.send(Update::Failed(e.to_string())).await;
            return;
        }
    };
    let _ = tx
        .send(Update::Connected(format!("{}:{}", args.host, args.port)))
        .await;

    loop {
        if let Err(e) = fetch_once(&mut stub, &args, &tx).await {
            let _ = tx.send(Update::Failed(e.to_string())).await;
            return;
        }

        match args.watch {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs.max(1))).await,
            None => break,
        }
    }

    if let Err(e) = stub.close().await {
        info!("Session did not close cleanly: {}", e);
    }
}

async fn fetch_once(
    stub: &mut TimeServiceStub,
    args: &Args,
    tx: &mpsc::Sender<Update>,
) -> Result<(), RemoteError> {
    let ip = stub.register_client(&args.client_id).await?;
    let _ = tx.send(Update::Registered(ip)).await;

    let response = stub.time_for_zone(&args.zone).await?;
    let _ = tx
        .send(Update::Time {
            zone: args.zone.clone(),
            response,
        })
        .await;

    if args.clients {
        let clients = stub.get_connected_clients().await?;
        let _ = tx.send(Update::Clients(clients)).await;
    }
    Ok(())
}

fn render(args: &Args, update: &Update) {
    match update {
        Update::Connected(endpoint) => println!("Status: Connected to {endpoint}"),
        Update::Registered(ip) => println!("Registered IP: {ip}"),
        Update::Time { zone, response } => {
            let (source, zone) = match response {
                TimeResponse::Quote(q) => (q.source.as_str(), q.zone_id.as_str()),
                TimeResponse::Opaque(_) => ("UNKNOWN", zone.as_str()),
            };
            println!(
                "[{} - {}] {} time: {}",
                args.client_id,
                zone,
                source,
                response.display_text()
            );
            println!("Status: {}", response.status_text());
        }
        Update::Clients(clients) => {
            println!("Connected clients:");
            for (id, address) in clients {
                println!("  {id:?} -> {address}");
            }
        }
        Update::Failed(reason) => {
            eprintln!("Error: {reason}");
            eprintln!("Status: Connection failed");
        }
    }
}
