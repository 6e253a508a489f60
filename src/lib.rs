//! RAX Time Server
//!
//! A networked time service: clients discover the `TimeServer` by name,
//! register themselves, and request the current time for an IANA zone.

pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod protocol;
pub mod remote;
pub mod server;
pub mod service;
pub mod zone;

pub use server::Server;
