//! Server core functionality
//!
//! This module contains the listener, the per-connection session loop and
//! the connection limit bookkeeping.

pub mod core;
pub mod session;

pub use self::core::Server;
pub use session::Session;
