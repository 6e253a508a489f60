//! Client side of the time service
//!
//! Resolves a service name through the server's directory and exposes the
//! remote operations as async methods. Every method may be called from any
//! task; presentation code is expected to await them off its own thread.

pub mod stub;

pub use stub::{TimeServiceStub, lookup};
