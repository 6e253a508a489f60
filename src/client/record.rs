//! Module `record`
//!
//! Defines `ClientRecord`, one registration as seen by the server.

use std::net::IpAddr;

/// A registered caller.
///
/// The address is always the one observed on the transport, never a value
/// supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    client_id: String,
    address: String,
}

impl ClientRecord {
    pub fn new(client_id: impl Into<String>, observed: IpAddr) -> Self {
        Self {
            client_id: client_id.into(),
            address: observed.to_string(),
        }
    }

    // --------------------
    // Getter methods
    // --------------------

    /// Returns the caller-supplied identifier.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the observed network address in textual form.
    pub fn address(&self) -> &str {
        &self.address
    }
}
