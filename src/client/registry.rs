//! Client registry
//!
//! Tracks the most recent registration per client id.

use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::client::ClientRecord;

/// Registry of registered clients, shared by every connection task.
///
/// Records are replaced whole under the write lock, so a snapshot never sees a
/// half-written entry. The lock is never held across I/O.
pub struct ClientRegistry {
    clients: RwLock<HashMap<String, ClientRecord>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Stores `record`, replacing any earlier record with the same id, and
    /// returns the stored address.
    pub async fn register(&self, record: ClientRecord) -> String {
        let address = record.address().to_string();
        let mut clients = self.clients.write().await;
        clients.insert(record.client_id().to_string(), record);
        address
    }

    /// Immutable copy of `client_id -> address`.
    pub async fn snapshot(&self) -> BTreeMap<String, String> {
        let clients = self.clients.read().await;
        clients
            .values()
            .map(|r| (r.client_id().to_string(), r.address().to_string()))
            .collect()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}
