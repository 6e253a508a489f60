//! Service directory
//!
//! Maps well-known service names to live `TimeService` handles. The server
//! binds its service here at startup; connections resolve it with `LOOKUP`.

use log::info;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::DirectoryError;
use crate::service::TimeService;

#[derive(Default)]
pub struct ServiceDirectory {
    services: RwLock<HashMap<String, Arc<TimeService>>>,
}

impl ServiceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `service` under `name`; fails if the name is already taken.
    pub async fn bind(&self, name: &str, service: Arc<TimeService>) -> Result<(), DirectoryError> {
        let mut services = self.services.write().await;
        if services.contains_key(name) {
            return Err(DirectoryError::AlreadyBound(name.to_string()));
        }
        services.insert(name.to_string(), service);
        info!("Bound service {}", name);
        Ok(())
    }

    /// Binds `service` under `name`, replacing any previous binding.
    pub async fn rebind(&self, name: &str, service: Arc<TimeService>) {
        self.services.write().await.insert(name.to_string(), service);
        info!("Rebound service {}", name);
    }

    /// Removes the binding. Sessions already holding the handle keep it.
    pub async fn unbind(&self, name: &str) -> Result<Arc<TimeService>, DirectoryError> {
        let removed = self.services.write().await.remove(name);
        match removed {
            Some(service) => {
                info!("Unbound service {}", name);
                Ok(service)
            }
            None => Err(DirectoryError::ServiceNotFound(name.to_string())),
        }
    }

    pub async fn lookup(&self, name: &str) -> Result<Arc<TimeService>, DirectoryError> {
        self.services
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| DirectoryError::ServiceNotFound(name.to_string()))
    }

    /// Bound names in sorted order.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}
