//! Configuration management for the RAX time server
//!
//! Settings are read once at startup from an optional `config.toml`,
//! overridden by `TIME_SERVER_*` environment variables.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 1099;
pub const DEFAULT_SERVICE_NAME: &str = "TimeServer";
pub const DEFAULT_NTP_SERVER: &str = "pool.ntp.org:123";

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    // ═══ NETWORK (Environment Override Supported) ═══
    /// IP address the listener binds to
    /// Environment: TIME_SERVER_BIND_ADDRESS
    pub bind_address: String,

    /// Port of the directory/service listener
    /// Environment: TIME_SERVER_PORT
    pub port: u16,

    /// Name the time service is bound under in the directory
    /// Environment: TIME_SERVER_SERVICE_NAME
    pub service_name: String,

    /// Maximum concurrent connections
    /// Environment: TIME_SERVER_MAX_CLIENTS
    pub max_clients: usize,

    // ═══ CLOCK ═══
    /// host:port of the SNTP server consulted before the local clock
    pub ntp_server: String,

    /// Upper bound for one external time lookup
    pub ntp_timeout_ms: u64,

    // ═══ PROTOCOL ═══
    /// Maximum request line length in bytes
    pub max_command_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            max_clients: 64,
            ntp_server: DEFAULT_NTP_SERVER.to_string(),
            ntp_timeout_ms: 3000,
            max_command_length: 512,
        }
    }
}

impl ServerConfig {
    /// Load configuration from ./config.toml (if present) with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from the given file stem with environment overrides.
    ///
    /// A missing file is not an error; built-in defaults fill every key.
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();

        let settings = Config::builder()
            .set_default("bind_address", defaults.bind_address)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("service_name", defaults.service_name)?
            .set_default("max_clients", defaults.max_clients as i64)?
            .set_default("ntp_server", defaults.ntp_server)?
            .set_default("ntp_timeout_ms", defaults.ntp_timeout_ms as i64)?
            .set_default("max_command_length", defaults.max_command_length as i64)?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("TIME_SERVER"))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.port == 0 {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.bind_address.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "bind_address cannot be empty".into(),
            ));
        }

        if self.service_name.is_empty() || self.service_name.contains(char::is_whitespace) {
            return Err(config::ConfigError::Message(
                "service_name must be non-empty and contain no whitespace".into(),
            ));
        }

        if self.max_clients == 0 {
            return Err(config::ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.ntp_timeout_ms == 0 || self.ntp_timeout_ms > 30_000 {
            return Err(config::ConfigError::Message(
                "ntp_timeout_ms must be between 1 and 30000".into(),
            ));
        }

        if self.max_command_length < 16 {
            return Err(config::ConfigError::Message(
                "max_command_length must be at least 16".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as a socket string
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Get the external lookup bound as Duration
    pub fn ntp_timeout(&self) -> Duration {
        Duration::from_millis(self.ntp_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_socket(), "127.0.0.1:1099");
        assert_eq!(config.ntp_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = ServerConfig::load_from("does-not-exist/config").unwrap();
        assert_eq!(config.service_name, DEFAULT_SERVICE_NAME);
        assert_eq!(config.max_command_length, 512);
    }

    #[test]
    fn rejects_bad_values() {
        let config = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            service_name: "Time Server".into(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            ntp_timeout_ms: 60_000,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            max_clients: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
