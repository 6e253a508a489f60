//! The time service
//!
//! Composes the clock, zone resolver and client registry behind the three
//! remotely invokable operations.

use log::info;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;

use crate::client::{ClientRecord, ClientRegistry};
use crate::clock::{ClockSource, SntpClient, SystemClock, TimeQuote};
use crate::config::ServerConfig;
use crate::error::ClockError;
use crate::protocol::wire;
use crate::zone::ZoneResolver;

pub struct TimeService {
    registry: Arc<ClientRegistry>,
    zones: ZoneResolver,
    clock: ClockSource,
}

impl TimeService {
    pub fn new(registry: Arc<ClientRegistry>, zones: ZoneResolver, clock: ClockSource) -> Self {
        Self {
            registry,
            zones,
            clock,
        }
    }

    /// Builds the production service: SNTP against `config.ntp_server`, system clock fallback.
    pub fn from_config(config: &ServerConfig) -> Self {
        let clock = ClockSource::new(
            Arc::new(SntpClient::new(config.ntp_server.clone(), config.ntp_timeout())),
            Arc::new(SystemClock::new()),
        );
        Self::new(Arc::new(ClientRegistry::new()), ZoneResolver::new(), clock)
    }

    /// Records `client_id` against the transport-observed `peer` address.
    pub async fn register_client(&self, client_id: &str, peer: IpAddr) -> String {
        let address = self.registry.register(ClientRecord::new(client_id, peer)).await;
        info!("Registered client {:?} from {}", client_id, address);
        address
    }

    /// Resolves the time for `zone_id`, defaulting silently on unknown zones.
    pub async fn time_quote_for_zone(&self, zone_id: Option<&str>) -> Result<TimeQuote, ClockError> {
        let zone = self.zones.resolve(zone_id);
        self.clock.now(zone).await
    }

    /// Wire-encoded `SOURCE|CLOCK_TEXT|ZONE_ID`.
    pub async fn get_time_for_zone(&self, zone_id: Option<&str>) -> Result<String, ClockError> {
        let quote = self.time_quote_for_zone(zone_id).await?;
        Ok(wire::encode(&quote))
    }

    pub async fn get_connected_clients(&self) -> BTreeMap<String, String> {
        self.registry.snapshot().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{LocalClock, NetworkTime, Source};
    use crate::protocol::wire::{TimeResponse, decode};
    use crate::zone::DEFAULT_ZONE;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDateTime, Utc};
    use std::net::Ipv4Addr;

    struct Offline;

    #[async_trait]
    impl NetworkTime for Offline {
        async fn fetch(&self) -> Result<DateTime<Utc>, ClockError> {
            Err(ClockError::MalformedResponse("offline".into()))
        }
    }

    struct Online(DateTime<Utc>);

    #[async_trait]
    impl NetworkTime for Online {
        async fn fetch(&self) -> Result<DateTime<Utc>, ClockError> {
            Ok(self.0)
        }
    }

    struct NoLocalClock;

    impl LocalClock for NoLocalClock {
        fn now_utc(&self) -> Result<DateTime<Utc>, ClockError> {
            Err(ClockError::LocalClockUnavailable("gone".into()))
        }
    }

    fn service(network: Arc<dyn NetworkTime>, local: Arc<dyn LocalClock>) -> TimeService {
        TimeService::new(
            Arc::new(ClientRegistry::new()),
            ZoneResolver::new(),
            ClockSource::new(network, local),
        )
    }

    fn quote(response: &str) -> TimeQuote {
        match decode(response) {
            TimeResponse::Quote(q) => q,
            TimeResponse::Opaque(raw) => panic!("not a quote: {raw}"),
        }
    }

    #[tokio::test]
    async fn register_then_list_contains_client() {
        let svc = service(Arc::new(Offline), Arc::new(SystemClock::new()));
        let loopback = IpAddr::V4(Ipv4Addr::LOCALHOST);

        assert_eq!(svc.register_client("FXClient", loopback).await, "127.0.0.1");
        let clients = svc.get_connected_clients().await;
        assert_eq!(clients.get("FXClient").map(String::as_str), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn re_registration_keeps_the_later_address() {
        let svc = service(Arc::new(Offline), Arc::new(SystemClock::new()));
        svc.register_client("roamer", IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10))).await;
        svc.register_client("roamer", IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20))).await;

        let clients = svc.get_connected_clients().await;
        assert_eq!(clients.len(), 1);
        assert_eq!(clients["roamer"], "192.168.1.20");
    }

    #[tokio::test]
    async fn internet_time_for_tokyo() {
        let instant = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let svc = service(Arc::new(Online(instant)), Arc::new(NoLocalClock));

        let response = svc.get_time_for_zone(Some("Asia/Tokyo")).await.unwrap();
        assert_eq!(response, "INTERNET|2023-11-15 07:13:20|Asia/Tokyo");
    }

    #[tokio::test]
    async fn unknown_zone_is_defaulted_not_rejected() {
        let svc = service(Arc::new(Offline), Arc::new(SystemClock::new()));
        for requested in [Some("Mars/Olympus"), Some(""), None] {
            let q = quote(&svc.get_time_for_zone(requested).await.unwrap());
            assert_eq!(q.zone_id, DEFAULT_ZONE.name());
        }
    }

    #[tokio::test]
    async fn offline_network_reports_local_with_parseable_clock() {
        let svc = service(Arc::new(Offline), Arc::new(SystemClock::new()));
        for zone in ["Europe/Paris", "America/Los_Angeles", "nowhere"] {
            let response = svc.get_time_for_zone(Some(zone)).await.unwrap();
            assert_eq!(response.split('|').count(), 3);

            let q = quote(&response);
            assert_eq!(q.source, Source::Local);
            assert!(NaiveDateTime::parse_from_str(&q.clock_text, crate::clock::CLOCK_TEXT_FORMAT).is_ok());
        }
    }

    #[tokio::test]
    async fn both_clocks_down_surfaces_an_error() {
        let svc = service(Arc::new(Offline), Arc::new(NoLocalClock));
        let err = svc.get_time_for_zone(Some("Etc/UTC")).await.unwrap_err();
        assert!(matches!(err, ClockError::LocalClockUnavailable(_)));
    }
}
