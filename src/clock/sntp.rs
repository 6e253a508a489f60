//! SNTP client (RFC 4330)
//!
//! Queries a single NTP server over UDP and reads the server transmit timestamp.
//! The socket lives only for the duration of one `fetch` call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

use crate::error::ClockError;

pub const NTP_PACKET_LEN: usize = 48;

/// Seconds between 1900-01-01 (NTP era 0) and 1970-01-01.
pub const NTP_UNIX_OFFSET: u64 = 2_208_988_800;

/// LI = 0, VN = 4, Mode = 3 (client)
const CLIENT_HEADER: u8 = 0b00_100_011;
const MODE_SERVER: u8 = 4;
const LEAP_UNSYNCHRONIZED: u8 = 3;
/// Seconds in one NTP era.
const NTP_ERA_SECS: u64 = 1 << 32;
const TRANSMIT_OFFSET: usize = 40;

/// Port for the authoritative external time source.
#[async_trait]
pub trait NetworkTime: Send + Sync {
    async fn fetch(&self) -> Result<DateTime<Utc>, ClockError>;
}

pub struct SntpClient {
    server: String,
    timeout: Duration,
}

impl SntpClient {
    pub fn new(server: impl Into<String>, timeout: Duration) -> Self {
        Self {
            server: server.into(),
            timeout,
        }
    }

    async fn exchange(&self) -> Result<DateTime<Utc>, ClockError> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(&self.server).await?;
        socket.send(&build_request()).await?;

        let mut buf = [0u8; 512];
        let n = socket.recv(&mut buf).await?;
        parse_response(&buf[..n])
    }
}

#[async_trait]
impl NetworkTime for SntpClient {
    async fn fetch(&self) -> Result<DateTime<Utc>, ClockError> {
        match timeout(self.timeout, self.exchange()).await {
            Ok(result) => result,
            Err(_) => {
                debug!("SNTP query to {} timed out", self.server);
                Err(ClockError::NetworkTimeout(self.timeout))
            }
        }
    }
}

/// Builds a client request packet with all timestamps zeroed.
pub fn build_request() -> [u8; NTP_PACKET_LEN] {
    let mut packet = [0u8; NTP_PACKET_LEN];
    packet[0] = CLIENT_HEADER;
    packet
}

/// Extracts the transmit timestamp from a server reply.
pub fn parse_response(packet: &[u8]) -> Result<DateTime<Utc>, ClockError> {
    if packet.len() < NTP_PACKET_LEN {
        return Err(ClockError::MalformedResponse(format!(
            "short packet ({} bytes)",
            packet.len()
        )));
    }

    let mode = packet[0] & 0b111;
    if mode != MODE_SERVER {
        return Err(ClockError::MalformedResponse(format!("unexpected mode {mode}")));
    }

    let version = (packet[0] >> 3) & 0b111;
    if !(3..=4).contains(&version) {
        return Err(ClockError::MalformedResponse(format!("unsupported version {version}")));
    }

    if packet[0] >> 6 == LEAP_UNSYNCHRONIZED {
        return Err(ClockError::MalformedResponse("server clock not synchronized".into()));
    }

    // Stratum 0 is a kiss-o'-death packet.
    let stratum = packet[1];
    if stratum == 0 {
        let code = String::from_utf8_lossy(&packet[12..16]).into_owned();
        return Err(ClockError::MalformedResponse(format!("kiss-o'-death {code}")));
    }

    let secs = read_u32(packet, TRANSMIT_OFFSET);
    let frac = read_u32(packet, TRANSMIT_OFFSET + 4);
    if secs == 0 {
        return Err(ClockError::MalformedResponse("zero transmit timestamp".into()));
    }

    // MSB clear means era 1 (from 2036-02-07).
    let ntp_secs = if secs & 0x8000_0000 == 0 {
        u64::from(secs) + NTP_ERA_SECS
    } else {
        u64::from(secs)
    };
    let unix_secs = ntp_secs
        .checked_sub(NTP_UNIX_OFFSET)
        .ok_or_else(|| ClockError::MalformedResponse("transmit timestamp before 1970".into()))?;
    let nanos = ((u64::from(frac) * 1_000_000_000) >> 32) as u32;

    DateTime::from_timestamp(unix_secs as i64, nanos)
        .ok_or_else(|| ClockError::MalformedResponse("transmit timestamp out of range".into()))
}

/// Builds a server reply carrying `unix_secs` as transmit time. Used by local responders.
pub fn encode_server_reply(unix_secs: u64) -> [u8; NTP_PACKET_LEN] {
    let mut packet = [0u8; NTP_PACKET_LEN];
    packet[0] = 0b00_100_100;
    packet[1] = 1;
    let ntp_secs = (unix_secs + NTP_UNIX_OFFSET) as u32;
    packet[TRANSMIT_OFFSET..TRANSMIT_OFFSET + 4].copy_from_slice(&ntp_secs.to_be_bytes());
    packet
}

fn read_u32(packet: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        packet[offset],
        packet[offset + 1],
        packet[offset + 2],
        packet[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_header_is_sntp_v4_client() {
        let request = build_request();
        assert_eq!(request[0] >> 6, 0);
        assert_eq!((request[0] >> 3) & 0b111, 4);
        assert_eq!(request[0] & 0b111, 3);
        assert!(request[1..].iter().all(|b| *b == 0));
    }

    #[test]
    fn parses_transmit_timestamp() {
        let reply = encode_server_reply(1_700_000_000);
        let time = parse_response(&reply).unwrap();
        assert_eq!(time.timestamp(), 1_700_000_000);
    }

    #[test]
    fn fraction_becomes_nanoseconds() {
        let mut reply = encode_server_reply(1_700_000_000);
        reply[44..48].copy_from_slice(&0x8000_0000u32.to_be_bytes());
        let time = parse_response(&reply).unwrap();
        assert_eq!(time.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn rejects_short_and_non_server_packets() {
        assert!(matches!(
            parse_response(&[0u8; 12]),
            Err(ClockError::MalformedResponse(_))
        ));

        let mut reply = encode_server_reply(1_700_000_000);
        reply[0] = CLIENT_HEADER;
        assert!(parse_response(&reply).is_err());
    }

    #[test]
    fn rejects_kiss_of_death_and_zero_timestamp() {
        let mut reply = encode_server_reply(1_700_000_000);
        reply[1] = 0;
        reply[12..16].copy_from_slice(b"RATE");
        let err = parse_response(&reply).unwrap_err();
        assert!(err.to_string().contains("RATE"));

        let mut reply = encode_server_reply(1_700_000_000);
        reply[40..44].copy_from_slice(&[0, 0, 0, 0]);
        assert!(parse_response(&reply).is_err());
    }

    #[test]
    fn rejects_unsynchronized_and_unknown_versions() {
        let mut reply = encode_server_reply(1_700_000_000);
        reply[0] |= 0b11 << 6;
        let err = parse_response(&reply).unwrap_err();
        assert!(err.to_string().contains("not synchronized"));

        let mut reply = encode_server_reply(1_700_000_000);
        reply[0] = 0b00_111_100;
        assert!(parse_response(&reply).is_err());

        // LI = 1 (leap second pending) is still usable.
        let mut reply = encode_server_reply(1_700_000_000);
        reply[0] |= 0b01 << 6;
        assert_eq!(parse_response(&reply).unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn timestamps_after_era_rollover() {
        // 2036-07-18, past the 2036-02-07 wrap of the 32-bit seconds field.
        let reply = encode_server_reply(2_100_000_000);
        assert_eq!(read_u32(&reply, TRANSMIT_OFFSET) & 0x8000_0000, 0);
        assert_eq!(parse_response(&reply).unwrap().timestamp(), 2_100_000_000);

        let reply = encode_server_reply(2_085_978_495);
        assert_eq!(parse_response(&reply).unwrap().timestamp(), 2_085_978_495);
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        // Bound but never answers.
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = silent.local_addr().unwrap();

        let client = SntpClient::new(addr.to_string(), Duration::from_millis(100));
        let err = client.fetch().await.unwrap_err();
        assert!(matches!(err, ClockError::NetworkTimeout(_)));
    }

    #[tokio::test]
    async fn fetches_from_local_responder() {
        let responder = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = responder.local_addr().unwrap();
        tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let (_, peer) = responder.recv_from(&mut buf).await.unwrap();
            let reply = encode_server_reply(1_600_000_000);
            responder.send_to(&reply, peer).await.unwrap();
        });

        let client = SntpClient::new(addr.to_string(), Duration::from_secs(2));
        let time = client.fetch().await.unwrap();
        assert_eq!(time.timestamp(), 1_600_000_000);
    }
}
