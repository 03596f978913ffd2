//! Wake-on-LAN magic packet construction and transmission.
//!
//! A magic packet is 6 bytes of `0xFF` followed by the target hardware
//! address repeated 16 times (102 bytes total). It is sent as a single UDP
//! datagram to the network broadcast address; the woken machine never
//! answers, so sending is fire-and-forget.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tokio::net::UdpSocket;

/// Conventional Wake-on-LAN discard port.
pub const WOL_PORT: u16 = 9;

/// 6 bytes of sync stream plus 16 repetitions of the 6-byte address.
pub const MAGIC_PACKET_LEN: usize = 102;

#[derive(Debug, Error)]
pub enum WolError {
    #[error("Failed to open UDP socket: {0}")]
    Socket(std::io::Error),

    #[error("Failed to send magic packet: {0}")]
    Send(std::io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid MAC address {0:?}: expected 6 hex octet pairs separated by ':' or '-'")]
pub struct MacParseError(String);

/// A 48-bit hardware address.
///
/// Parses the two common textual forms (`AA:BB:CC:DD:EE:FF` and
/// `aa-bb-cc-dd-ee-ff`); the separator must be uniform. Displays and
/// serializes as uppercase colon-separated pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    pub fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for MacAddr {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MacParseError(s.to_string());

        // Mixed separators ("AA:BB-CC...") are rejected.
        if s.contains(':') && s.contains('-') {
            return Err(err());
        }
        let sep = if s.contains(':') { ':' } else { '-' };

        let mut octets = [0u8; 6];
        let mut groups = s.split(sep);
        for octet in octets.iter_mut() {
            let group = groups.next().ok_or_else(err)?;
            if group.len() != 2 || !group.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(err());
            }
            *octet = u8::from_str_radix(group, 16).map_err(|_| err())?;
        }
        if groups.next().is_some() {
            return Err(err());
        }

        Ok(MacAddr(octets))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MacAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A fully constructed Wake-on-LAN payload, ready to transmit.
pub struct MagicPacket {
    payload: [u8; MAGIC_PACKET_LEN],
}

impl MagicPacket {
    pub fn new(mac: MacAddr) -> Self {
        let mut payload = [0xFFu8; MAGIC_PACKET_LEN];
        let octets = mac.octets();
        for repetition in 0..16 {
            let start = 6 + repetition * 6;
            payload[start..start + 6].copy_from_slice(&octets);
        }
        Self { payload }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }

    /// Broadcast the packet on the conventional WOL port.
    pub async fn send(&self, broadcast: Ipv4Addr) -> Result<(), WolError> {
        self.send_to(SocketAddr::from((broadcast, WOL_PORT))).await
    }

    /// Transmit the packet as one datagram to an explicit target.
    ///
    /// No response is awaited and nothing is retried; a failure here is the
    /// caller's to report.
    pub async fn send_to(&self, target: SocketAddr) -> Result<(), WolError> {
        let socket = UdpSocket::bind("0.0.0.0:0").await.map_err(WolError::Socket)?;
        socket.set_broadcast(true).map_err(WolError::Socket)?;
        socket
            .send_to(&self.payload, target)
            .await
            .map_err(WolError::Send)?;
        tracing::debug!("magic packet sent to {}", target);
        Ok(())
    }
}
