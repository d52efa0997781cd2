use crate::protocol::{BodyByteOrder, NUM_LAYERS};
use crate::ScannerError;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Scanner endpoint and decoding parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Dotted-quad IPv4 (or IPv6) address of the scanner.
    pub ip: String,
    pub port: u16,
    pub connect_timeout_ms: u64,
    pub body_byte_order: BodyByteOrder,
    /// Elevation of layers 0..3, degrees.
    pub layer_elevation_deg: [f64; NUM_LAYERS],
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            ip: "131.254.12.119".to_string(),
            port: 12002,
            connect_timeout_ms: 3000,
            body_byte_order: BodyByteOrder::BigEndian,
            layer_elevation_deg: [-1.2, -0.4, 0.4, 1.2],
        }
    }
}

impl ScannerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ScannerError> {
        let ip: IpAddr = self
            .ip
            .trim()
            .parse()
            .map_err(|_| ScannerError::InvalidAddress {
                ip: self.ip.clone(),
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn layer_elevation_rad(&self) -> [f64; NUM_LAYERS] {
        self.layer_elevation_deg.map(f64::to_radians)
    }
}
