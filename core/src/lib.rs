//! Core types shared across the hostguard engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod error;

pub use error::ProbeError;

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Lowest probe-able TCP port. Port 0 is never probed or stored.
pub const PORT_MIN: u16 = 1;
pub const PORT_MAX: u16 = 65535;

/// Every port number in the supervisable range, ascending.
pub fn full_port_range() -> Vec<u16> {
    (PORT_MIN..=PORT_MAX).collect()
}

/// Connect-probe verdict for a TCP port. Stored as text, so the wire form
/// ("Open"/"Closed") is part of the store schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortState {
    Open,
    Closed,
}

impl PortState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortState::Open => "Open",
            PortState::Closed => "Closed",
        }
    }
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid port state: {0}")]
pub struct ParsePortStateError(String);

impl FromStr for PortState {
    type Err = ParsePortStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(PortState::Open),
            "Closed" => Ok(PortState::Closed),
            other => Err(ParsePortStateError(other.to_string())),
        }
    }
}
