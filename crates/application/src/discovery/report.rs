use std::net::Ipv4Addr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use domain::instrument::{Identification, InstrumentRole};
use domain::network::IpRange;
use serde::Serialize;

/// An instrument that answered `*IDN?` during a scan.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredInstrument {
    pub address: Ipv4Addr,
    pub port: u16,
    pub identification: Identification,
    pub role: InstrumentRole,
    pub interface_name: String,
    pub discovered_at: DateTime<Utc>,
}

impl DiscoveredInstrument {
    pub fn new(address: Ipv4Addr, port: u16, raw_idn: &str, interface_name: &str) -> Self {
        let identification = Identification::parse(raw_idn);
        Self {
            address,
            port,
            role: identification.role(),
            identification,
            interface_name: interface_name.to_string(),
            discovered_at: Utc::now(),
        }
    }
}

/// Outcome of scanning one host range.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub range: IpRange,
    /// Probes launched
    pub probed: u64,
    /// Probe tasks that panicked or were aborted
    pub failed_probes: u64,
    pub instruments: Vec<DiscoveredInstrument>,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

impl ScanReport {
    pub fn new(range: IpRange) -> Self {
        Self {
            range,
            probed: 0,
            failed_probes: 0,
            instruments: Vec::new(),
            cancelled: false,
            started_at: Utc::now(),
            duration: Duration::ZERO,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.probed == self.range.len()
    }
}
