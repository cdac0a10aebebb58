use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use super::ip_range::{IpRange, compute_host_range};
use crate::error::InstrumentError;

/// IPv4 configuration of one local network interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterface {
    pub name: String,
    pub ipv4: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

impl NetworkInterface {
    pub fn new(name: impl Into<String>, ipv4: Ipv4Addr, netmask: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            ipv4,
            netmask,
        }
    }

    pub fn is_loopback(&self) -> bool {
        self.ipv4.is_loopback()
    }

    pub fn host_range(&self) -> IpRange {
        compute_host_range(self.ipv4, self.netmask, &self.name)
    }
}

/// Which interfaces a discovery run covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InterfaceFilter {
    /// Every non-loopback interface.
    #[default]
    All,
    Named(String),
}

impl InterfaceFilter {
    pub fn matches(&self, interface: &NetworkInterface) -> bool {
        match self {
            Self::All => !interface.is_loopback(),
            Self::Named(name) => interface.name == *name,
        }
    }
}

impl From<&str> for InterfaceFilter {
    fn from(value: &str) -> Self {
        if value.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Named(value.to_string())
        }
    }
}

/// OS collaborator that enumerates local interfaces.
#[cfg_attr(test, mockall::automock)]
pub trait InterfaceSource: Send + Sync {
    fn list_interfaces(&self) -> Result<Vec<NetworkInterface>, InstrumentError>;
}
