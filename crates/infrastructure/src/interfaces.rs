use std::net::IpAddr;

use domain::error::InstrumentError;
use domain::network::{InterfaceSource, NetworkInterface, netmask_from_prefix};
use sysinfo::Networks;
use tracing::debug;

/// Lists the host's IPv4 interfaces through the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInterfaces;

impl SystemInterfaces {
    pub fn new() -> Self {
        Self
    }
}

impl InterfaceSource for SystemInterfaces {
    fn list_interfaces(&self) -> Result<Vec<NetworkInterface>, InstrumentError> {
        let networks = Networks::new_with_refreshed_list();

        let mut interfaces: Vec<NetworkInterface> = networks
            .iter()
            .flat_map(|(name, data)| {
                data.ip_networks()
                    .iter()
                    .filter_map(move |network| match network.addr {
                        IpAddr::V4(ipv4) => Some(NetworkInterface::new(
                            name.clone(),
                            ipv4,
                            netmask_from_prefix(network.prefix),
                        )),
                        IpAddr::V6(_) => None,
                    })
            })
            .collect();

        interfaces.sort_by(|a, b| a.name.cmp(&b.name).then(a.ipv4.cmp(&b.ipv4)));
        debug!(count = interfaces.len(), "Enumerated IPv4 interfaces");
        Ok(interfaces)
    }
}
