use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// Usable host range of one interface's subnet, bounds inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRange {
    pub start: Ipv4Addr,
    pub end: Ipv4Addr,
    pub interface_name: String,
}

impl IpRange {
    pub fn new(start: Ipv4Addr, end: Ipv4Addr, interface_name: impl Into<String>) -> Self {
        Self {
            start,
            end,
            interface_name: interface_name.into(),
        }
    }

    /// Number of candidate addresses, zero when `start > end`.
    pub fn len(&self) -> u64 {
        let (start, end) = (u32::from(self.start), u32::from(self.end));
        if start > end {
            0
        } else {
            u64::from(end - start) + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let value = u32::from(addr);
        u32::from(self.start) <= value && value <= u32::from(self.end)
    }

    /// Every address from `start` to `end` across the full 32-bit span, not
    /// only the last octet.
    pub fn addresses(&self) -> impl Iterator<Item = Ipv4Addr> + Send + 'static {
        let (start, end) = (u32::from(self.start), u32::from(self.end));
        (start..=end).map(Ipv4Addr::from)
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({})", self.start, self.end, self.interface_name)
    }
}

/// Computes the usable host range of `ip` under `mask`, octet by octet.
///
/// An octet whose mask byte is `255` is fixed to the interface's own octet.
/// Any other octet ranges from `(ip & mask) + 1` to `((ip & mask) | !mask) - 1`,
/// which leaves out the network and broadcast values. The computation is
/// purely bitwise, so non-contiguous masks are handled as well.
pub fn compute_host_range(ip: Ipv4Addr, mask: Ipv4Addr, interface_name: &str) -> IpRange {
    let ip_octets = ip.octets();
    let mask_octets = mask.octets();
    let mut start = [0u8; 4];
    let mut end = [0u8; 4];

    for i in 0..4 {
        let (octet, mask) = (ip_octets[i], mask_octets[i]);
        if mask == u8::MAX {
            start[i] = octet;
            end[i] = octet;
        } else {
            // mask < 255 keeps both sides in 1..=254
            let network = octet & mask;
            start[i] = network + 1;
            end[i] = (network | !mask) - 1;
        }
    }

    IpRange::new(Ipv4Addr::from(start), Ipv4Addr::from(end), interface_name)
}

/// Netmask for a CIDR prefix length; prefixes above 32 saturate.
pub fn netmask_from_prefix(prefix: u8) -> Ipv4Addr {
    let bits = match prefix {
        0 => 0,
        p if p >= 32 => u32::MAX,
        p => u32::MAX << (32 - u32::from(p)),
    };
    Ipv4Addr::from(bits)
}
