mod interface;
mod ip_range;

pub use interface::{InterfaceFilter, InterfaceSource, NetworkInterface};
pub use ip_range::{IpRange, compute_host_range, netmask_from_prefix};
