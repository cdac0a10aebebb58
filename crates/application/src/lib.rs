//! Application layer - Instrument discovery use cases

pub mod discovery;

pub use discovery::{DiscoveredInstrument, DiscoveryEngine, ScanReport};
