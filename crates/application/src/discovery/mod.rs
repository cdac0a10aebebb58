mod engine;
mod report;

pub use engine::DiscoveryEngine;
pub use report::{DiscoveredInstrument, ScanReport};
