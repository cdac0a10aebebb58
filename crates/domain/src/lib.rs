//! Domain layer - Instrument control core types with no I/O
//!
//! This crate contains:
//! - The error channel (`ErrorKind`, `ErrorChannel`, `InstrumentError`)
//! - Command string assembly (`CommandBuilder`, `SubArg`)
//! - The connection contract (`InstrumentConnection`, `ConnectionFactory`)
//! - Subnet arithmetic and interface types for discovery
//! - Identification parsing and instrument roles
//!
//! Socket and OS access live in the infrastructure crate.

pub mod command;
pub mod connection;
pub mod error;
pub mod instrument;
pub mod network;

// Re-export commonly used types
pub use command::{CommandBuilder, SubArg};
pub use connection::{ConnectionState, ExecOptions, InstrumentConnection, ReplyMode, SendMode};
pub use error::{ErrorChannel, ErrorKind, InstrumentError};
pub use instrument::{Identification, InstrumentRole};
pub use network::{InterfaceFilter, IpRange, NetworkInterface};
