mod connection_state;
mod exec_options;
mod instrument_connection;

pub use connection_state::ConnectionState;
pub use exec_options::{ExecOptions, ReplyMode, SendMode};
pub use instrument_connection::{ConnectionFactory, IDENTIFY_REPLY_SIZE, InstrumentConnection};

/// Default SCPI-over-TCP port.
pub const DEFAULT_PORT: u16 = 5025;
