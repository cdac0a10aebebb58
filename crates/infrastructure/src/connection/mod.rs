mod tcp;

pub use tcp::{TcpConfig, TcpConnection};

use std::time::Duration;

use domain::connection::{ConnectionFactory, InstrumentConnection};

/// Factory for SCPI-over-TCP connections
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnectionFactory;

impl ConnectionFactory for TcpConnectionFactory {
    fn create(&self, address: &str, port: u16, timeout: Duration) -> Box<dyn InstrumentConnection> {
        Box::new(TcpConnection::new(address, port, timeout))
    }
}
