//! Infrastructure layer - Sockets, OS interface enumeration and configuration

pub mod config;
pub mod connection;
pub mod interfaces;

pub use config::{ConnectionConfig, DiscoveryConfig, ToolConfig};
pub use connection::{TcpConfig, TcpConnection, TcpConnectionFactory};
pub use interfaces::SystemInterfaces;
