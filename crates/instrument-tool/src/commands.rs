use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use application::{DiscoveryEngine, ScanReport};
use domain::connection::{ExecOptions, InstrumentConnection};
use domain::network::{InterfaceSource, NetworkInterface};
use infrastructure::{
    ConnectionConfig, DiscoveryConfig, SystemInterfaces, TcpConnection, TcpConnectionFactory,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Opens a connection; failures carry the connection's error text.
async fn open(config: &ConnectionConfig, host: &str) -> Result<TcpConnection> {
    let mut conn = TcpConnection::from_config(&config.tcp(host));
    conn.connect()
        .await
        .map_err(|_| anyhow!(conn.return_error_message()))?;
    Ok(conn)
}

/// Disconnects and turns a failed operation into the connection's error text.
async fn finish<T>(mut conn: TcpConnection, result: domain::error::Result<T>) -> Result<T> {
    let outcome = result.map_err(|_| anyhow!(conn.return_error_message()));
    let _ = conn.disconnect().await;
    outcome
}

pub async fn identify(config: &ConnectionConfig, host: &str) -> Result<String> {
    let mut conn = open(config, host).await?;
    let result = conn.identify().await;
    finish(conn, result).await
}

/// Sends one command and returns the reply text, if one was requested.
pub async fn exec(
    config: &ConnectionConfig,
    host: &str,
    command: &str,
    options: ExecOptions,
) -> Result<Option<String>> {
    let mut conn = open(config, host).await?;
    let result = conn.execute(command, options).await;
    let reply = finish(conn, result).await?;
    Ok(reply.map(|bytes| String::from_utf8_lossy(&bytes).trim_end().to_string()))
}

/// Sends a script file line by line. Returns the number of commands sent.
pub async fn batch(config: &ConnectionConfig, host: &str, file: &Path) -> Result<usize> {
    let script = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| anyhow!("Cannot read {}: {}", file.display(), e))?;
    let count = script.lines().filter(|line| !line.trim().is_empty()).count();

    let mut conn = open(config, host).await?;
    let result = conn.execute_batch(&script).await;
    finish(conn, result).await?;
    info!(host = %host, commands = count, "Batch sent");
    Ok(count)
}

pub fn interfaces() -> Result<Vec<NetworkInterface>> {
    SystemInterfaces::new().list_interfaces().map_err(|e| anyhow!(e))
}

pub async fn discover(config: &DiscoveryConfig, cancel: CancellationToken) -> Result<Vec<ScanReport>> {
    let engine = DiscoveryEngine::new(
        Arc::new(TcpConnectionFactory),
        Arc::new(SystemInterfaces::new()),
        config.clone(),
    );
    let filter = config.interface_filter();
    Ok(engine.discover(&filter, cancel).await?)
}

/// Human readable listing of scan results.
pub fn render_reports(reports: &[ScanReport]) -> String {
    let mut out = String::new();
    for report in reports {
        out.push_str(&format!(
            "{}: {} probed, {} found{}\n",
            report.range,
            report.probed,
            report.instruments.len(),
            if report.cancelled { ", cancelled" } else { "" }
        ));
        for found in &report.instruments {
            out.push_str(&format!(
                "  {}:{}  {:<17}  {}\n",
                found.address, found.port, found.role, found.identification
            ));
        }
    }
    out
}

pub fn render_interfaces(interfaces: &[NetworkInterface]) -> String {
    interfaces
        .iter()
        .map(|iface| {
            format!(
                "{:<12} {:<15} {:<15} {}\n",
                iface.name,
                iface.ipv4,
                iface.netmask,
                iface.host_range()
            )
        })
        .collect()
}
