use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use domain::connection::ConnectionFactory;
use domain::error::{InstrumentError, Result};
use domain::network::{InterfaceFilter, InterfaceSource, IpRange, NetworkInterface};
use infrastructure::DiscoveryConfig;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::discovery::{DiscoveredInstrument, ScanReport};

/// Scans local subnets for SCPI instruments.
///
/// Every candidate address gets its own short-lived connection; at most
/// `max_concurrent_probes` of them are in flight at once.
pub struct DiscoveryEngine {
    factory: Arc<dyn ConnectionFactory>,
    interfaces: Arc<dyn InterfaceSource>,
    config: DiscoveryConfig,
}

impl DiscoveryEngine {
    pub fn new(
        factory: Arc<dyn ConnectionFactory>,
        interfaces: Arc<dyn InterfaceSource>,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            factory,
            interfaces,
            config,
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn list_interfaces(&self) -> Result<Vec<NetworkInterface>> {
        self.interfaces.list_interfaces()
    }

    /// Host ranges of the interfaces selected by `filter`.
    pub fn host_ranges(&self, filter: &InterfaceFilter) -> Result<Vec<IpRange>> {
        let selected: Vec<NetworkInterface> = self
            .list_interfaces()?
            .into_iter()
            .filter(|iface| filter.matches(iface))
            .collect();

        if let InterfaceFilter::Named(name) = filter {
            if selected.is_empty() {
                return Err(InstrumentError::InvalidArguments(format!(
                    "unknown interface '{}'",
                    name
                )));
            }
        }

        Ok(selected.iter().map(NetworkInterface::host_range).collect())
    }

    /// Scans every selected interface, one range after the other.
    pub async fn discover(
        &self,
        filter: &InterfaceFilter,
        cancel: CancellationToken,
    ) -> Result<Vec<ScanReport>> {
        let ranges = self.host_ranges(filter)?;
        let mut reports = Vec::with_capacity(ranges.len());

        for range in ranges {
            if cancel.is_cancelled() {
                break;
            }
            if range.len() > self.config.max_hosts_per_range {
                warn!(
                    interface = %range.interface_name,
                    range = %range,
                    hosts = range.len(),
                    limit = self.config.max_hosts_per_range,
                    "Skipping range larger than the scan limit"
                );
                continue;
            }
            if range.is_empty() {
                debug!(interface = %range.interface_name, "No hosts to scan");
                continue;
            }
            reports.push(self.scan_range(&range, cancel.clone()).await?);
        }

        Ok(reports)
    }

    /// Probes every address of `range`. Returns once all launched probes
    /// finished, also when `cancel` fires.
    pub async fn scan_range(&self, range: &IpRange, cancel: CancellationToken) -> Result<ScanReport> {
        let limit = self.config.max_concurrent_probes;
        if limit == 0 {
            return Err(InstrumentError::InvalidArguments(
                "max_concurrent_probes must be positive".to_string(),
            ));
        }

        let started = Instant::now();
        let mut report = ScanReport::new(range.clone());
        info!(
            interface = %range.interface_name,
            range = %range,
            hosts = range.len(),
            port = self.config.port,
            "Scanning range"
        );

        let semaphore = Arc::new(Semaphore::new(limit));
        let mut tasks: JoinSet<Option<DiscoveredInstrument>> = JoinSet::new();

        for address in range.addresses() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            while let Some(finished) = tasks.try_join_next() {
                collect(&mut report, finished);
            }

            let probe = Probe {
                factory: self.factory.clone(),
                address,
                port: self.config.port,
                timeout: self.config.probe_timeout(),
                interface_name: range.interface_name.clone(),
            };
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let _permit = permit;
                tokio::select! {
                    _ = cancel.cancelled() => None,
                    found = probe.run() => found,
                }
            });
            report.probed += 1;
        }

        while let Some(finished) = tasks.join_next().await {
            collect(&mut report, finished);
        }

        report.instruments.sort_by_key(|found| found.address);
        report.cancelled = cancel.is_cancelled();
        report.duration = started.elapsed();

        info!(
            interface = %range.interface_name,
            probed = report.probed,
            found = report.instruments.len(),
            failed = report.failed_probes,
            cancelled = report.cancelled,
            elapsed_ms = report.duration.as_millis() as u64,
            "Scan finished"
        );
        Ok(report)
    }
}

fn collect(
    report: &mut ScanReport,
    finished: std::result::Result<Option<DiscoveredInstrument>, JoinError>,
) {
    match finished {
        Ok(Some(found)) => report.instruments.push(found),
        Ok(None) => {}
        Err(e) => {
            let err = InstrumentError::ThreadNotJoinable(e.to_string());
            warn!(error = %err, kind = %err.kind(), "Probe task failed");
            report.failed_probes += 1;
        }
    }
}

/// One connect / identify / disconnect round against a candidate address.
struct Probe {
    factory: Arc<dyn ConnectionFactory>,
    address: Ipv4Addr,
    port: u16,
    timeout: Duration,
    interface_name: String,
}

impl Probe {
    async fn run(self) -> Option<DiscoveredInstrument> {
        let host = self.address.to_string();
        let mut conn = self.factory.create(&host, self.port, self.timeout);

        if let Err(e) = conn.connect().await {
            debug!(host = %host, port = self.port, error = %e, "No instrument");
            return None;
        }

        let identity = conn.identify().await;
        if let Err(e) = conn.disconnect().await {
            debug!(host = %host, error = %e, "Disconnect after probe failed");
        }

        match identity {
            Ok(raw) if !raw.trim().is_empty() => {
                let found = DiscoveredInstrument::new(self.address, self.port, &raw, &self.interface_name);
                info!(
                    interface = %self.interface_name,
                    host = %host,
                    role = %found.role,
                    idn = %found.identification,
                    "Instrument found"
                );
                Some(found)
            }
            Ok(_) => {
                debug!(host = %host, "Empty identification reply");
                None
            }
            Err(e) => {
                debug!(host = %host, error = %e, "Identification failed");
                None
            }
        }
    }
}
