use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use application::DiscoveryEngine;
use async_trait::async_trait;
use domain::connection::{ConnectionFactory, ConnectionState, ExecOptions, InstrumentConnection};
use domain::error::{ErrorChannel, ErrorKind, InstrumentError, Result};
use domain::instrument::InstrumentRole;
use domain::network::{InterfaceFilter, InterfaceSource, IpRange, NetworkInterface};
use infrastructure::{DiscoveryConfig, TcpConnectionFactory};
use mockall::mock;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

// --- Fake network of instruments ---

#[derive(Default)]
struct FakeNetwork {
    instruments: HashMap<String, String>,
    connect_delay: Duration,
    hang: bool,
    panic_host: Option<String>,
    created: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    hosts: Mutex<Vec<String>>,
}

impl FakeNetwork {
    fn with_instruments(instruments: &[(&str, &str)]) -> Self {
        Self {
            instruments: instruments
                .iter()
                .map(|(host, idn)| (host.to_string(), idn.to_string()))
                .collect(),
            connect_delay: Duration::from_millis(1),
            ..Default::default()
        }
    }
}

struct FakeConnection {
    net: Arc<FakeNetwork>,
    address: String,
    port: u16,
    state: ConnectionState,
    last_error: ErrorChannel,
}

#[async_trait]
impl InstrumentConnection for FakeConnection {
    async fn connect(&mut self) -> Result<()> {
        let now = self.net.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.net.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.net.panic_host.as_deref() == Some(self.address.as_str()) {
            panic!("driver crashed on {}", self.address);
        }
        if self.net.hang {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(self.net.connect_delay).await;
        self.net.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.net.instruments.contains_key(&self.address) {
            self.state = ConnectionState::Open;
            Ok(())
        } else {
            let err = InstrumentError::Os {
                code: Some(111),
                message: "Connection refused".to_string(),
            };
            self.last_error = ErrorChannel::from(&err);
            Err(err)
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.state = ConnectionState::Closed;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state.is_open()
    }

    fn connection_state(&self) -> ConnectionState {
        self.state
    }

    async fn execute(&mut self, command: &str, _options: ExecOptions) -> Result<Option<Vec<u8>>> {
        if !self.state.is_open() {
            return Err(InstrumentError::InterfaceClosed);
        }
        match (command, self.net.instruments.get(&self.address)) {
            ("*IDN?", Some(idn)) => Ok(Some(format!("{}\n", idn).into_bytes())),
            _ => Ok(None),
        }
    }

    fn last_error(&self) -> &ErrorChannel {
        &self.last_error
    }

    fn set_last_error(&mut self, channel: ErrorChannel) {
        self.last_error = channel;
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn port(&self) -> u16 {
        self.port
    }
}

struct FakeFactory(Arc<FakeNetwork>);

impl ConnectionFactory for FakeFactory {
    fn create(&self, address: &str, port: u16, _timeout: Duration) -> Box<dyn InstrumentConnection> {
        self.0.created.fetch_add(1, Ordering::SeqCst);
        self.0.hosts.lock().unwrap().push(address.to_string());
        Box::new(FakeConnection {
            net: self.0.clone(),
            address: address.to_string(),
            port,
            state: ConnectionState::Closed,
            last_error: ErrorChannel::default(),
        })
    }
}

mock! {
    Interfaces {}
    impl InterfaceSource for Interfaces {
        fn list_interfaces(&self) -> std::result::Result<Vec<NetworkInterface>, InstrumentError>;
    }
}

fn interfaces(list: Vec<NetworkInterface>) -> Arc<dyn InterfaceSource> {
    let mut mock = MockInterfaces::new();
    mock.expect_list_interfaces()
        .returning(move || Ok(list.clone()));
    Arc::new(mock)
}

fn config(max_concurrent_probes: usize) -> DiscoveryConfig {
    DiscoveryConfig {
        max_concurrent_probes,
        probe_timeout_ms: 100,
        ..Default::default()
    }
}

fn engine(net: &Arc<FakeNetwork>, ifaces: Vec<NetworkInterface>, limit: usize) -> DiscoveryEngine {
    DiscoveryEngine::new(Arc::new(FakeFactory(net.clone())), interfaces(ifaces), config(limit))
}

fn class_c() -> IpRange {
    IpRange::new(
        Ipv4Addr::new(192, 168, 1, 1),
        Ipv4Addr::new(192, 168, 1, 254),
        "eth0",
    )
}

const FUNCGEN: &str = "Agilent Technologies,33522B,MY52800000,3.03-1.19-2.00-52-00";
const SMU: &str = "Keithley Instruments Inc., Model 2636B, 4321, 3.2.2";

#[tokio::test]
async fn test_scan_probes_every_host() {
    let net = Arc::new(FakeNetwork::with_instruments(&[
        ("192.168.1.40", SMU),
        ("192.168.1.20", FUNCGEN),
    ]));
    let engine = engine(&net, vec![], 16);

    let report = engine
        .scan_range(&class_c(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.probed, 254);
    assert_eq!(report.failed_probes, 0);
    assert!(report.is_complete());
    assert_eq!(net.created.load(Ordering::SeqCst), 254);

    let found: Vec<(Ipv4Addr, InstrumentRole)> = report
        .instruments
        .iter()
        .map(|i| (i.address, i.role))
        .collect();
    assert_eq!(
        found,
        vec![
            (Ipv4Addr::new(192, 168, 1, 20), InstrumentRole::FunctionGenerator),
            (Ipv4Addr::new(192, 168, 1, 40), InstrumentRole::SourceMeasureUnit),
        ]
    );
    assert_eq!(report.instruments[0].identification.raw, FUNCGEN);
    assert_eq!(report.instruments[0].port, 5025);
}

#[tokio::test]
async fn test_scan_never_exceeds_probe_limit() {
    let net = Arc::new(FakeNetwork {
        connect_delay: Duration::from_millis(20),
        ..Default::default()
    });
    let engine = engine(&net, vec![], 4);
    let range = IpRange::new(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 40), "eth0");

    let report = engine.scan_range(&range, CancellationToken::new()).await.unwrap();

    assert_eq!(report.probed, 40);
    assert!(report.instruments.is_empty());
    let max = net.max_in_flight.load(Ordering::SeqCst);
    assert!(max <= 4, "max in flight was {}", max);
    assert!(max > 1);
}

#[tokio::test]
async fn test_scan_crosses_octet_boundary() {
    let net = Arc::new(FakeNetwork::with_instruments(&[]));
    let engine = engine(&net, vec![], 8);
    let range = IpRange::new(Ipv4Addr::new(10, 0, 0, 250), Ipv4Addr::new(10, 0, 1, 5), "eth0");

    let report = engine.scan_range(&range, CancellationToken::new()).await.unwrap();

    assert_eq!(report.probed, 12);
    let hosts = net.hosts.lock().unwrap();
    assert!(hosts.contains(&"10.0.0.255".to_string()));
    assert!(hosts.contains(&"10.0.1.0".to_string()));
}

#[tokio::test]
async fn test_panicking_probe_is_counted_and_scan_completes() {
    let net = Arc::new(FakeNetwork {
        panic_host: Some("10.0.0.3".to_string()),
        ..FakeNetwork::with_instruments(&[("10.0.0.5", SMU)])
    });
    let engine = engine(&net, vec![], 4);
    let range = IpRange::new(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 8), "eth0");

    let report = engine.scan_range(&range, CancellationToken::new()).await.unwrap();

    assert_eq!(report.probed, 8);
    assert_eq!(report.failed_probes, 1);
    assert_eq!(report.instruments.len(), 1);
    assert_eq!(report.instruments[0].address, Ipv4Addr::new(10, 0, 0, 5));
}

#[tokio::test]
async fn test_cancel_before_scan() {
    let net = Arc::new(FakeNetwork::default());
    let engine = engine(&net, vec![], 8);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = engine.scan_range(&class_c(), cancel).await.unwrap();

    assert_eq!(report.probed, 0);
    assert!(report.cancelled);
    assert_eq!(net.created.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cancel_aborts_in_flight_probes() {
    let net = Arc::new(FakeNetwork {
        hang: true,
        ..Default::default()
    });
    let engine = engine(&net, vec![], 8);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let report = tokio::time::timeout(Duration::from_secs(5), engine.scan_range(&class_c(), cancel))
        .await
        .expect("scan must return after cancellation")
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.probed, 8);
    assert!(report.instruments.is_empty());
}

#[tokio::test]
async fn test_zero_probe_limit_is_rejected() {
    let net = Arc::new(FakeNetwork::default());
    let engine = engine(&net, vec![], 0);

    let err = engine
        .scan_range(&class_c(), CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArguments);
}

#[tokio::test]
async fn test_unknown_interface_is_rejected() {
    let net = Arc::new(FakeNetwork::default());
    let engine = engine(
        &net,
        vec![NetworkInterface::new(
            "eth0",
            Ipv4Addr::new(192, 168, 1, 10),
            Ipv4Addr::new(255, 255, 255, 0),
        )],
        8,
    );

    let err = engine
        .discover(&InterfaceFilter::from("wlan9"), CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArguments);
    assert!(err.to_string().contains("wlan9"));
}

#[tokio::test]
async fn test_discover_all_skips_loopback() {
    let net = Arc::new(FakeNetwork::with_instruments(&[("10.0.0.6", FUNCGEN)]));
    let engine = engine(
        &net,
        vec![
            NetworkInterface::new("lo", Ipv4Addr::LOCALHOST, Ipv4Addr::new(255, 0, 0, 0)),
            NetworkInterface::new(
                "eth0",
                Ipv4Addr::new(10, 0, 0, 5),
                Ipv4Addr::new(255, 255, 255, 252),
            ),
        ],
        8,
    );

    let reports = engine
        .discover(&InterfaceFilter::All, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].range.interface_name, "eth0");
    assert_eq!(reports[0].probed, 2);
    assert_eq!(reports[0].instruments.len(), 1);
    assert_eq!(reports[0].instruments[0].interface_name, "eth0");
}

#[tokio::test]
async fn test_oversized_range_is_skipped() {
    let net = Arc::new(FakeNetwork::default());
    let engine = engine(
        &net,
        vec![NetworkInterface::new(
            "eth0",
            Ipv4Addr::new(10, 1, 2, 3),
            Ipv4Addr::new(255, 255, 0, 0),
        )],
        8,
    );

    let reports = engine
        .discover(&InterfaceFilter::All, CancellationToken::new())
        .await
        .unwrap();

    assert!(reports.is_empty());
    assert_eq!(net.created.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_discover_over_tcp_loopback() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (reader, mut writer) = socket.into_split();
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line == "*IDN?" {
                let _ = writer
                    .write_all(b"Siglent Technologies,SPD1305X,SPD13DCX1,1.01\n")
                    .await;
            }
        }
    });

    let engine = DiscoveryEngine::new(
        Arc::new(TcpConnectionFactory),
        interfaces(vec![NetworkInterface::new(
            "lo",
            Ipv4Addr::LOCALHOST,
            Ipv4Addr::BROADCAST,
        )]),
        DiscoveryConfig {
            port,
            probe_timeout_ms: 1000,
            ..Default::default()
        },
    );

    let reports = engine
        .discover(&InterfaceFilter::from("lo"), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].probed, 1);
    let found = &reports[0].instruments[0];
    assert_eq!(found.address, Ipv4Addr::LOCALHOST);
    assert_eq!(found.port, port);
    assert_eq!(found.role, InstrumentRole::DcPowerSupply);
    assert_eq!(found.identification.model, "SPD1305X");
}
