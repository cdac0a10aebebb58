use std::time::Duration;

use async_trait::async_trait;
use domain::connection::{
    ConnectionState, DEFAULT_PORT, ExecOptions, InstrumentConnection, ReplyMode, SendMode,
};
use domain::error::{ErrorChannel, InstrumentError, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// TCP instrument connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcpConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_timeout_ms() -> u64 {
    2000
}

impl TcpConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            timeout_ms: default_timeout_ms(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// SCPI-over-TCP connection to a single instrument.
///
/// The socket is owned exclusively and released when the connection is
/// disconnected or dropped. The type is move-only.
pub struct TcpConnection {
    address: String,
    port: u16,
    timeout: Duration,
    device_name: String,
    stream: Option<BufReader<TcpStream>>,
    state: ConnectionState,
    last_error: ErrorChannel,
    send_mode: SendMode,
    script: String,
}

impl TcpConnection {
    pub fn new(address: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            port,
            timeout,
            device_name: String::new(),
            stream: None,
            state: ConnectionState::Closed,
            last_error: ErrorChannel::default(),
            send_mode: SendMode::Direct,
            script: String::new(),
        }
    }

    pub fn from_config(config: &TcpConfig) -> Self {
        Self::new(config.host.clone(), config.port, config.timeout())
    }

    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn send_mode(&self) -> SendMode {
        self.send_mode
    }

    /// In [`SendMode::Buffered`] write-only commands are appended to a script
    /// instead of being sent; see [`Self::flush_buffered_script`].
    /// Buffering needs no socket, so `execute` succeeds on a closed connection
    /// in this mode; `InterfaceClosed` surfaces on flush.
    pub fn set_send_mode(&mut self, mode: SendMode) {
        debug!(host = %self.address, mode = ?mode, "Send mode changed");
        self.send_mode = mode;
    }

    pub fn buffered_script(&self) -> &str {
        &self.script
    }

    pub fn clear_buffered_script(&mut self) {
        self.script.clear();
    }

    /// Sends the buffered script line by line, bypassing the buffer. The
    /// script is cleared only if every line was sent.
    pub async fn flush_buffered_script(&mut self) -> Result<()> {
        let script = std::mem::take(&mut self.script);
        let mode = std::mem::replace(&mut self.send_mode, SendMode::Direct);

        let result = self.execute_batch(&script).await;

        self.send_mode = mode;
        if result.is_err() {
            self.script = script;
        }
        result
    }

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.last_error.clear(),
            Err(err) => self.last_error = ErrorChannel::from(err),
        }
        result
    }

    /// Drops the socket after the peer went away or a write failed.
    fn invalidate(&mut self) {
        self.stream = None;
        self.state = self.state.to_closed();
    }

    fn target(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    async fn open(&mut self) -> Result<()> {
        let next = self.state.to_open()?;
        let target = self.target();

        info!(host = %self.address, port = self.port, device = %self.device_name, "Connecting to instrument");

        let connect = TcpStream::connect((self.address.as_str(), self.port));
        let stream = match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                debug!(target = %target, error = %e, "Failed to connect to instrument");
                return Err(InstrumentError::from_io(&e));
            }
            Err(_) => {
                debug!(target = %target, "Connection attempt timed out");
                return Err(InstrumentError::Timeout(format!(
                    "connect to {} after {} ms",
                    target,
                    self.timeout.as_millis()
                )));
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!(error = %e, "Failed to disable Nagle on instrument socket");
        }

        self.stream = Some(BufReader::new(stream));
        self.state = next;

        info!(target = %target, "Connection to instrument established");
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.get_mut().shutdown().await {
                warn!(host = %self.address, error = %e, "Error shutting down instrument socket");
            }
            info!(host = %self.address, port = self.port, "Instrument disconnected");
        }
        self.state = self.state.to_closed();
    }

    fn buffer_command(&mut self, command: &str, options: ExecOptions) -> Result<()> {
        if options.wants_reply() {
            return Err(InstrumentError::InvalidArguments(
                "queries cannot be buffered".to_string(),
            ));
        }
        self.script.push_str(command);
        self.script.push('\n');
        Ok(())
    }

    async fn transact(&mut self, command: &str, options: ExecOptions) -> Result<Option<Vec<u8>>> {
        if self.send_mode == SendMode::Buffered {
            return self.buffer_command(command, options).map(|_| None);
        }

        let timeout = self.timeout;
        let stream = match self.stream.as_mut() {
            Some(stream) if self.state.is_open() => stream,
            _ => return Err(InstrumentError::InterfaceClosed),
        };

        let mut message = Vec::with_capacity(command.len() + 1);
        message.extend_from_slice(command.as_bytes());
        if options.append_newline {
            message.push(b'\n');
        }

        if let Err(err) = write_command(stream, &message, timeout).await {
            warn!(host = %self.address, command = %command, error = %err, "Failed to write command");
            self.invalidate();
            return Err(err);
        }
        debug!(host = %self.address, command = %command, "Command written");

        let reply = match options.reply {
            ReplyMode::None => return Ok(None),
            ReplyMode::Bounded(size) => read_bounded(stream, size, timeout).await,
            ReplyMode::Line { max_len } => read_line(stream, max_len, timeout).await,
        };

        match reply {
            Ok(bytes) => {
                debug!(host = %self.address, bytes = bytes.len(), "Reply received");
                Ok(Some(bytes))
            }
            Err(err) => {
                if matches!(err, InstrumentError::PeerClosed(_)) {
                    self.invalidate();
                }
                Err(err)
            }
        }
    }
}

async fn write_command(
    stream: &mut BufReader<TcpStream>,
    message: &[u8],
    timeout: Duration,
) -> Result<()> {
    let write = async {
        let socket = stream.get_mut();
        socket.write_all(message).await?;
        socket.flush().await
    };
    match tokio::time::timeout(timeout, write).await {
        Ok(result) => result.map_err(|e| InstrumentError::from_io(&e)),
        Err(_) => Err(InstrumentError::Timeout("write".to_string())),
    }
}

/// One read of at most `size` bytes.
async fn read_bounded(
    stream: &mut BufReader<TcpStream>,
    size: usize,
    timeout: Duration,
) -> Result<Vec<u8>> {
    if size == 0 {
        return Err(InstrumentError::InvalidArguments(
            "reply size must be positive".to_string(),
        ));
    }
    let mut buffer = vec![0u8; size];
    match tokio::time::timeout(timeout, stream.read(&mut buffer)).await {
        Ok(Ok(0)) => Err(InstrumentError::PeerClosed(
            "peer closed the connection".to_string(),
        )),
        Ok(Ok(n)) => {
            buffer.truncate(n);
            Ok(buffer)
        }
        Ok(Err(e)) => Err(InstrumentError::from_io(&e)),
        Err(_) => Err(InstrumentError::Timeout("no reply".to_string())),
    }
}

/// Reads up to and including the next `\n`, at most `max_len` bytes.
async fn read_line(
    stream: &mut BufReader<TcpStream>,
    max_len: usize,
    timeout: Duration,
) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut limited = (&mut *stream).take(max_len as u64);
    let read = limited.read_until(b'\n', &mut buffer);

    match tokio::time::timeout(timeout, read).await {
        Ok(Ok(_)) if buffer.ends_with(b"\n") => Ok(buffer),
        Ok(Ok(n)) if n >= max_len => Err(InstrumentError::InsufficientResources(format!(
            "reply exceeds {} bytes",
            max_len
        ))),
        Ok(Ok(_)) => Err(InstrumentError::PeerClosed(
            "peer closed the connection mid-reply".to_string(),
        )),
        Ok(Err(e)) => Err(InstrumentError::from_io(&e)),
        Err(_) => Err(InstrumentError::Timeout("no complete reply line".to_string())),
    }
}

#[async_trait]
impl InstrumentConnection for TcpConnection {
    async fn connect(&mut self) -> Result<()> {
        let result = self.open().await;
        self.record(result)
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.close().await;
        self.record(Ok(()))
    }

    fn is_open(&self) -> bool {
        self.state.is_open()
    }

    fn connection_state(&self) -> ConnectionState {
        self.state
    }

    async fn execute(&mut self, command: &str, options: ExecOptions) -> Result<Option<Vec<u8>>> {
        let result = self.transact(command, options).await;
        self.record(result)
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
