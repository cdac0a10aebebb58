use std::time::Duration;

use async_trait::async_trait;

use super::connection_state::ConnectionState;
use super::exec_options::{ExecOptions, ReplyMode};
use crate::command::IDENTIFY_COMMAND;
use crate::error::{ErrorChannel, Result};

/// Reply buffer size used for `*IDN?`.
pub const IDENTIFY_REPLY_SIZE: usize = 2048;

/// Connection to one instrument that infrastructure implementations must provide.
///
/// Every operation updates [`last_error`](Self::last_error) with its outcome, so
/// [`return_error_message`](Self::return_error_message) always describes the most
/// recent call.
#[async_trait]
pub trait InstrumentConnection: Send + Sync {
    /// Open the socket. Fails with `AlreadyOpen` if a socket is already held.
    async fn connect(&mut self) -> Result<()>;

    /// Close the socket. Succeeds on a connection that was never opened.
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if currently open
    fn is_open(&self) -> bool;

    /// Get current connection state
    fn connection_state(&self) -> ConnectionState;

    /// Write one command and, depending on `options.reply`, read the reply.
    async fn execute(&mut self, command: &str, options: ExecOptions) -> Result<Option<Vec<u8>>>;

    fn last_error(&self) -> &ErrorChannel;

    fn set_last_error(&mut self, channel: ErrorChannel);

    /// Host the connection targets, as given at construction
    fn address(&self) -> &str;

    fn port(&self) -> u16;

    /// Executes every non-empty line of `commands` without reading replies.
    /// Stops at the first failing line and returns its error.
    async fn execute_batch(&mut self, commands: &str) -> Result<()> {
        for line in commands.lines().filter(|l| !l.trim().is_empty()) {
            self.execute(line, ExecOptions::write()).await?;
        }
        self.set_last_error(ErrorChannel::default());
        Ok(())
    }

    /// Sends `*IDN?` and returns the reply with newline characters removed.
    async fn identify(&mut self) -> Result<String> {
        let options = ExecOptions {
            reply: ReplyMode::Bounded(IDENTIFY_REPLY_SIZE),
            append_newline: true,
        };
        let reply = self
            .execute(IDENTIFY_COMMAND, options)
            .await?
            .unwrap_or_default();

        Ok(String::from_utf8_lossy(&reply)
            .chars()
            .filter(|c| *c != '\n' && *c != '\r')
            .collect())
    }

    fn return_error_message(&self) -> String {
        self.last_error().render()
    }
}

/// Creates connections for callers that need one per target, like discovery.
pub trait ConnectionFactory: Send + Sync {
    fn create(&self, address: &str, port: u16, timeout: Duration) -> Box<dyn InstrumentConnection>;
}
