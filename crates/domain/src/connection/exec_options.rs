use serde::{Deserialize, Serialize};

/// How much of the instrument's reply to read after a command is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyMode {
    /// Write only.
    None,
    /// Exactly one read of at most this many bytes.
    Bounded(usize),
    /// Read into a growing buffer until a newline arrives, failing once the
    /// reply exceeds `max_len` bytes.
    Line { max_len: usize },
}

/// Per-call options for [`InstrumentConnection::execute`](super::InstrumentConnection::execute).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOptions {
    pub reply: ReplyMode,
    /// Some instruments require the `\n` terminator, some tolerate its absence.
    pub append_newline: bool,
}

impl ExecOptions {
    pub const DEFAULT_REPLY_SIZE: usize = 1024;

    /// Write-only command, newline terminated.
    pub fn write() -> Self {
        Self {
            reply: ReplyMode::None,
            append_newline: true,
        }
    }

    /// Query with a single bounded read of [`Self::DEFAULT_REPLY_SIZE`] bytes.
    pub fn query() -> Self {
        Self {
            reply: ReplyMode::Bounded(Self::DEFAULT_REPLY_SIZE),
            append_newline: true,
        }
    }

    /// Query whose reply is read up to its terminating newline.
    pub fn query_line(max_len: usize) -> Self {
        Self {
            reply: ReplyMode::Line { max_len },
            append_newline: true,
        }
    }

    pub fn reply_size(mut self, size: usize) -> Self {
        self.reply = ReplyMode::Bounded(size);
        self
    }

    pub fn without_newline(mut self) -> Self {
        self.append_newline = false;
        self
    }

    pub fn wants_reply(&self) -> bool {
        !matches!(self.reply, ReplyMode::None)
    }
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self::write()
    }
}

/// Whether write-only commands go to the socket or into a script buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SendMode {
    #[default]
    Direct,
    Buffered,
}
