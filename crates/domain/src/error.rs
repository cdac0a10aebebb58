use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed set of outcome kinds reported by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorKind {
    #[default]
    NoError,
    InvalidArguments,
    /// Wraps an OS error number.
    Errno,
    Timeout,
    InterfaceClosed,
    InvalidBaudrate,
    InsufficientResources,
    InsufficientPermissions,
    DeadlockDetected,
    ThreadNotJoinable,
    ThreadNotFound,
    PartiallyReadWritten,
    NoSuchFile,
    XmlParsingError,
    /// Connect was called on a connection that is already open.
    AlreadyOpen,
    UnknownError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoError => "Success",
            Self::InvalidArguments => "Invalid arguments",
            Self::Errno => "Errno",
            Self::Timeout => "Socket timeout",
            Self::InterfaceClosed => "Socket is closed",
            Self::InvalidBaudrate => "Baudrate not supported",
            Self::InsufficientResources => "Insufficient resources",
            Self::InsufficientPermissions => "Insufficient permissions",
            Self::DeadlockDetected => "Deadlock detected",
            Self::ThreadNotJoinable => "Thread not joinable",
            Self::ThreadNotFound => "Thread not found",
            Self::PartiallyReadWritten => "File only partially written",
            Self::NoSuchFile => "No such file or directory",
            Self::XmlParsingError => "Error while parsing XML file",
            Self::AlreadyOpen => "Socket is already open",
            Self::UnknownError => "Unknown error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value describing the most recent outcome of a core operation.
///
/// Kind, OS error number and message are always replaced together; a reader
/// never observes a kind paired with the message of an earlier error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorChannel {
    kind: ErrorKind,
    os_error: Option<i32>,
    message: String,
}

impl ErrorChannel {
    /// Longest detail message the channel accepts, in bytes.
    pub const MAX_MESSAGE_LEN: usize = 128;

    pub fn new(kind: ErrorKind) -> Self {
        let mut channel = Self::default();
        channel.set_error(kind);
        channel
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// OS error number, only present for [`ErrorKind::Errno`].
    pub fn os_error(&self) -> Option<i32> {
        self.os_error
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_ok(&self) -> bool {
        self.kind == ErrorKind::NoError
    }

    /// Sets the kind and clears any previous detail.
    pub fn set_error(&mut self, kind: ErrorKind) {
        self.kind = kind;
        self.os_error = None;
        self.message.clear();
    }

    /// Sets kind and detail together. Messages longer than
    /// [`Self::MAX_MESSAGE_LEN`] are rejected and the channel is left as it was.
    pub fn set_error_with_message(&mut self, kind: ErrorKind, message: &str) -> bool {
        if message.len() > Self::MAX_MESSAGE_LEN {
            return false;
        }
        self.kind = kind;
        self.os_error = None;
        self.message = message.to_string();
        true
    }

    /// Records an OS-level failure, capturing its error number.
    pub fn set_errno(&mut self, err: &io::Error) {
        self.kind = ErrorKind::Errno;
        self.os_error = err.raw_os_error();
        self.message = truncate_message(&err.to_string()).to_string();
    }

    pub fn clear(&mut self) {
        self.set_error(ErrorKind::NoError);
    }

    /// `"<kind text>: <detail>"`, or just the kind text without a detail.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ErrorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            return f.write_str(self.kind.as_str());
        }
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Cuts a detail message down to [`ErrorChannel::MAX_MESSAGE_LEN`] bytes on a
/// char boundary.
pub fn truncate_message(message: &str) -> &str {
    if message.len() <= ErrorChannel::MAX_MESSAGE_LEN {
        return message;
    }
    let mut end = ErrorChannel::MAX_MESSAGE_LEN;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    &message[..end]
}

/// Error returned by every fallible operation of the core.
///
/// Each variant maps onto exactly one [`ErrorKind`] and renders the same text
/// as the [`ErrorChannel`] built from it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstrumentError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Errno: {message}")]
    Os { code: Option<i32>, message: String },

    #[error("Socket timeout: {0}")]
    Timeout(String),

    #[error("Socket is closed")]
    InterfaceClosed,

    #[error("Socket is closed: {0}")]
    PeerClosed(String),

    #[error("Socket is already open")]
    AlreadyOpen,

    #[error("Insufficient resources: {0}")]
    InsufficientResources(String),

    #[error("Thread not joinable: {0}")]
    ThreadNotJoinable(String),
}

impl InstrumentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArguments(_) => ErrorKind::InvalidArguments,
            Self::Os { .. } => ErrorKind::Errno,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::InterfaceClosed | Self::PeerClosed(_) => ErrorKind::InterfaceClosed,
            Self::AlreadyOpen => ErrorKind::AlreadyOpen,
            Self::InsufficientResources(_) => ErrorKind::InsufficientResources,
            Self::ThreadNotJoinable(_) => ErrorKind::ThreadNotJoinable,
        }
    }

    fn detail(&self) -> &str {
        match self {
            Self::InterfaceClosed | Self::AlreadyOpen => "",
            Self::Os { message, .. } => message,
            Self::InvalidArguments(m)
            | Self::Timeout(m)
            | Self::PeerClosed(m)
            | Self::InsufficientResources(m)
            | Self::ThreadNotJoinable(m) => m,
        }
    }

    /// Builds an [`InstrumentError::Os`], truncating the detail so it always
    /// fits an [`ErrorChannel`].
    pub fn from_io(err: &io::Error) -> Self {
        Self::Os {
            code: err.raw_os_error(),
            message: truncate_message(&err.to_string()).to_string(),
        }
    }
}

impl From<io::Error> for InstrumentError {
    fn from(err: io::Error) -> Self {
        Self::from_io(&err)
    }
}

impl From<&InstrumentError> for ErrorChannel {
    fn from(err: &InstrumentError) -> Self {
        let mut channel = ErrorChannel::new(err.kind());
        // Callers of set_error_with_message must pre-truncate.
        channel.set_error_with_message(err.kind(), truncate_message(err.detail()));
        if let InstrumentError::Os { code, .. } = err {
            channel.os_error = *code;
        }
        channel
    }
}

pub type Result<T> = std::result::Result<T, InstrumentError>;
