use std::path::PathBuf;

use clap::{Parser, Subcommand};
use domain::connection::ExecOptions;
use infrastructure::ToolConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "SCPI-over-TCP instrument control", long_about = None)]
pub struct Args {
    /// Path to config directory
    #[arg(long, default_value = "config")]
    pub config_dir: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Scan local subnets for instruments
    Discover {
        /// Interface name, or "all" for every non-loopback interface
        #[arg(long)]
        interface: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        /// Maximum probes in flight
        #[arg(long)]
        concurrency: Option<usize>,
        /// Per-probe timeout
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Print the scan reports as JSON
        #[arg(long)]
        json: bool,
    },
    /// List local IPv4 interfaces and their host ranges
    Interfaces,
    /// Send *IDN? and print the reply
    Identify {
        #[arg(long)]
        host: String,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Send one command
    Exec {
        #[arg(long)]
        host: String,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        timeout_ms: Option<u64>,
        #[arg(long)]
        command: String,
        /// Wait for a reply
        #[arg(long)]
        query: bool,
        /// Reply buffer size in bytes
        #[arg(long)]
        reply_size: Option<usize>,
        /// Read the reply up to the line terminator
        #[arg(long)]
        line: bool,
        /// Do not terminate the command with '\n'
        #[arg(long)]
        no_newline: bool,
    },
    /// Send every line of a script file
    Batch {
        #[arg(long)]
        host: String,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        timeout_ms: Option<u64>,
        #[arg(long)]
        file: PathBuf,
    },
}

/// Reply size used by `exec --line` when no size is given.
pub const DEFAULT_LINE_LIMIT: usize = 64 * 1024;

impl Command {
    /// Applies command line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut ToolConfig) {
        match self {
            Command::Discover {
                interface,
                port,
                concurrency,
                timeout_ms,
                ..
            } => {
                if let Some(interface) = interface {
                    config.discovery.interface = interface.clone();
                }
                if let Some(port) = port {
                    config.discovery.port = *port;
                }
                if let Some(concurrency) = concurrency {
                    config.discovery.max_concurrent_probes = *concurrency;
                }
                if let Some(timeout_ms) = timeout_ms {
                    config.discovery.probe_timeout_ms = *timeout_ms;
                }
            }
            Command::Interfaces => {}
            Command::Identify {
                port, timeout_ms, ..
            }
            | Command::Exec {
                port, timeout_ms, ..
            }
            | Command::Batch {
                port, timeout_ms, ..
            } => {
                if let Some(port) = port {
                    config.connection.port = *port;
                }
                if let Some(timeout_ms) = timeout_ms {
                    config.connection.timeout_ms = *timeout_ms;
                }
            }
        }
    }
}

/// Builds the execute options for `exec`.
pub fn exec_options(query: bool, line: bool, reply_size: Option<usize>, no_newline: bool) -> ExecOptions {
    let options = if line {
        ExecOptions::query_line(reply_size.unwrap_or(DEFAULT_LINE_LIMIT))
    } else if query || reply_size.is_some() {
        ExecOptions::query().reply_size(reply_size.unwrap_or(ExecOptions::DEFAULT_REPLY_SIZE))
    } else {
        ExecOptions::write()
    };

    if no_newline {
        options.without_newline()
    } else {
        options
    }
}
