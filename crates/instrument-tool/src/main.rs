use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use infrastructure::ToolConfig;
use instrument_tool::cli::exec_options;
use instrument_tool::{Args, Command, commands};

async fn run() -> Result<()> {
    dotenv().ok();

    // Logs go to stderr so stdout stays machine readable
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,application=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = ToolConfig::load(&args.config_dir)?;
    args.command.apply_overrides(&mut config);

    match args.command {
        Command::Discover { json, .. } => {
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, stopping scan");
                    on_signal.cancel();
                }
            });

            info!(interface = %config.discovery.interface, port = config.discovery.port, "Starting discovery");
            let reports = commands::discover(&config.discovery, cancel).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                print!("{}", commands::render_reports(&reports));
            }
        }
        Command::Interfaces => {
            print!("{}", commands::render_interfaces(&commands::interfaces()?));
        }
        Command::Identify { host, .. } => {
            println!("{}", commands::identify(&config.connection, &host).await?);
        }
        Command::Exec {
            host,
            command,
            query,
            reply_size,
            line,
            no_newline,
            ..
        } => {
            let options = exec_options(query, line, reply_size, no_newline);
            if let Some(reply) = commands::exec(&config.connection, &host, &command, options).await? {
                println!("{}", reply);
            }
        }
        Command::Batch { host, file, .. } => {
            let count = commands::batch(&config.connection, &host, &file).await?;
            info!(commands = count, "Done");
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
