//! `hello-capture`: log the first bytes TCP clients send.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use hello_capture::config::duration::parse_duration;
use hello_capture::config::LogFormat;
use hello_capture::lifecycle::{self, ConfigOverrides, StartupError};
use hello_capture::observability::{logging, metrics};
use hello_capture::{CaptureServer, HelloRecordLogger};

#[derive(Parser)]
#[command(name = "hello-capture")]
#[command(about = "Accept TCP connections and log the initial bytes each client sends", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address and port to listen on (e.g. ":60443" or "127.0.0.1:60443").
    #[arg(long)]
    addr: Option<String>,

    /// Idle timeout for reading data from a client (e.g. "15s", "500ms").
    #[arg(long, value_parser = parse_duration)]
    timeout: Option<Duration>,

    /// Log filter directive, overridden by RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind_address: self.addr.clone(),
            read_timeout: self.timeout,
            log_level: self.log_level.clone(),
            log_format: self.log_format,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Logging may not be up yet, so report on stderr as well.
            eprintln!("hello-capture: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let config = lifecycle::resolve_config(cli.config.as_deref(), cli.overrides())?;
    logging::init(&config.observability)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        read_timeout = ?config.session.read_timeout,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = lifecycle::bind_listener(&config).await?;
    let server = CaptureServer::new(config.session.clone(), Arc::new(HelloRecordLogger));
    let handle = server.start(listener);

    let signal = match lifecycle::wait_for_signal().await {
        Ok(signal) => signal,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install signal handlers, shutting down");
            handle.shutdown().await;
            return Err(StartupError::Signal(e));
        }
    };
    tracing::info!(signal = %signal, "Received signal, initiating graceful shutdown...");

    handle.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
