mod backend;
mod settings;
mod gui;
mod network;
mod orchestrator;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use backend::{HttpBackend, PathBackend};
use settings::AppConfig;
use gui::app;

#[derive(Debug, Parser)]
#[command(version, about = "Globe client for the network path optimizer")]
struct Cli {
    /// Configuration file (TOML). Missing files are ignored.
    #[arg(long, default_value = settings::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Overrides `backend.base_url`.
    #[arg(long)]
    backend_url: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            // Logging is not set up yet
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(url) = cli.backend_url {
        config.backend.base_url = url;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => Arc::new(rt),
        Err(e) => {
            error!("[main] failed to start tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let backend = match HttpBackend::new(&config.backend.base_url) {
        Ok(backend) => backend,
        Err(e) => {
            error!("[main] failed to create backend client: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!("[main] using backend at {}", backend.base_url());
    let backend: Arc<dyn PathBackend> = Arc::new(backend);

    match app::main(rt, config, backend) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("[main] {e}");
            ExitCode::FAILURE
        }
    }
}
