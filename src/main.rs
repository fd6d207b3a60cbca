//! Caching forward proxy (v1)
//!
//! A forward HTTP proxy built with Tokio and hyper.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                   CACHING PROXY                      │
//!                      │                                                      │
//!   Client Request     │  ┌─────────┐   ┌─────────┐   ┌──────────────┐        │
//!   ───────────────────┼─▶│   net   │──▶│  http   │──▶│   routing    │        │
//!                      │  │listener │   │ session │   │   router     │        │
//!                      │  └─────────┘   └─────────┘   └──────┬───────┘        │
//!                      │                                      │                │
//!                      │              ┌────────────┬──────────┼────────┐       │
//!                      │              ▼            ▼          ▼        │       │
//!                      │        ┌──────────┐ ┌─────────┐ ┌─────────┐   │       │
//!                      │        │blacklist │ │  cache  │ │ journal │   │       │
//!                      │        └──────────┘ │cache.bin│ │ log.txt │   │       │
//!                      │                     └─────────┘ └─────────┘   ▼       │
//!   Client Response    │                                       ┌──────────────┐│
//!   ◀──────────────────┼───────────────────────────────────────│ origin :80   │┼──▶ Origin
//!                      │                                       └──────────────┘│
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use caching_proxy::config::ProxyConfig;
use caching_proxy::error::StartupError;
use caching_proxy::lifecycle::startup;
use caching_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "caching-proxy", version)]
#[command(about = "Forward HTTP proxy with ETag revalidation and a persistent cache", long_about = None)]
struct Cli {
    /// Directory for cache.bin, log.txt and the blacklist [default: system temp dir]
    state_dir: Option<PathBuf>,

    /// Blacklist file, relative to the state directory [default: blacklist.cfg]
    blacklist: Option<PathBuf>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:8080
    #[arg(short, long)]
    bind: Option<String>,

    /// Worker threads [default: available parallelism]
    #[arg(short, long)]
    workers: Option<usize>,
}

impl Cli {
    fn apply(self, config: &mut ProxyConfig) {
        if let Some(dir) = self.state_dir {
            config.storage.state_dir = dir;
        }
        if let Some(blacklist) = self.blacklist {
            config.storage.blacklist_file = blacklist;
        }
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if self.workers.is_some() {
            config.listener.workers = self.workers;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = try_main(cli) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn try_main(cli: Cli) -> Result<(), StartupError> {
    let file = cli.config.clone();
    let config = startup::prepare_config(file.as_deref(), |config| cli.apply(config))?;

    logging::init(&config.observability.log_level);

    tracing::info!("caching-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        workers = config.listener.worker_threads(),
        state_dir = ?config.storage.state_dir,
        blacklist = ?config.blacklist_path(),
        "Configuration loaded"
    );

    startup::run(config)?;
    Ok(())
}
