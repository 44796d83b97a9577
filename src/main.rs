//! Upload tracer service.
//!
//! Hosts the producer trigger and both consumer paths behind one HTTP
//! listener.
//!
//! # Architecture Overview
//!
//! ```text
//!   GET/POST /api/upload[-custom]
//!        │
//!        ▼
//!   ┌──────────┐  put + metadata   ┌──────────────┐
//!   │ producer │──────────────────▶│ object store │
//!   └────┬─────┘                   └──────┬───────┘
//!        │ custom event (optional)         │ get metadata
//!        ▼                                 │
//!   ┌──────────┐   POST /api/events/storage   ┌──────────────────┐
//!   │  topic   │─────────────────────────────▶│ native consumer  │──┐
//!   └──────────┘                              └──────────────────┘  │
//!                  OPTIONS/POST /api/events/cloud                   ├─▶ span `_MS.links`
//!                ────────────────────────────▶┌──────────────────┐  │
//!                                             │ cloudevents cons.│──┘
//!                                             └──────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use upload_tracer::config::{load_config, validate_config, ConfigError, ServiceConfig};
use upload_tracer::http::HttpServer;
use upload_tracer::lifecycle::{trigger_on_signal, Shutdown};
use upload_tracer::observability::{init_logging, init_metrics};

#[derive(Parser)]
#[command(name = "upload-tracer")]
#[command(about = "Cross-process trace correlation for storage uploads", long_about = None)]
struct Args {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    init_logging(&config.observability.log_level)?;
    tracing::info!("upload-tracer v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        storage = ?config.storage.backend,
        payload_path = %config.producer.payload_path,
        custom_events = config.producer.publish_endpoint.is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    tokio::spawn(trigger_on_signal(shutdown.clone()));

    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
