//! edge-guard binary entry point.
//!
//! ```text
//! edge-guard [CONFIG]              serve using CONFIG (default: edge-guard.toml)
//! edge-guard hash-password PASS    print an argon2 hash for a [[credential_auth.users]] entry
//! ```

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use edge_guard::config::{ConfigLoader, LogFormat, LoggingConfig};
use edge_guard::modules::credential_auth::hash_password;
use edge_guard::modules::http_handler::{shutdown_signal, GatewayHandler, GatewayServer};

const DEFAULT_CONFIG_PATH: &str = "edge-guard.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);

    let config_path = match args.next() {
        Some(cmd) if cmd == "hash-password" => {
            let password = args.next().context("usage: edge-guard hash-password <password>")?;
            println!("{}", hash_password(&password)?);
            return Ok(());
        },
        Some(path) => path,
        None => DEFAULT_CONFIG_PATH.to_string(),
    };

    let config = ConfigLoader::with_default_validators()
        .load(&config_path)
        .with_context(|| format!("failed to load configuration from {config_path}"))?;

    init_logging(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path,
        "Starting edge-guard"
    );

    let handler = GatewayHandler::from_config(&config).context("failed to build gateway")?;
    GatewayServer::new(Arc::new(handler), config.gateway.clone())
        .run(shutdown_signal())
        .await
        .context("gateway listener failed")?;

    info!("edge-guard stopped");
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = match config.format {
        LogFormat::Json => builder.json().with_target(false).try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}
