//! # Commons Server
//!
//! ```bash
//! # Run with the default configuration file
//! commons-server
//!
//! # Run with a custom configuration file
//! commons-server --config /etc/commons/config.yaml
//!
//! # Check a configuration file and exit
//! commons-server --config config.yaml --validate
//!
//! # Environment overrides
//! COMMONS_SERVER_PORT=9090 COMMONS_API_JWT_SECRET=... commons-server
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use anyhow::Context;
use clap::Parser;
use commons_core::config::Validatable;
use std::path::PathBuf;
use tracing::info;

use commons_server::{AppConfig, CommonsServer};

/// Commons multi-tenant API server
#[derive(Parser, Debug)]
#[command(name = "commons-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Override server host
    #[arg(long, env = "COMMONS_SERVER_HOST")]
    host: Option<String>,

    /// Override server port
    #[arg(long, env = "COMMONS_SERVER_PORT")]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    if args.validate {
        println!("Configuration is valid");
        return Ok(());
    }

    let mut server = CommonsServer::new(config);
    server.initialize().await.context("startup failed")?;
    server.run().await.context("server error")?;

    info!("Commons server stopped");
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<AppConfig> {
    let mut config = if args.config.exists() {
        CommonsServer::load_config(&args.config)
            .with_context(|| format!("failed to load {}", args.config.display()))?
    } else {
        eprintln!(
            "Configuration file not found: {}, using defaults",
            args.config.display()
        );
        let mut config = AppConfig::default();
        config.apply_env_overrides();
        config
    };

    if let Some(host) = &args.host {
        config.commons.server.host.clone_from(host);
    }
    if let Some(port) = args.port {
        config.commons.server.port = port;
    }
    if args.debug {
        config.commons.logging.level = "debug".to_string();
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}
