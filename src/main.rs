//! Rideau Dashboard CLI
//!
//! Polls the aggregation store and serves the rendered dashboard.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use rideau_dashboard::{
    config::{Config, UpstreamConfig},
    FileUpstream, RefreshOrchestrator, Upstream, VERSION,
};

#[cfg(feature = "http")]
use rideau_dashboard::{HttpUpstream, HttpUpstreamConfig};

#[derive(Parser)]
#[command(name = "rideau-dashboard")]
#[command(version = VERSION)]
#[command(about = "Ice and weather conditions dashboard for monitored canal sites", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of the loaded configuration.
#[derive(Args, Debug, Default)]
struct SourceArgs {
    /// Base URL of the aggregation API
    #[arg(long, conflicts_with = "file")]
    upstream_url: Option<String>,

    /// Read samples from a JSON or JSON-lines file instead of the API
    #[arg(long)]
    file: Option<PathBuf>,

    /// Refresh interval in milliseconds
    #[arg(long)]
    refresh_ms: Option<u64>,

    /// Trailing history window in minutes
    #[arg(long)]
    window_minutes: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the refresh loop and the dashboard server
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Dashboard server port (defaults to the configured port)
        #[arg(long)]
        port: Option<u16>,

        /// Only run the refresh loop
        #[arg(long)]
        no_server: bool,

        /// Also serve raw samples at /api/latest and /api/history
        #[arg(long)]
        data_api: bool,
    },

    /// Run a single refresh cycle and print the result
    Once {
        #[command(flatten)]
        source: SourceArgs,

        /// Print a text summary instead of JSON
        #[arg(long)]
        summary: bool,
    },

    /// Show configuration
    Config {
        /// Write the default configuration file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            source,
            port,
            no_server,
            data_api,
        } => cmd_run(source, port, no_server, data_api).await,
        Commands::Once { source, summary } => cmd_once(source, summary).await,
        Commands::Config { init } => cmd_config(init),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load the config file and apply command-line overrides.
fn load_config(args: &SourceArgs) -> Result<Config> {
    let mut config = Config::load().context("Failed to load configuration")?;

    if let Some(url) = &args.upstream_url {
        let timeout = match &config.upstream {
            UpstreamConfig::Http { timeout, .. } => *timeout,
            UpstreamConfig::File { .. } => Duration::from_secs(10),
        };
        config.upstream = UpstreamConfig::Http {
            base_url: url.clone(),
            timeout,
        };
    }
    if let Some(path) = &args.file {
        config.upstream = UpstreamConfig::File { path: path.clone() };
    }
    if let Some(ms) = args.refresh_ms {
        config.refresh_interval = Duration::from_millis(ms);
    }
    if let Some(minutes) = args.window_minutes {
        config.history_window_minutes = minutes;
    }

    config.validate()?;
    Ok(config)
}

/// Create the configured upstream.
fn create_upstream(config: &Config) -> Result<Arc<dyn Upstream>> {
    match &config.upstream {
        UpstreamConfig::File { path } => Ok(Arc::new(FileUpstream::new(
            path,
            config.locations.clone(),
        ))),
        #[cfg(feature = "http")]
        UpstreamConfig::Http { base_url, timeout } => {
            let http = HttpUpstream::new(
                HttpUpstreamConfig::new(base_url.clone()).with_timeout(*timeout),
            )?;
            Ok(Arc::new(http))
        }
        #[cfg(not(feature = "http"))]
        UpstreamConfig::Http { .. } => {
            anyhow::bail!("HTTP upstream requires the `http` feature; use --file instead")
        }
    }
}

#[allow(unused_variables)]
async fn cmd_run(source: SourceArgs, port: Option<u16>, no_server: bool, data_api: bool) -> Result<()> {
    let config = load_config(&source)?;
    let settings = config.refresh_settings()?;
    let upstream = create_upstream(&config)?;

    let orchestrator = RefreshOrchestrator::new(Arc::clone(&upstream), settings);

    #[cfg(feature = "server")]
    let server_shutdown = if no_server {
        None
    } else {
        use rideau_dashboard::server::{self, ServerConfig, ServerState};

        let mut state = ServerState::new(orchestrator.view(), orchestrator.stats())
            .with_locations(config.locations.clone());
        if data_api {
            state = state.with_data_source(Arc::clone(&upstream), config.history_window_minutes);
        }
        let (addr, tx) = server::run(ServerConfig::new(port.unwrap_or(config.server_port)), state)
            .await
            .context("Failed to start dashboard server")?;
        println!("Dashboard available at http://{addr}/api/dashboard");
        Some(tx)
    };

    #[cfg(not(feature = "server"))]
    if !no_server {
        tracing::warn!("Built without the `server` feature; running the refresh loop only");
    }

    let stats = orchestrator.stats();
    orchestrator
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    #[cfg(feature = "server")]
    if let Some(tx) = server_shutdown {
        let _ = tx.send(());
    }

    println!();
    println!("{}", stats.summary());
    Ok(())
}

async fn cmd_once(source: SourceArgs, summary: bool) -> Result<()> {
    let config = load_config(&source)?;
    let settings = config.refresh_settings()?;
    let upstream = create_upstream(&config)?;

    let orchestrator = RefreshOrchestrator::new(upstream, settings);
    let payload = orchestrator.run_cycle().await?;

    if summary {
        println!("{}", payload.summary());
    } else {
        println!("{}", serde_json::to_string_pretty(payload.as_ref())?);
    }
    Ok(())
}

fn cmd_config(init: bool) -> Result<()> {
    let path = Config::config_path();

    if init && !path.exists() {
        Config::default().save()?;
        println!("Wrote default configuration.");
    }

    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {path:?}");
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );

    if let Err(e) = config.validate() {
        eprintln!("Warning: {e}");
    }
    Ok(())
}
