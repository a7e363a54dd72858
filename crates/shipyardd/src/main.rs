//! shipyardd — the Shipyard daemon.
//!
//! Single binary that assembles the Shipyard subsystems:
//! - Entity store (redb, in-memory)
//! - Rollout driver
//! - Orchestrator
//! - REST API
//!
//! # Usage
//!
//! ```text
//! shipyardd serve --port 8002 --rollout-step-ms 500
//! shipyardd render intent.json
//! ```

mod config;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use shipyard_manifest::{generate_deployment_manifest, render_json_pretty};
use shipyard_orchestrator::{DeploymentIntent, Orchestrator};
use shipyard_rollout::IntervalPacer;

use crate::config::DaemonConfig;

const DEFAULT_LOG_FILTER: &str = "info,shipyardd=debug,shipyard=debug";

#[derive(Parser)]
#[command(name = "shipyardd", about = "Shipyard deployment orchestrator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the orchestrator and its HTTP API.
    Serve {
        /// Port to listen on (default 8002).
        #[arg(long)]
        port: Option<u16>,

        /// Delay between rollout steps in milliseconds (default 500).
        #[arg(long)]
        rollout_step_ms: Option<u64>,

        /// Path to a shipyardd.toml config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the manifest for a deployment intent read from a JSON file.
    Render {
        /// Path to the intent JSON.
        intent: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            port,
            rollout_step_ms,
            config,
        } => {
            let config =
                DaemonConfig::load(config.as_deref())?.with_overrides(port, rollout_step_ms);
            run_serve(config).await
        }
        Command::Render { intent } => render(&intent),
    }
}

async fn run_serve(config: DaemonConfig) -> anyhow::Result<()> {
    info!("Shipyard daemon starting");

    let pacer = Arc::new(IntervalPacer::new(config.rollout_step()));
    let orchestrator = Orchestrator::in_memory(pacer, config.orchestrator_config())?;
    info!(
        step_ms = config.rollout_step_ms,
        load_balancer_ip = %config.load_balancer_ip,
        "orchestrator initialized"
    );

    let router = shipyard_api::build_router(orchestrator.clone());
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    orchestrator.shutdown();
    info!("Shipyard daemon stopped");
    Ok(())
}

fn render(path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let intent: DeploymentIntent = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    intent.validate()?;

    let manifest = generate_deployment_manifest(&intent.workload());
    println!("{}", render_json_pretty(&manifest)?);
    Ok(())
}
