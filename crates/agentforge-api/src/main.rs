//! AgentForge REST API entry point.
//!
//! Binary name: `agentforge`
//!
//! Resolves configuration, initializes tracing, logs any configuration
//! warnings, then either prints the configuration or opens the storage
//! backend and serves the API.

mod cli;
mod http;
mod state;

use clap::Parser;

use agentforge_infra::config::{AppConfig, Overrides};
use agentforge_observe::tracing_setup::{init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(Overrides {
        data_dir: cli.data_dir.clone(),
        backend: cli.command.backend(),
    })
    .await?;

    init_tracing(cli.verbosity(), config.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;
    for warning in &config.warnings {
        tracing::warn!("{warning}");
    }

    let result = run(cli.command, config).await;
    shutdown_tracing();
    result
}

async fn run(command: Commands, config: AppConfig) -> anyhow::Result<()> {
    match command {
        Commands::Config { .. } => {
            println!("{config}");
        }

        Commands::Serve { port, host, .. } => {
            let state = AppState::from_config(&config).await?;

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!(%addr, backend = %config.backend, "AgentForge API listening");

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            tracing::info!("server stopped");
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
