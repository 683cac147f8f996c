//! push-pilot binary: wiring, logging and process lifecycle

use anyhow::{Context, Result};
use clap::Parser;
use push_pilot::config::Config;
use push_pilot::platform::GitHubAppService;
use push_pilot::webhook::{WebhookState, WebhookVerifier, create_router, serve};
use push_pilot::workflow::WorkflowRunner;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> ExitCode {
    // Missing .env is fine; real deployments use the process environment
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Exits with status 2 on missing or malformed settings
    let config = Config::parse();

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<()> {
    config.validate()?;
    let credentials = config.load_credentials()?;

    let service = Arc::new(GitHubAppService::new(
        credentials,
        config.github_api_url.as_str(),
    )?);

    match service.authenticator().app_name().await {
        Ok(name) => info!("Authenticated as '{name}'"),
        Err(e) => warn!("Could not fetch app identity: {e}"),
    }

    let runner = WorkflowRunner::new(service, config.workflow_settings());
    let settings = config.server_settings();
    let state = WebhookState::new(
        runner,
        WebhookVerifier::new(config.webhook_secret.as_bytes()),
        settings.max_in_flight,
    );
    let router = create_router(state.clone(), &settings);

    let addr = settings.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        "Server is listening for events at: http://localhost:{}{}",
        settings.port, settings.webhook_path
    );
    info!("Press Ctrl + C to quit.");

    serve(listener, router, shutdown_signal()).await?;

    info!("waiting for in-flight workflows");
    state.drain().await;
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
