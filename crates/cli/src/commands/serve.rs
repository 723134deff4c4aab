//! Serve command - the HTTP API over the configured source and store

use anyhow::{Context, Result};
use profile_scout_domain::usecases::BatchConfig;
use profile_scout_domain::{Clock, SystemClock};
use profile_scout_server::{AppState, AuthState};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::args::ServeArgs;
use crate::commands::analyze::{build_analyzer, build_source, load_api_key, open_store};
use crate::config::AppConfig;

pub async fn execute(args: ServeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());

    let store = open_store(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut usecase = profile_scout_server::ServerUseCase::new(
        build_source(&config)?,
        Arc::clone(&store),
        Arc::clone(&clock),
        build_analyzer(&config)?,
    );
    if let Some(max_age) = config.general.analysis_max_age() {
        usecase = usecase.with_max_age(max_age);
    }

    let (rate_limit_per_minute, rate_limit_per_hour) = config.general.rate_limits();
    let state = AppState::new(
        usecase,
        store,
        clock,
        BatchConfig {
            max_concurrent: config.general.max_concurrent,
            rate_limit_per_minute,
            rate_limit_per_hour,
        },
    );

    let api_key = load_api_key(&config.server.api_key_env);
    if api_key.is_none() {
        tracing::warn!(
            env = %config.server.api_key_env,
            "Server key not set, API routes are unauthenticated"
        );
    }

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    profile_scout_server::serve(listener, state, AuthState::new(api_key), shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("profile-scout server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
