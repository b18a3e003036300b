// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, process::ExitCode};

use asteroid_container::{
    api::router,
    auth::TokenAuthority,
    config::{LogFormat, ServerConfig, DEFAULT_LOG_FILTER},
    policy::PolicyStore,
    state::AppState,
    storage::{FileStore, StoragePaths},
};
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = ServerConfig::from_env();
    init_tracing(config.log_format);

    // A container without a readable policy cannot authorize anything.
    let policy = match PolicyStore::open(&config.policy_path) {
        Ok(policy) => policy,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load container policy");
            return ExitCode::FAILURE;
        }
    };

    let files = FileStore::new(StoragePaths::new(&config.storage_root));
    if let Err(e) = files.initialize() {
        tracing::error!(error = %e, root = %config.storage_root.display(), "Failed to create storage root");
        return ExitCode::FAILURE;
    }

    if config.admin_key_is_default {
        tracing::warn!("ADMIN_KEY is not set; using the built-in default admin key");
    }

    let port = config.bind_port(policy.cached().policy().port);
    let container = policy.cached().policy().name.clone().unwrap_or_default();

    let state = AppState::new(policy, TokenAuthority::new(config.admin_key), files);
    let app = router(state);

    let addr: SocketAddr = match format!("{}:{port}", config.host).parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(error = %e, host = %config.host, port, "Invalid bind address");
            return ExitCode::FAILURE;
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(%addr, container = %container, "Asteroid container listening (docs at /docs)");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server failed");
        return ExitCode::FAILURE;
    }

    tracing::info!("Server stopped");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
