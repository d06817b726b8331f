//! Unkey GraphQL Gateway - Main Application Entry Point
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Build the verification client, the gate and the engine
//! 3. Build HTTP router with routes and middleware
//! 4. Start server on configured port

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use unkey_graphql_gateway::{
    app::{self, GatewayConfig},
    config::Config,
    services::{engine::StaticSchema, gate::AuthGate, verification::UnkeyVerifier},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Verification client, bounded by the same timeout the gate enforces
    let client = reqwest::Client::builder()
        .timeout(config.verify_timeout())
        .build()?;
    let mut verifier = UnkeyVerifier::with_client(client, &config.unkey_api_url);
    if let Some(root_key) = &config.unkey_root_key {
        verifier = verifier.with_root_key(root_key);
    }
    if let Some(api_id) = &config.unkey_api_id {
        verifier = verifier.with_api_id(api_id);
    }
    tracing::info!(authority = %config.unkey_api_url, "Key verification client ready");

    let gate = AuthGate::new(
        Arc::new(verifier),
        config.header_name()?,
        config.verify_timeout(),
    );

    let app = app::router(GatewayConfig {
        engine: Arc::new(StaticSchema::hello_world()),
        gate: Arc::new(gate),
        path: config.graphql_path.clone(),
    });

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        "Server is running on http://localhost:{}{}",
        config.server_port,
        config.graphql_path
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
