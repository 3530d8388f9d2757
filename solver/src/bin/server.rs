use std::sync::Arc;

use anyhow::Context;

use squid::auth::GoogleTokenVerifier;
use squid::entitlement::StripeEntitlements;
use squid::env_config::{init_tracing, ServerConfig};
use squid::server::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = ServerConfig::from_env();

    if config.google_client_id.is_none() {
        tracing::warn!("GOOGLE_CLIENT_ID not set; paid formats will fail verification");
    }
    if config.stripe_secret_key.is_none() {
        tracing::warn!("STRIPE_SECRET_KEY not set; entitlement checks will fail");
    }

    let state = AppState::new(
        Arc::new(GoogleTokenVerifier::new(config.google_client_id.clone())),
        Arc::new(StripeEntitlements::new(
            config.stripe_secret_key.clone(),
            config.stripe_price_id.clone(),
        )),
    );
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "squid solver listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to install CTRL+C handler");
    }
}
