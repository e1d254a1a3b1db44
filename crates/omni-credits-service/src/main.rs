//! Service entry point: tracing, config, store, router, serve.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use omni_credits_service::{create_router, AppState, ServiceConfig};
use omni_credits_store::RocksStore;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,omni_credits=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = ServiceConfig::from_env();
    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        stripe_configured = %config.stripe_api_key.is_some(),
        "Starting omni-credits service"
    );

    let store = Arc::new(RocksStore::open(&config.data_dir)?);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    let app = create_router(AppState::new(store, config));

    tracing::info!("Serving API");
    axum::serve(listener, app).await?;

    Ok(())
}
