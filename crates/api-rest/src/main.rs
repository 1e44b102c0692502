//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the broker's REST surface on its own, which is handy for development
//! and debugging. The workspace's main `vistasim-run` binary is the normal
//! entry point and serves the same router.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Start the REST API server.
///
/// # Environment Variables
/// - `VISTASIM_REST_ADDR`: server address (default: "0.0.0.0:8003")
/// - plus the broker configuration read by `api_rest::broker_from_env`
///
/// # Errors
/// Returns an error if the logging configuration cannot be initialised, the
/// fixture tree fails to load, the address cannot be bound, or the HTTP
/// server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("VISTASIM_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:8003".into());

    tracing::info!("-- Starting RPC broker REST API on {}", addr);

    let broker = api_rest::broker_from_env()?;
    tracing::info!("-- Broker ready: {} sites initialised", broker.site_count());

    let app = api_rest::router(broker);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
