use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the RPC broker simulator.
///
/// Builds every site runtime from the fixture tree, then serves the REST API
/// on the configured address (default: 0.0.0.0:8003).
///
/// # Environment Variables
/// - `VISTASIM_REST_ADDR`: server address (default: "0.0.0.0:8003")
/// - `VISTASIM_FIXTURE_DIR`: fixture directory (default: locate `fixtures/`)
/// - `VISTASIM_LATENCY`, `VISTASIM_LATENCY_MIN_MS`, `VISTASIM_LATENCY_MAX_MS`:
///   simulated per-request latency controls
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vistasim=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("VISTASIM_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:8003".into());

    tracing::info!("++ Starting RPC broker simulator on {}", addr);

    let broker = api_rest::broker_from_env()?;
    tracing::info!(
        "++ Broker ready: {} sites, {:?}",
        broker.site_count(),
        broker.sta3ns()
    );

    let app = api_rest::router(broker);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
