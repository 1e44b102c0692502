//! # API REST
//!
//! REST surface for the RPC broker simulator.
//!
//! Handles:
//! - HTTP endpoints with axum (`/rpc/execute`, `/sites`, `/health`, `/`)
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS)
//!
//! Uses `api-shared` for the transport models and `vistasim-core` for the
//! broker itself. The broker is built once and shared read-only across all
//! request handlers.

#![warn(rust_2018_idioms)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{
    BannerRes, ErrorDetail, HealthRes, HealthService, RpcExecuteReq, RpcExecuteRes, SiteInfo,
};
use vistasim_core::{Broker, BrokerConfig, LatencyWindow};

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    broker: Arc<Broker>,
}

#[derive(OpenApi)]
#[openapi(
    paths(root, health, list_sites, execute_rpc),
    components(schemas(
        BannerRes,
        HealthRes,
        SiteInfo,
        RpcExecuteReq,
        RpcExecuteRes,
        ErrorDetail,
    ))
)]
struct ApiDoc;

/// Build the REST router around a broker instance.
pub fn router(broker: Arc<Broker>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/sites", get(list_sites))
        .route("/rpc/execute", post(execute_rpc))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(AppState { broker })
}

/// Build a broker from environment configuration.
///
/// # Environment Variables
/// - `VISTASIM_FIXTURE_DIR`: fixture directory (default: locate `fixtures/`
///   from the working directory or the workspace root)
/// - `VISTASIM_LATENCY`: `"0"` disables the simulated latency (default on)
/// - `VISTASIM_LATENCY_MIN_MS` / `VISTASIM_LATENCY_MAX_MS`: latency window
///   in milliseconds (defaults 1000 and 3000, matching the legacy feel)
pub fn broker_from_env() -> anyhow::Result<Arc<Broker>> {
    let fixture_override = std::env::var("VISTASIM_FIXTURE_DIR")
        .ok()
        .map(PathBuf::from);
    let fixture_dir = vistasim_core::resolve_fixture_dir(fixture_override)?;

    let latency_enabled = std::env::var("VISTASIM_LATENCY")
        .map(|value| value != "0")
        .unwrap_or(true);
    let latency = if latency_enabled {
        let min_ms = env_millis("VISTASIM_LATENCY_MIN_MS", 1_000)?;
        let max_ms = env_millis("VISTASIM_LATENCY_MAX_MS", 3_000)?;
        Some(LatencyWindow::new(min_ms, max_ms)?)
    } else {
        None
    };

    let config = BrokerConfig::new(fixture_dir, latency)?;
    let broker = Broker::initialise(&config)?;
    Ok(Arc::new(broker))
}

fn env_millis(name: &str, default: u64) -> anyhow::Result<u64> {
    match std::env::var(name) {
        Ok(value) => value
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("{name} must be an integer number of milliseconds")),
        Err(_) => Ok(default),
    }
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service banner", body = BannerRes)
    )
)]
/// Root endpoint — service information and endpoint map.
async fn root(State(state): State<AppState>) -> Json<BannerRes> {
    let mut endpoints = BTreeMap::new();
    endpoints.insert(
        "rpc_execute".to_owned(),
        "POST /rpc/execute?site={sta3n}".to_owned(),
    );
    endpoints.insert("sites".to_owned(), "GET /sites".to_owned());
    endpoints.insert("health".to_owned(), "GET /health".to_owned());
    endpoints.insert("docs".to_owned(), "GET /swagger-ui".to_owned());

    Json(BannerRes {
        service: "RPC Broker Simulator".to_owned(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
        status: "running".to_owned(),
        sites: state.broker.site_count(),
        endpoints,
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint, used for monitoring and load-balancer checks.
async fn health(State(state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health(state.broker.sta3ns()))
}

#[utoipa::path(
    get,
    path = "/sites",
    responses(
        (status = 200, description = "List of available sites", body = [SiteInfo])
    )
)]
/// List every initialised site with its RPC and patient counts.
async fn list_sites(State(state): State<AppState>) -> Json<Vec<SiteInfo>> {
    let sites = state
        .broker
        .site_summaries()
        .into_iter()
        .map(|summary| SiteInfo {
            sta3n: summary.sta3n,
            name: summary.name,
            rpcs_registered: summary.rpcs_registered,
            patients_registered: summary.patients_registered,
        })
        .collect();
    Json(sites)
}

#[derive(Debug, Deserialize)]
struct SiteQuery {
    /// Site station number (e.g. `"200"`).
    site: String,
}

#[utoipa::path(
    post,
    path = "/rpc/execute",
    params(
        ("site" = String, Query, description = "Site station number (e.g. '200')")
    ),
    request_body = RpcExecuteReq,
    responses(
        (status = 200, description = "RPC execution result", body = RpcExecuteRes),
        (status = 404, description = "Unknown site", body = ErrorDetail)
    )
)]
/// Execute an RPC at a specific site.
///
/// A dispatch failure (unknown RPC, bad parameters, handler fault) is a 200
/// with `success=false`; only an unknown site is an HTTP-level 404.
async fn execute_rpc(
    State(state): State<AppState>,
    Query(query): Query<SiteQuery>,
    Json(request): Json<RpcExecuteReq>,
) -> Result<Json<RpcExecuteRes>, (StatusCode, Json<ErrorDetail>)> {
    match state
        .broker
        .execute(&query.site, &request.name, &request.params)
        .await
    {
        Ok(outcome) => Ok(Json(RpcExecuteRes {
            success: outcome.success,
            response: outcome.response,
            error: outcome.error,
            site: outcome.site,
            rpc: outcome.rpc,
        })),
        Err(err) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorDetail {
                detail: err.to_string(),
            }),
        )),
    }
}
