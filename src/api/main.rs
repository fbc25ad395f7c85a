//! HTTP server for the scene metadata search API.
//!
//! Exposes `GET /<index>` for scene searches and `GET /healthcheck` for
//! engine cluster status.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use landsat_api::elasticsearch::EsClient;
use landsat_api::search::{self, SearchContext};
use landsat_api::{ApiError, Config};

#[derive(Parser, Debug)]
#[command(name = "api")]
#[command(about = "Scene metadata search API server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8000")]
    listen: String,

    /// Elasticsearch URL
    #[arg(long, default_value = "http://localhost:9200")]
    es_url: String,

    /// Elasticsearch index name, also served as the resource route
    #[arg(long, default_value = "landsat")]
    index: String,

    /// Value reported in the Server response header
    #[arg(long, default_value = "api.developmentseed.org")]
    server_header: String,

    /// Page size applied when the caller omits `limit`
    #[arg(long, default_value_t = 1)]
    default_limit: u64,

    /// Internal result ceiling while a containment filter is active
    #[arg(long, default_value_t = 1_000_000_000)]
    query_limit: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Scene metadata API");
    info!("Connecting to Elasticsearch at {}", args.es_url);

    let es = EsClient::new(&args.es_url, &args.index).await?;

    let config = Config {
        default_limit: args.default_limit,
        containment_limit: args.query_limit,
        ..Config::default()
    };

    let state = Arc::new(SearchContext { es, config });

    let app = Router::new()
        .route(&format!("/{}", args.index), get(scene_handler))
        .route("/healthcheck", get(healthcheck_handler))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=60"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::SERVER,
            HeaderValue::from_str(&args.server_header)?,
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'none'"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("deny"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Scene search endpoint.
async fn scene_handler(
    State(ctx): State<Arc<SearchContext>>,
    Query(raw_params): Query<HashMap<String, String>>,
) -> Response {
    match search::execute(&ctx, &raw_params).await {
        Ok(response) => pretty_json(StatusCode::OK, &response),
        Err(err) => error_response(err),
    }
}

/// Engine cluster health probe.
async fn healthcheck_handler(State(ctx): State<Arc<SearchContext>>) -> Response {
    match ctx.es.cluster_health().await {
        Ok(health) => {
            let health_json = serde_json::to_string_pretty(&health).unwrap_or_default();
            if health["status"] == "red" {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("NAK.\nStatus: {}\n", health_json),
                )
                    .into_response()
            } else {
                (StatusCode::OK, format!("OK\n\n{}\n", health_json)).into_response()
            }
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("NAK.\n{}\n", err),
        )
            .into_response(),
    }
}

/// Convert a pipeline error into the public envelope.
///
/// Engine failures are logged in full and served with a generic message.
fn error_response(err: ApiError) -> Response {
    let status =
        StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!("engine failure: {}", err);
    }

    let body = json!({
        "error": {
            "code": err.code(),
            "message": err.public_message(),
        }
    });

    pretty_json(status, &body)
}

/// Serialize a response body as 2-space indented JSON.
fn pretty_json<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_string_pretty(body) {
        Ok(text) => (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            text,
        )
            .into_response(),
        Err(err) => {
            error!("response serialization failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
