//! Shared harness for API integration tests.
//!
//! Builds the full application router with the production middleware
//! stack (CORS, request ID, timeout, tracing, panic recovery) over a
//! lazily connected pool, so tests that never reach the database can run
//! without one and tests that do reach it observe the store-unavailable
//! path.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use rubric_api::config::ServerConfig;
use rubric_api::routes;
use rubric_api::state::AppState;
use rubric_core::status::OriginTable;
use rubric_core::types::DbId;
use rubric_render::{RenderError, RenderGateway, RenderRequest, RenderState, RenderTicket};

/// Gateway stub that reports every call as a gateway failure.
pub struct UnreachableGateway;

#[async_trait]
impl RenderGateway for UnreachableGateway {
    async fn request_render(&self, _request: &RenderRequest) -> Result<RenderTicket, RenderError> {
        Err(RenderError::Gateway { status: 503, body: "unavailable".into() })
    }

    async fn check_status(
        &self,
        _essay_id: DbId,
        _origin: OriginTable,
    ) -> Result<RenderState, RenderError> {
        Err(RenderError::Gateway { status: 503, body: "unavailable".into() })
    }

    async fn fetch_image(&self, _image_url: &str) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::Gateway { status: 503, body: "unavailable".into() })
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        render_gateway_url: "http://localhost:0".to_string(),
    }
}

/// Build the full application router with all middleware layers.
///
/// The pool connects lazily to a port nothing listens on: handlers that
/// reach the database observe a transient store failure, handlers that
/// validate first never notice.
pub fn build_test_app() -> Router {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(1))
        .connect_lazy("postgres://postgres@127.0.0.1:1/rubric_test")
        .expect("lazy pool creation must not fail");

    let state = AppState {
        pool,
        config: Arc::new(test_config()),
        render: Arc::new(UnreachableGateway),
        shutdown: tokio_util::sync::CancellationToken::new(),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}
