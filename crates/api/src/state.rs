use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use rubric_render::RenderGateway;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: rubric_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Client for the external essay rendering gateway.
    pub render: Arc<dyn RenderGateway>,
    /// Master cancellation token -- cancelled during shutdown. Background
    /// render polls are children of this token.
    pub shutdown: CancellationToken,
}
