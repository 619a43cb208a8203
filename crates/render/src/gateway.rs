//! The rendering gateway trait and its wire types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use rubric_core::status::{OriginTable, RenderStatus};
use rubric_core::types::DbId;

/// Fields forwarded to the rendering service when requesting a render.
///
/// Handwritten essays never reach the gateway; they carry a pre-existing
/// image reference and are recorded as ready directly.
#[derive(Debug, Clone, Serialize)]
pub struct RenderRequest {
    pub essay_id: DbId,
    pub origin: OriginTable,
    pub text: String,
    pub metadata: serde_json::Value,
}

/// Acknowledgement that a render job was queued.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderTicket {
    /// Gateway-assigned identifier for the queued render.
    pub job_id: String,
}

/// A render status observation.
///
/// Carries the `(essay_id, origin)` it was issued for so callers can
/// discard late responses targeting a no-longer-displayed essay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderState {
    pub essay_id: DbId,
    pub origin: OriginTable,
    pub status: RenderStatus,
    pub image_url: Option<String>,
}

impl RenderState {
    /// Whether this observation belongs to the essay currently displayed.
    pub fn is_for(&self, essay_id: DbId, origin: OriginTable) -> bool {
        self.essay_id == essay_id && self.origin == origin
    }
}

/// Errors from the rendering gateway layer.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway returned a non-2xx status code.
    #[error("Render gateway error ({status}): {body}")]
    Gateway {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The image bytes could not be decoded far enough to read dimensions.
    #[error("Could not read image dimensions: {0}")]
    Probe(String),
}

/// Capability interface over the rendering service.
#[async_trait]
pub trait RenderGateway: Send + Sync {
    /// Queue a render for an essay's text.
    async fn request_render(&self, request: &RenderRequest) -> Result<RenderTicket, RenderError>;

    /// Fetch the current render status for an essay.
    async fn check_status(
        &self,
        essay_id: DbId,
        origin: OriginTable,
    ) -> Result<RenderState, RenderError>;

    /// Download rendered image bytes (used for dimension probing).
    async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>, RenderError>;
}
