//! REST client for the rendering gateway's HTTP endpoints.
//!
//! Wraps the gateway HTTP API (render submission and status retrieval)
//! using [`reqwest`].

use async_trait::async_trait;
use serde::Deserialize;

use rubric_core::status::{OriginTable, RenderStatus};
use rubric_core::types::DbId;

use crate::gateway::{RenderError, RenderGateway, RenderRequest, RenderState, RenderTicket};

/// HTTP client for a rendering gateway instance.
pub struct HttpRenderGateway {
    client: reqwest::Client,
    base_url: String,
}

/// Status payload returned by the gateway's `GET /renders/...` endpoint.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: RenderStatus,
    image_url: Option<String>,
}

impl HttpRenderGateway {
    /// Create a new gateway client.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `http://host:8090`.
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling).
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`RenderError::Gateway`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, RenderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RenderError::Gateway {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RenderError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl RenderGateway for HttpRenderGateway {
    /// Submit essay text for rendering.
    ///
    /// Sends a `POST /renders` request with the essay reference, text,
    /// and metadata. Returns the gateway-assigned job id.
    async fn request_render(&self, request: &RenderRequest) -> Result<RenderTicket, RenderError> {
        let response = self
            .client
            .post(format!("{}/renders", self.base_url))
            .json(request)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the current render status for an essay.
    ///
    /// Sends a `GET /renders/{origin}/{essay_id}` request. The returned
    /// state echoes the requested essay so late responses can be matched
    /// against the currently displayed one.
    async fn check_status(
        &self,
        essay_id: DbId,
        origin: OriginTable,
    ) -> Result<RenderState, RenderError> {
        let response = self
            .client
            .get(format!(
                "{}/renders/{}/{}",
                self.base_url,
                origin.as_str(),
                essay_id
            ))
            .send()
            .await?;

        let status: StatusResponse = Self::parse_response(response).await?;
        Ok(RenderState {
            essay_id,
            origin,
            status: status.status,
            image_url: status.image_url,
        })
    }

    /// Download rendered image bytes.
    async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>, RenderError> {
        let response = self.client.get(image_url).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
