//! Bounded status polling for in-flight renders.
//!
//! Polling stops as soon as the gateway reports a terminal status, the
//! attempt budget runs out, or the caller's [`CancellationToken`] fires.
//! There is no automatic open-ended retry: a render error leaves the
//! essay visibly degraded with a manual retry upstream.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use rubric_core::status::{OriginTable, RenderStatus};
use rubric_core::types::DbId;

use crate::gateway::{RenderError, RenderGateway, RenderState};

/// Tunable parameters for the polling schedule.
pub struct PollConfig {
    /// Delay between consecutive status checks.
    pub interval: Duration,
    /// Maximum number of status checks before giving up.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 30,
        }
    }
}

/// Result of a polling run.
#[derive(Debug)]
pub enum PollOutcome {
    /// The gateway produced an image.
    Ready(RenderState),
    /// The gateway reported a render failure; retry is manual.
    Failed(RenderState),
    /// The attempt budget ran out while the render was still in flight.
    Exhausted(RenderState),
    /// The caller tore the poll down.
    Cancelled,
}

/// Poll the gateway until the render reaches a terminal status.
///
/// Transport errors propagate immediately; the caller decides whether to
/// surface them or re-poll manually.
pub async fn poll_render(
    gateway: &dyn RenderGateway,
    essay_id: DbId,
    origin: OriginTable,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> Result<PollOutcome, RenderError> {
    let mut attempt = 0u32;
    let mut last_state;

    loop {
        attempt += 1;

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(essay_id, origin = %origin, "Render poll cancelled");
                return Ok(PollOutcome::Cancelled);
            }
            state = gateway.check_status(essay_id, origin) => {
                let state = state?;
                tracing::debug!(
                    essay_id,
                    origin = %origin,
                    attempt,
                    status = %state.status,
                    "Render status check",
                );
                match state.status {
                    RenderStatus::Ready => return Ok(PollOutcome::Ready(state)),
                    RenderStatus::Error => {
                        tracing::warn!(essay_id, origin = %origin, "Render failed at the gateway");
                        return Ok(PollOutcome::Failed(state));
                    }
                    RenderStatus::Pending | RenderStatus::Rendering => last_state = state,
                }
            }
        }

        if attempt >= config.max_attempts {
            tracing::warn!(
                essay_id,
                origin = %origin,
                attempts = attempt,
                "Render poll budget exhausted",
            );
            return Ok(PollOutcome::Exhausted(last_state));
        }

        // Wait before the next attempt, respecting cancellation.
        tokio::select! {
            _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
            _ = tokio::time::sleep(config.interval) => {}
        }
    }
}
