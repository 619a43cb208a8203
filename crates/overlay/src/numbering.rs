//! Badge reconciliation decorator.
//!
//! The surface renders its region nodes asynchronously, so a badge
//! applied right after a repopulation may land on nodes that are about
//! to be replaced. The decorator re-applies the badge plan until the
//! rendered state matches: once immediately, then on a short fixed
//! schedule, then on every movement of the surface's revision signal.
//! Application is idempotent -- an already-badged shape is skipped, so
//! badges never stack.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::surface::OverlaySurface;

/// Mapping from surface shape id to the sequence number it must display.
/// Shared between the session (which owns the plan) and the decorator
/// task (which applies it).
pub type BadgePlan = Arc<RwLock<HashMap<String, i32>>>;

/// Tunable parameters for the reconciliation schedule.
pub struct NumberingConfig {
    /// Closely spaced re-attempts after the initial application, to
    /// absorb the surface's asynchronous layout.
    pub retry_delays: Vec<Duration>,
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            retry_delays: vec![
                Duration::from_millis(50),
                Duration::from_millis(150),
                Duration::from_millis(400),
            ],
        }
    }
}

/// Apply the badge plan to every currently rendered, unbadged shape.
///
/// Returns the number of badges applied. Individual failures are logged
/// and skipped; one stubborn shape must not block the others.
pub async fn apply_badges(surface: &dyn OverlaySurface, plan: &BadgePlan) -> usize {
    let plan = plan.read().await;
    if plan.is_empty() {
        return 0;
    }

    let mut applied = 0;
    for state in surface.shape_states().await {
        if state.badge.is_some() {
            // Already numbered; never stack a second badge.
            continue;
        }
        let Some(&number) = plan.get(&state.id) else {
            continue;
        };
        match surface.set_badge(&state.id, number).await {
            Ok(()) => applied += 1,
            Err(e) => {
                tracing::warn!(shape_id = %state.id, error = %e, "Failed to apply badge");
            }
        }
    }

    if applied > 0 {
        tracing::debug!(applied, "Applied sequence badges");
    }
    applied
}

/// Spawn the reconciliation task for a surface.
///
/// Runs until `cancel` fires or the surface drops its revision channel.
/// Must be torn down when the surface is destroyed or the essay changes,
/// so numbering work never leaks onto a stale image.
pub fn spawn(
    surface: Arc<dyn OverlaySurface>,
    plan: BadgePlan,
    config: NumberingConfig,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut revision = surface.shapes_changed();
        // Consider the current revision seen; only future re-renders
        // should trigger extra passes beyond the fixed schedule.
        let _ = revision.borrow_and_update();

        apply_badges(surface.as_ref(), &plan).await;

        for delay in &config.retry_delays {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(*delay) => {}
            }
            apply_badges(surface.as_ref(), &plan).await;
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                changed = revision.changed() => {
                    if changed.is_err() {
                        // Surface gone; nothing left to reconcile.
                        return;
                    }
                    apply_badges(surface.as_ref(), &plan).await;
                }
            }
        }
    })
}
