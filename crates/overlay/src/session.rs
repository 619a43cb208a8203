//! The overlay session: one corrector, one essay, one drawing surface.
//!
//! Owns the load -> convert -> apply -> number protocol, the draw-region
//! capture flow, region-click handling per mode, and the bulk wipe. The
//! session is the single writer of surface state; persisted state is
//! only reached through the [`AnnotationStore`] contract.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use rubric_core::annotation::{validate_annotation, validate_comment};
use rubric_core::competency::Competency;
use rubric_core::error::CoreError;
use rubric_core::geometry::{to_percent_rect, validate_dimensions, PixelRect};
use rubric_core::status::OriginTable;
use rubric_core::types::DbId;
use rubric_db::error::PersistenceError;
use rubric_db::models::annotation::{Annotation, CreateAnnotation};

use crate::numbering::{self, BadgePlan, NumberingConfig};
use crate::selector::parse_selector;
use crate::store::AnnotationStore;
use crate::surface::{OverlaySurface, Shape, SurfaceEvent};

/// Mutually exclusive capability sets for the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceMode {
    /// Accepts new-region gestures and region-click deletion.
    Edit,
    /// Only displays existing regions and shows comments on click.
    ReadOnly,
}

/// Natural dimensions of the rendered essay image. Known before the
/// session starts; read-only shared state for every conversion.
#[derive(Debug, Clone, Copy)]
pub struct ImageInfo {
    pub width: i32,
    pub height: i32,
}

/// Outcome of a region click, interpreted per mode.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionClick {
    /// Edit mode: the caller must confirm before calling
    /// [`OverlaySession::confirm_delete`].
    DeleteRequested { annotation_id: DbId },
    /// Read-only mode: display data, no mutation.
    View { competency: Competency, comment: String },
}

/// Signal produced by [`OverlaySession::handle_event`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionSignal {
    /// A drawn region is awaiting its comment.
    CaptureStarted,
    Click(RegionClick),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("The surface is read-only")]
    ReadOnly,

    #[error("No region capture in progress")]
    NoPendingCapture,

    #[error("Shape {0} is not a persisted annotation")]
    UnknownShape(String),
}

/// A drawn region waiting for its comment.
struct PendingCapture {
    shape_id: String,
    rect: PixelRect,
}

pub struct OverlaySession {
    surface: Arc<dyn OverlaySurface>,
    store: Arc<dyn AnnotationStore>,
    essay_id: DbId,
    origin: OriginTable,
    corrector_id: DbId,
    image: ImageInfo,
    mode: SurfaceMode,
    /// Applied to the next drawn region, never retroactively.
    active_competency: Competency,
    /// Local cache of "next number to assign", refreshed from the
    /// store's observed maximum on every successful load.
    sequence_counter: i32,
    /// Pure presentation; does not affect data.
    fullscreen: bool,
    pending: Option<PendingCapture>,
    annotations: HashMap<DbId, Annotation>,
    badge_plan: BadgePlan,
    numbering_cancel: CancellationToken,
    numbering_task: Option<tokio::task::JoinHandle<()>>,
}

impl OverlaySession {
    /// Initialize the surface for an essay whose natural image
    /// dimensions are known, populate it from the store, and spawn the
    /// numbering decorator.
    pub async fn start(
        surface: Arc<dyn OverlaySurface>,
        store: Arc<dyn AnnotationStore>,
        essay_id: DbId,
        origin: OriginTable,
        corrector_id: DbId,
        image: ImageInfo,
        mode: SurfaceMode,
    ) -> Result<Self, SessionError> {
        validate_dimensions(image.width, image.height)?;

        let mut session = Self {
            surface,
            store,
            essay_id,
            origin,
            corrector_id,
            image,
            mode,
            active_competency: Competency::C1,
            sequence_counter: 1,
            fullscreen: false,
            pending: None,
            annotations: HashMap::new(),
            badge_plan: BadgePlan::default(),
            numbering_cancel: CancellationToken::new(),
            numbering_task: None,
        };

        session.reload().await?;

        session.numbering_task = Some(numbering::spawn(
            Arc::clone(&session.surface),
            Arc::clone(&session.badge_plan),
            NumberingConfig::default(),
            session.numbering_cancel.clone(),
        ));

        tracing::info!(
            essay_id,
            origin = %origin,
            corrector_id,
            mode = ?mode,
            "Overlay session started"
        );
        Ok(session)
    }

    /// Load annotations from the store and rebuild the surface.
    ///
    /// Shapes are applied as one batch when possible; if the batch call
    /// fails, each shape is added individually and failures are logged
    /// one by one -- a failure on one shape must not block the others.
    pub async fn reload(&mut self) -> Result<usize, SessionError> {
        let annotations = self
            .retry_once(|| self.store.list(self.essay_id, self.origin))
            .await?;

        let mut shapes = Vec::with_capacity(annotations.len());
        {
            let mut plan = self.badge_plan.write().await;
            plan.clear();
            self.annotations.clear();
            for annotation in &annotations {
                // Percent coordinates come from the dimensions captured
                // with the rectangle, not from the current display.
                let rect = to_percent_rect(
                    &annotation.rect(),
                    annotation.image_width,
                    annotation.image_height,
                )?;
                let shape = Shape {
                    id: annotation.id.to_string(),
                    rect,
                    competency: Competency::from_id(annotation.competency)?,
                };
                plan.insert(shape.id.clone(), annotation.sequence_number);
                shapes.push(shape);
                self.annotations.insert(annotation.id, annotation.clone());
            }
        }

        if let Err(e) = self.surface.apply_shapes(&shapes).await {
            tracing::warn!(
                essay_id = self.essay_id,
                error = %e,
                "Batch shape application failed, falling back to one at a time"
            );
            for shape in &shapes {
                if let Err(e) = self.surface.add_shape(shape).await {
                    tracing::warn!(
                        essay_id = self.essay_id,
                        shape_id = %shape.id,
                        error = %e,
                        "Shape could not be applied"
                    );
                }
            }
        }

        self.sequence_counter = annotations
            .iter()
            .map(|a| a.sequence_number)
            .max()
            .unwrap_or(0)
            + 1;

        // First numbering attempt; the decorator keeps re-applying.
        numbering::apply_badges(self.surface.as_ref(), &self.badge_plan).await;

        Ok(annotations.len())
    }

    /// Route a surface gesture event to the right flow.
    pub async fn handle_event(&mut self, event: SurfaceEvent) -> Result<SessionSignal, SessionError> {
        match event {
            SurfaceEvent::ShapeDrawn { shape_id, selector } => {
                self.shape_drawn(shape_id, &selector).await?;
                Ok(SessionSignal::CaptureStarted)
            }
            SurfaceEvent::ShapeClicked { shape_id } => {
                Ok(SessionSignal::Click(self.shape_clicked(&shape_id).await?))
            }
        }
    }

    /// A region was drawn on the surface (edit mode only).
    ///
    /// Parses and validates the region, then opens the capture flow. An
    /// invalid region removes the drawn shape immediately so no orphan
    /// survives on the surface.
    pub async fn shape_drawn(&mut self, shape_id: String, selector: &str) -> Result<(), SessionError> {
        if self.mode != SurfaceMode::Edit {
            let _ = self.surface.remove_shape(&shape_id).await;
            return Err(SessionError::ReadOnly);
        }

        // A new drawing replaces any capture still waiting for a comment.
        if self.pending.is_some() {
            self.cancel_capture().await?;
        }

        let rect = match self.parse_drawn_region(selector) {
            Ok(rect) => rect,
            Err(e) => {
                let _ = self.surface.remove_shape(&shape_id).await;
                return Err(e.into());
            }
        };

        self.pending = Some(PendingCapture { shape_id, rect });
        Ok(())
    }

    /// Complete the capture flow with the corrector's comment.
    ///
    /// The competency is the current tool selection, not re-asked. An
    /// empty comment blocks submission locally (the drawn shape stays,
    /// awaiting a comment or an explicit cancel). A persistence failure
    /// after one transient retry removes the shape -- a failed creation
    /// must not leave a phantom region on the surface.
    pub async fn submit_capture(&mut self, comment: &str) -> Result<Annotation, SessionError> {
        let pending = self.pending.as_ref().ok_or(SessionError::NoPendingCapture)?;

        validate_comment(comment)?;
        validate_annotation(
            self.active_competency.id(),
            comment,
            &pending.rect,
            self.image.width,
            self.image.height,
        )?;

        let input = CreateAnnotation {
            corrector_id: self.corrector_id,
            competency: self.active_competency.id(),
            comment: comment.trim().to_string(),
            x_start: pending.rect.x,
            y_start: pending.rect.y,
            x_end: pending.rect.x_end(),
            y_end: pending.rect.y_end(),
            image_width: self.image.width,
            image_height: self.image.height,
        };

        // Past validation: the capture is consumed whether the store
        // accepts it or not.
        let Some(pending) = self.pending.take() else {
            return Err(SessionError::NoPendingCapture);
        };

        let created = match self
            .retry_once(|| self.store.create(self.essay_id, self.origin, &input))
            .await
        {
            Ok(created) => created,
            Err(e) => {
                let _ = self.surface.remove_shape(&pending.shape_id).await;
                tracing::warn!(
                    essay_id = self.essay_id,
                    error = %e,
                    "Annotation creation failed, drawn shape discarded"
                );
                return Err(e.into());
            }
        };

        // Swap the temporary drawn shape for the persisted one.
        let _ = self.surface.remove_shape(&pending.shape_id).await;

        let shape = Shape {
            id: created.id.to_string(),
            rect: to_percent_rect(&created.rect(), created.image_width, created.image_height)?,
            competency: self.active_competency,
        };
        if let Err(e) = self.surface.add_shape(&shape).await {
            tracing::warn!(shape_id = %shape.id, error = %e, "Persisted shape could not be applied");
        }

        self.badge_plan
            .write()
            .await
            .insert(shape.id, created.sequence_number);
        numbering::apply_badges(self.surface.as_ref(), &self.badge_plan).await;

        self.sequence_counter = created.sequence_number + 1;
        self.annotations.insert(created.id, created.clone());

        tracing::info!(
            essay_id = self.essay_id,
            annotation_id = created.id,
            sequence_number = created.sequence_number,
            competency = created.competency,
            "Annotation created"
        );
        Ok(created)
    }

    /// Abandon the capture flow, discarding the drawn shape entirely.
    pub async fn cancel_capture(&mut self) -> Result<(), SessionError> {
        if let Some(pending) = self.pending.take() {
            let _ = self.surface.remove_shape(&pending.shape_id).await;
        }
        Ok(())
    }

    /// Interpret a click on an existing region.
    pub async fn shape_clicked(&mut self, shape_id: &str) -> Result<RegionClick, SessionError> {
        let annotation_id: DbId = shape_id
            .parse()
            .map_err(|_| SessionError::UnknownShape(shape_id.to_string()))?;
        let annotation = self
            .annotations
            .get(&annotation_id)
            .ok_or_else(|| SessionError::UnknownShape(shape_id.to_string()))?;

        match self.mode {
            SurfaceMode::Edit => Ok(RegionClick::DeleteRequested { annotation_id }),
            SurfaceMode::ReadOnly => Ok(RegionClick::View {
                competency: Competency::from_id(annotation.competency)?,
                comment: annotation.comment.clone(),
            }),
        }
    }

    /// Delete an annotation after upstream confirmation.
    ///
    /// Remaining annotations keep their numbers; deletion never
    /// renumbers.
    pub async fn confirm_delete(&mut self, annotation_id: DbId) -> Result<(), SessionError> {
        if self.mode != SurfaceMode::Edit {
            return Err(SessionError::ReadOnly);
        }

        let deleted = self
            .retry_once(|| self.store.delete(annotation_id))
            .await?;
        if !deleted {
            return Err(CoreError::NotFound { entity: "Annotation", id: annotation_id }.into());
        }

        let shape_id = annotation_id.to_string();
        let _ = self.surface.remove_shape(&shape_id).await;
        self.badge_plan.write().await.remove(&shape_id);
        self.annotations.remove(&annotation_id);

        tracing::info!(
            essay_id = self.essay_id,
            annotation_id,
            "Annotation deleted"
        );
        Ok(())
    }

    /// Bulk wipe for the essay. Destructive; confirmation is upstream.
    ///
    /// Strips the engine's injected badges before clearing the surface,
    /// so no ghost badge survives a subsequent repopulation.
    pub async fn clear_all(&mut self) -> Result<u64, SessionError> {
        self.surface.clear_badges().await;
        self.badge_plan.write().await.clear();

        let removed = self
            .retry_once(|| self.store.clear_all(self.essay_id, self.origin))
            .await?;

        if let Err(e) = self.surface.clear().await {
            tracing::warn!(essay_id = self.essay_id, error = %e, "Surface clear failed");
        }

        self.annotations.clear();
        self.sequence_counter = 1;
        self.pending = None;

        tracing::info!(essay_id = self.essay_id, removed, "All annotations cleared");
        Ok(removed)
    }

    /// Select the competency applied to the next drawn region.
    pub fn set_active_competency(&mut self, competency: Competency) {
        self.active_competency = competency;
    }

    /// Toggle the fullscreen/compact display state. Presentation only.
    pub fn toggle_fullscreen(&mut self) -> bool {
        self.fullscreen = !self.fullscreen;
        self.fullscreen
    }

    pub fn mode(&self) -> SurfaceMode {
        self.mode
    }

    pub fn active_competency(&self) -> Competency {
        self.active_competency
    }

    /// Next sequence number the session expects the store to assign.
    pub fn next_sequence(&self) -> i32 {
        self.sequence_counter
    }

    pub fn has_pending_capture(&self) -> bool {
        self.pending.is_some()
    }

    pub fn annotation_count(&self) -> usize {
        self.annotations.len()
    }

    /// Tear the session down: stop the numbering decorator so no
    /// reconciliation work leaks onto a stale image.
    pub async fn shutdown(mut self) {
        self.numbering_cancel.cancel();
        if let Some(task) = self.numbering_task.take() {
            let _ = tokio::time::timeout(Duration::from_secs(1), task).await;
        }
        tracing::info!(essay_id = self.essay_id, "Overlay session shut down");
    }

    /// Parse a drawn selector into a pixel rectangle fully contained in
    /// the image.
    fn parse_drawn_region(&self, selector: &str) -> Result<PixelRect, CoreError> {
        let rect = parse_selector(selector, self.image.width, self.image.height)?;
        if rect.x_end() > self.image.width || rect.y_end() > self.image.height {
            return Err(CoreError::InvalidRegion(format!(
                "rectangle exceeds image bounds {}x{}",
                self.image.width, self.image.height
            )));
        }
        Ok(rect)
    }

    /// Run a store operation, retrying at most once on a transient
    /// failure. Validation failures are never retried.
    async fn retry_once<T, F, Fut>(&self, op: F) -> Result<T, PersistenceError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, PersistenceError>>,
    {
        match op().await {
            Err(e) if e.is_transient() => {
                tracing::warn!(
                    essay_id = self.essay_id,
                    error = %e,
                    "Transient store failure, retrying once"
                );
                op().await
            }
            other => other,
        }
    }
}
