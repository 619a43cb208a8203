//! Capability interface over the embeddable region-drawing surface.
//!
//! The real surface creates its internal nodes asynchronously and
//! without a public "rendering complete" event. The engine therefore
//! never inspects surface internals: it applies shapes, observes the
//! gesture events the surface emits, and watches a monotonic revision
//! signal that moves whenever the surface re-renders its region nodes
//! (including late and repeated re-renders).

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};

use rubric_core::competency::Competency;
use rubric_core::geometry::PercentRect;

/// A region shape in the surface's percent coordinate space.
///
/// Persisted shapes use the annotation id as their surface id; freshly
/// drawn shapes carry a temporary surface-assigned id until the capture
/// flow persists or discards them.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub id: String,
    pub rect: PercentRect,
    /// Determines the region's display color.
    pub competency: Competency,
}

/// Observed state of a shape currently rendered by the surface.
#[derive(Debug, Clone)]
pub struct ShapeState {
    pub id: String,
    /// Sequence badge currently attached, if any.
    pub badge: Option<i32>,
}

/// Gesture events emitted by the surface.
#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    /// The user finished drawing a region. `selector` is the surface's
    /// native media-fragment selector for the region.
    ShapeDrawn { shape_id: String, selector: String },
    /// The user clicked an existing region.
    ShapeClicked { shape_id: String },
}

/// Errors surfaced by the drawing layer.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("Surface rejected shape batch: {0}")]
    BatchRejected(String),

    #[error("Surface rejected shape {shape_id}: {reason}")]
    ShapeRejected { shape_id: String, reason: String },

    #[error("Unknown shape: {0}")]
    UnknownShape(String),
}

/// The drawing surface, reduced to the capabilities the engine needs.
#[async_trait]
pub trait OverlaySurface: Send + Sync {
    /// Replace all rendered shapes in a single batch call.
    async fn apply_shapes(&self, shapes: &[Shape]) -> Result<(), SurfaceError>;

    /// Add one shape, leaving the others untouched.
    async fn add_shape(&self, shape: &Shape) -> Result<(), SurfaceError>;

    /// Remove one shape and any badge attached to it.
    async fn remove_shape(&self, shape_id: &str) -> Result<(), SurfaceError>;

    /// Remove every shape. Badges injected by the engine are separate
    /// artifacts and must be stripped via [`Self::clear_badges`].
    async fn clear(&self) -> Result<(), SurfaceError>;

    /// Current shapes with their badge status, in render order.
    async fn shape_states(&self) -> Vec<ShapeState>;

    /// Attach a sequence badge to a shape.
    async fn set_badge(&self, shape_id: &str, number: i32) -> Result<(), SurfaceError>;

    /// Strip every badge the engine has injected.
    async fn clear_badges(&self);

    /// Subscribe to gesture events.
    fn subscribe(&self) -> broadcast::Receiver<SurfaceEvent>;

    /// Revision signal: bumps whenever the surface re-renders its
    /// region nodes.
    fn shapes_changed(&self) -> watch::Receiver<u64>;
}
