//! Overlay reconciliation engine.
//!
//! Keeps a numbered, competency-colored badge glued to every markup
//! region drawn over the rendered essay image, even though the drawing
//! surface renders its nodes asynchronously and outside our control.
//! The surface is opaque behind [`surface::OverlaySurface`]; persisted
//! state is only ever touched through [`store::AnnotationStore`].

pub mod numbering;
pub mod selector;
pub mod session;
pub mod store;
pub mod surface;

pub use session::{ImageInfo, OverlaySession, RegionClick, SessionError, SessionSignal, SurfaceMode};
pub use store::{AnnotationStore, PgAnnotationStore};
pub use surface::{OverlaySurface, Shape, ShapeState, SurfaceEvent, SurfaceError};
