//! Shared harness for overlay engine tests: an in-memory drawing
//! surface and annotation store, both with failure injection.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, watch};

use rubric_core::competency::Competency;
use rubric_core::geometry::PercentRect;
use rubric_core::status::OriginTable;
use rubric_core::types::DbId;
use rubric_db::error::PersistenceError;
use rubric_db::models::annotation::{Annotation, CreateAnnotation};
use rubric_overlay::store::AnnotationStore;
use rubric_overlay::surface::{OverlaySurface, Shape, ShapeState, SurfaceError, SurfaceEvent};

/* --------------------------------------------------------------------------
   MockSurface
   -------------------------------------------------------------------------- */

#[derive(Default)]
struct SurfaceInner {
    shapes: Vec<Shape>,
    /// Badges are engine-injected artifacts tracked separately from the
    /// shapes themselves, like DOM badge nodes next to region nodes.
    /// `clear()` removes shapes but leaves these behind unless
    /// `clear_badges()` strips them.
    badges: HashMap<String, i32>,
    fail_batch: bool,
    fail_shape_ids: HashSet<String>,
}

pub struct MockSurface {
    inner: StdMutex<SurfaceInner>,
    event_tx: broadcast::Sender<SurfaceEvent>,
    revision_tx: watch::Sender<u64>,
    revision: StdMutex<u64>,
}

impl Default for MockSurface {
    fn default() -> Self {
        let (event_tx, _) = broadcast::channel(32);
        let (revision_tx, _) = watch::channel(0);
        Self {
            inner: StdMutex::new(SurfaceInner::default()),
            event_tx,
            revision_tx,
            revision: StdMutex::new(0),
        }
    }
}

impl MockSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump_revision(&self) {
        let mut revision = self.revision.lock().unwrap();
        *revision += 1;
        let _ = self.revision_tx.send(*revision);
    }

    /// Make the next `apply_shapes` batch call fail.
    pub fn fail_batch(&self) {
        self.inner.lock().unwrap().fail_batch = true;
    }

    /// Make any `add_shape` of this id fail.
    pub fn fail_shape(&self, shape_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_shape_ids
            .insert(shape_id.to_string());
    }

    /// Simulate an asynchronous surface re-render: region nodes are
    /// recreated, so previously injected badges are gone.
    pub fn rerender(&self) {
        self.inner.lock().unwrap().badges.clear();
        self.bump_revision();
    }

    /// Simulate the user drawing a region: the surface creates the node
    /// itself, then emits the gesture event.
    pub fn draw(&self, shape_id: &str, selector: &str) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.shapes.push(Shape {
                id: shape_id.to_string(),
                rect: PercentRect { x: 0.0, y: 0.0, width: 1.0, height: 1.0 },
                competency: Competency::C1,
            });
        }
        self.bump_revision();
        let _ = self.event_tx.send(SurfaceEvent::ShapeDrawn {
            shape_id: shape_id.to_string(),
            selector: selector.to_string(),
        });
    }

    pub fn shape_count(&self) -> usize {
        self.inner.lock().unwrap().shapes.len()
    }

    pub fn shape(&self, shape_id: &str) -> Option<Shape> {
        self.inner
            .lock()
            .unwrap()
            .shapes
            .iter()
            .find(|s| s.id == shape_id)
            .cloned()
    }

    pub fn badge_of(&self, shape_id: &str) -> Option<i32> {
        self.inner.lock().unwrap().badges.get(shape_id).copied()
    }

    pub fn badge_count(&self) -> usize {
        self.inner.lock().unwrap().badges.len()
    }
}

#[async_trait]
impl OverlaySurface for MockSurface {
    async fn apply_shapes(&self, shapes: &[Shape]) -> Result<(), SurfaceError> {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.fail_batch {
                inner.fail_batch = false;
                return Err(SurfaceError::BatchRejected("injected batch failure".into()));
            }
            inner.shapes = shapes.to_vec();
        }
        self.bump_revision();
        Ok(())
    }

    async fn add_shape(&self, shape: &Shape) -> Result<(), SurfaceError> {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.fail_shape_ids.contains(&shape.id) {
                return Err(SurfaceError::ShapeRejected {
                    shape_id: shape.id.clone(),
                    reason: "injected shape failure".into(),
                });
            }
            inner.shapes.push(shape.clone());
        }
        self.bump_revision();
        Ok(())
    }

    async fn remove_shape(&self, shape_id: &str) -> Result<(), SurfaceError> {
        {
            let mut inner = self.inner.lock().unwrap();
            let before = inner.shapes.len();
            inner.shapes.retain(|s| s.id != shape_id);
            if inner.shapes.len() == before {
                return Err(SurfaceError::UnknownShape(shape_id.to_string()));
            }
            inner.badges.remove(shape_id);
        }
        self.bump_revision();
        Ok(())
    }

    async fn clear(&self) -> Result<(), SurfaceError> {
        self.inner.lock().unwrap().shapes.clear();
        self.bump_revision();
        Ok(())
    }

    async fn shape_states(&self) -> Vec<ShapeState> {
        let inner = self.inner.lock().unwrap();
        inner
            .shapes
            .iter()
            .map(|s| ShapeState {
                id: s.id.clone(),
                badge: inner.badges.get(&s.id).copied(),
            })
            .collect()
    }

    async fn set_badge(&self, shape_id: &str, number: i32) -> Result<(), SurfaceError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.shapes.iter().any(|s| s.id == shape_id) {
            return Err(SurfaceError::UnknownShape(shape_id.to_string()));
        }
        inner.badges.insert(shape_id.to_string(), number);
        Ok(())
    }

    async fn clear_badges(&self) {
        self.inner.lock().unwrap().badges.clear();
    }

    fn subscribe(&self) -> broadcast::Receiver<SurfaceEvent> {
        self.event_tx.subscribe()
    }

    fn shapes_changed(&self) -> watch::Receiver<u64> {
        self.revision_tx.subscribe()
    }
}

/* --------------------------------------------------------------------------
   MemoryStore
   -------------------------------------------------------------------------- */

#[derive(Default)]
struct StoreInner {
    annotations: Vec<Annotation>,
    next_id: DbId,
    counters: HashMap<(DbId, i16), i32>,
    /// Number of upcoming operations that fail transiently.
    transient_failures: u32,
}

/// In-memory [`AnnotationStore`] mirroring the Postgres contract:
/// per-essay atomic counter, creation-order listing, no renumbering.
#[derive(Default)]
pub struct MemoryStore {
    inner: StdMutex<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` store operations with a transient error.
    pub fn inject_transient_failures(&self, n: u32) {
        self.inner.lock().unwrap().transient_failures = n;
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_transient(inner: &mut StoreInner) -> Result<(), PersistenceError> {
        if inner.transient_failures > 0 {
            inner.transient_failures -= 1;
            return Err(PersistenceError::Transient(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl AnnotationStore for MemoryStore {
    async fn list(
        &self,
        essay_id: DbId,
        origin: OriginTable,
    ) -> Result<Vec<Annotation>, PersistenceError> {
        let mut inner = self.inner.lock().unwrap();
        MemoryStore::check_transient(&mut inner)?;
        let mut matching: Vec<Annotation> = inner
            .annotations
            .iter()
            .filter(|a| a.essay_id == essay_id && a.origin_id == origin.id())
            .cloned()
            .collect();
        matching.sort_by_key(|a| (a.created_at, a.id));
        Ok(matching)
    }

    async fn create(
        &self,
        essay_id: DbId,
        origin: OriginTable,
        input: &CreateAnnotation,
    ) -> Result<Annotation, PersistenceError> {
        let mut inner = self.inner.lock().unwrap();
        MemoryStore::check_transient(&mut inner)?;

        if input.comment.trim().is_empty() {
            return Err(PersistenceError::Validation(
                "constraint violation: annotations_comment_check".into(),
            ));
        }

        let counter = inner.counters.entry((essay_id, origin.id())).or_insert(0);
        *counter += 1;
        let sequence_number = *counter;

        inner.next_id += 1;
        let annotation = Annotation {
            id: inner.next_id,
            essay_id,
            origin_id: origin.id(),
            corrector_id: input.corrector_id,
            competency: input.competency,
            comment: input.comment.clone(),
            x_start: input.x_start,
            y_start: input.y_start,
            x_end: input.x_end,
            y_end: input.y_end,
            image_width: input.image_width,
            image_height: input.image_height,
            sequence_number,
            created_at: Utc::now(),
        };
        inner.annotations.push(annotation.clone());
        Ok(annotation)
    }

    async fn delete(&self, annotation_id: DbId) -> Result<bool, PersistenceError> {
        let mut inner = self.inner.lock().unwrap();
        MemoryStore::check_transient(&mut inner)?;
        let before = inner.annotations.len();
        inner.annotations.retain(|a| a.id != annotation_id);
        Ok(inner.annotations.len() < before)
    }

    async fn clear_all(
        &self,
        essay_id: DbId,
        origin: OriginTable,
    ) -> Result<u64, PersistenceError> {
        let mut inner = self.inner.lock().unwrap();
        MemoryStore::check_transient(&mut inner)?;
        let before = inner.annotations.len();
        inner
            .annotations
            .retain(|a| !(a.essay_id == essay_id && a.origin_id == origin.id()));
        let removed = (before - inner.annotations.len()) as u64;
        inner.counters.insert((essay_id, origin.id()), 0);
        Ok(removed)
    }
}
