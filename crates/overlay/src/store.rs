//! The annotation store contract consumed by the overlay session.
//!
//! The session is the only writer of surface state and never touches
//! persisted state directly; everything goes through this trait. The
//! Postgres adapter delegates to [`AnnotationRepo`].

use async_trait::async_trait;

use rubric_core::status::OriginTable;
use rubric_core::types::DbId;
use rubric_db::error::PersistenceError;
use rubric_db::models::annotation::{Annotation, CreateAnnotation};
use rubric_db::repositories::AnnotationRepo;
use rubric_db::DbPool;

/// Persistence boundary for annotations, as seen by the overlay engine.
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    /// All annotations for an essay, ordered by creation time.
    async fn list(
        &self,
        essay_id: DbId,
        origin: OriginTable,
    ) -> Result<Vec<Annotation>, PersistenceError>;

    /// Persist a new annotation; the store assigns id and sequence number.
    async fn create(
        &self,
        essay_id: DbId,
        origin: OriginTable,
        input: &CreateAnnotation,
    ) -> Result<Annotation, PersistenceError>;

    /// Hard delete. Returns true if the annotation existed.
    async fn delete(&self, annotation_id: DbId) -> Result<bool, PersistenceError>;

    /// Bulk delete for an essay, resetting its sequence counter.
    async fn clear_all(
        &self,
        essay_id: DbId,
        origin: OriginTable,
    ) -> Result<u64, PersistenceError>;
}

/// Postgres-backed store delegating to [`AnnotationRepo`].
pub struct PgAnnotationStore {
    pool: DbPool,
}

impl PgAnnotationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnnotationStore for PgAnnotationStore {
    async fn list(
        &self,
        essay_id: DbId,
        origin: OriginTable,
    ) -> Result<Vec<Annotation>, PersistenceError> {
        AnnotationRepo::list(&self.pool, essay_id, origin).await
    }

    async fn create(
        &self,
        essay_id: DbId,
        origin: OriginTable,
        input: &CreateAnnotation,
    ) -> Result<Annotation, PersistenceError> {
        AnnotationRepo::create(&self.pool, essay_id, origin, input).await
    }

    async fn delete(&self, annotation_id: DbId) -> Result<bool, PersistenceError> {
        AnnotationRepo::delete(&self.pool, annotation_id).await
    }

    async fn clear_all(
        &self,
        essay_id: DbId,
        origin: OriginTable,
    ) -> Result<u64, PersistenceError> {
        AnnotationRepo::clear_all(&self.pool, essay_id, origin).await
    }
}
