use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// The rectangle is degenerate or has a negative origin. Rejected
    /// before it can reach the store.
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// Annotation capture requires a non-empty comment.
    #[error("Annotation comment must not be empty")]
    EmptyComment,

    /// Returning an essay to the student requires a justification.
    #[error("A devolution requires a non-empty justification")]
    DevolutionMissingJustification,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
