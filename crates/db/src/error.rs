//! Store-level error taxonomy.
//!
//! Callers react differently to the two causes: `Transient` failures are
//! retryable (the overlay reconciler retries them at most once),
//! `Validation` failures require fixed input and will fail again if
//! retried unchanged.

/// A failure surfaced by the persistence boundary.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Infrastructure failure (pool, network, I/O). Safe to retry.
    #[error("Transient persistence failure: {0}")]
    Transient(#[source] sqlx::Error),

    /// The input violates a constraint.
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl PersistenceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<sqlx::Error> for PersistenceError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // PostgreSQL integrity violations are class 23xxx: bad input,
            // not infrastructure. Everything else is treated as retryable.
            if db_err.code().is_some_and(|code| code.starts_with("23")) {
                let constraint = db_err.constraint().unwrap_or("unknown");
                return Self::Validation(format!("constraint violation: {constraint}"));
            }
        }
        Self::Transient(err)
    }
}
