use thiserror::Error;

/// Error taxonomy for forum operations.
///
/// Every operation terminates with a value or exactly one of these. An
/// unauthorized action is always a reported `Forbidden`, never a silent
/// no-op. `Unavailable` wraps transient store failures and is safe for the
/// caller to retry; the engine itself never retries beyond the bounded slug
/// disambiguation loop.
#[derive(Debug, Error)]
pub enum ForumError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("record store unavailable")]
    Unavailable(#[from] sqlx::Error),
}

impl ForumError {
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Whether a store error is a UNIQUE constraint violation.
///
/// Slug and name uniqueness are enforced by the schema; operations that
/// expect collisions (topic slug disambiguation, category creation) inspect
/// the raw error before it decays into `Unavailable`.
#[must_use]
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

/// Whether a store error is a FOREIGN KEY violation, i.e. the referenced
/// parent row vanished between the gate check and the write.
#[must_use]
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation())
}
