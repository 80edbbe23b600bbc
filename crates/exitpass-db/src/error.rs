//! Database-specific error types and conversions.

use exitpass_core::error::ExitPassError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query rejected: {0}")]
    Query(String),

    #[error("Corrupt row: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for ExitPassError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ExitPassError::NotFound { entity, id },
            other => ExitPassError::Database(other.to_string()),
        }
    }
}
