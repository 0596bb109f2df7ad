//! Store-level error taxonomy shared by every sub-model.
//!
//! `Validation`, `NotFound` and `Conflict` are caller mistakes and carry
//! messages safe to show; everything else is an internal failure whose
//! detail is only logged.

use crate::crypto::CryptoError;
use crate::db::DatabaseError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Credential error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Internal lock error")]
    LockPoisoned,

    #[error("Invariant violated: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Whether this error indicates a bug rather than a bad request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Crypto(_) | Self::LockPoisoned | Self::Internal(_)
        )
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(DatabaseError::Sqlite(err))
    }
}

/// Trim an optional caller-supplied string, treating blank as absent.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Require a non-blank field, naming it in the validation message.
pub(crate) fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, StoreError> {
    non_blank(value).ok_or_else(|| StoreError::validation(format!("{field} is required")))
}
