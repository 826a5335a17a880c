// src/error.rs
use std::fmt;
use uuid::Uuid;

/// Classification of a driver-level failure, used by the Retry Driver to
/// decide whether an error is safe to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SerializationFailure,
    DeadlockDetected,
    LockNotAvailable,
    UniqueViolation,
    CheckViolation,
    NotFound,
    Other,
}

impl ErrorKind {
    /// Transient conflicts are the only classes safe to retry: `NOWAIT`
    /// guarantees no state was mutated before the lock failure, and
    /// serialization/deadlock aborts are rolled back in full by Postgres.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ErrorKind::SerializationFailure
                | ErrorKind::DeadlockDetected
                | ErrorKind::LockNotAvailable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::SerializationFailure => write!(f, "serialization_failure"),
            ErrorKind::DeadlockDetected => write!(f, "deadlock_detected"),
            ErrorKind::LockNotAvailable => write!(f, "lock_not_available"),
            ErrorKind::UniqueViolation => write!(f, "unique_violation"),
            ErrorKind::CheckViolation => write!(f, "check_violation"),
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::Other => write!(f, "other"),
        }
    }
}

/// Error taxonomy surfaced to callers of the engine.
#[derive(Debug)]
pub enum CoreError {
    ValidationError(String),
    NotFound(String),
    InsufficientFunds,
    Conflict(String),
    /// For a retriable `ErrorKind`, absorbed by the Retry Driver and only
    /// escapes once retries are exhausted. For `ErrorKind::UniqueViolation`
    /// specifically, the Retry Driver never sees it — the Movement
    /// Orchestrator catches it first and re-reads the winning response.
    TransientConflict(ErrorKind),
    /// Unclassified storage failure, tagged with an opaque id for log
    /// correlation.
    Internal { correlation_id: Uuid, detail: String },
}

impl CoreError {
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            correlation_id: Uuid::now_v7(),
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            CoreError::TransientConflict(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_retriable(&self) -> bool {
        self.kind().map(|k| k.is_retriable()).unwrap_or(false)
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::ValidationError(msg) => write!(f, "validation error: {msg}"),
            CoreError::NotFound(msg) => write!(f, "not found: {msg}"),
            CoreError::InsufficientFunds => write!(f, "insufficient funds"),
            CoreError::Conflict(msg) => write!(f, "conflict: {msg}"),
            CoreError::TransientConflict(kind) => write!(f, "transient conflict: {kind}"),
            CoreError::Internal {
                correlation_id,
                detail,
            } => write!(f, "internal error ({correlation_id}): {detail}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<ErrorKind> for CoreError {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotFound => CoreError::NotFound("resource not found".to_string()),
            k if k.is_retriable() => CoreError::TransientConflict(k),
            ErrorKind::UniqueViolation => {
                CoreError::Conflict("unique constraint violated".to_string())
            }
            ErrorKind::CheckViolation => {
                CoreError::ValidationError("check constraint violated".to_string())
            }
            ErrorKind::Other => CoreError::internal("unclassified storage error"),
        }
    }
}
