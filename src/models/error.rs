use thiserror::Error;

use super::DocumentId;

/// Failure reported by a persistence gateway. Returned as data, never raised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Connection to the remote store was interrupted while saving '{id}'")]
    ConnectionInterrupted { id: DocumentId },

    #[error("No stored content for '{id}'")]
    NotFound { id: DocumentId },

    /// The background task ended without reporting a result.
    #[error("Request for '{id}' was abandoned before completing")]
    Abandoned { id: DocumentId },
}

/// Errors surfaced by edit sessions and the session coordinator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// Content rejected before any gateway call.
    #[error("Invalid content for '{id}': {reason}")]
    Validation { id: DocumentId, reason: String },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// A switch or gateway call is still being resolved.
    #[error("Coordinator is busy resolving another request")]
    Busy,

    #[error("Unknown document '{0}'")]
    UnknownDocument(DocumentId),

    #[error("No document is active")]
    NoActiveDocument,

    #[error("No unsaved-changes decision is pending")]
    NoPendingDecision,

    #[error("Session coordinator has stopped")]
    CoordinatorClosed,
}

impl EditorError {
    pub fn validation(id: &DocumentId, reason: impl Into<String>) -> Self {
        Self::Validation {
            id: id.clone(),
            reason: reason.into(),
        }
    }

    /// Human-readable reason without the document prefix, for Presenter dialogs.
    pub fn reason(&self) -> String {
        match self {
            EditorError::Validation { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }
}
