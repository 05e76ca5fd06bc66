use serde::Serialize;

use super::DocumentId;

/// Point-in-time view of one edit session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub id: DocumentId,
    pub baseline: String,
    pub current: String,
    pub dirty: bool,
}

/// Which document is presented and whether a switch is being resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinatorStatus {
    pub active: Option<DocumentId>,
    pub switching: bool,
}
