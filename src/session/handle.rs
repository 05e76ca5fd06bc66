use tokio::sync::{mpsc, oneshot};

use crate::models::{CoordinatorStatus, DocumentId, EditorError, SessionSnapshot, UnsavedDecision};

use super::coordinator::CoordinatorCmd;

/// Cloneable front door to the session coordinator actor.
///
/// `Ok(())` from a mutating call means the request was accepted; how it
/// resolved is reported to the Presenter.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<CoordinatorCmd>,
}

impl CoordinatorHandle {
    pub(crate) fn new(tx: mpsc::Sender<CoordinatorCmd>) -> Self {
        Self { tx }
    }

    /// Ask to present `id`. Rejected with `Busy` while another switch resolves.
    pub async fn request_activate(&self, id: impl Into<DocumentId>) -> Result<(), EditorError> {
        let id = id.into();
        self.call(|reply| CoordinatorCmd::RequestActivate { id, reply })
            .await?
    }

    /// Answer a pending `request_unsaved_decision`.
    pub async fn confirm_save_or_discard(
        &self,
        decision: UnsavedDecision,
    ) -> Result<(), EditorError> {
        self.call(|reply| CoordinatorCmd::Decide { decision, reply })
            .await?
    }

    pub async fn edit(
        &self,
        id: impl Into<DocumentId>,
        content: impl Into<String>,
    ) -> Result<(), EditorError> {
        let id = id.into();
        let content = content.into();
        self.call(|reply| CoordinatorCmd::Edit { id, content, reply })
            .await?
    }

    /// Save the active document outside of a switch.
    pub async fn save_active(&self) -> Result<(), EditorError> {
        self.call(|reply| CoordinatorCmd::SaveActive { reply }).await?
    }

    /// Revert the active document to its baseline.
    pub async fn discard_active(&self) -> Result<(), EditorError> {
        self.call(|reply| CoordinatorCmd::DiscardActive { reply }).await?
    }

    pub async fn snapshot(&self, id: impl Into<DocumentId>) -> Result<SessionSnapshot, EditorError> {
        let id = id.into();
        self.call(|reply| CoordinatorCmd::Snapshot { id, reply }).await?
    }

    pub async fn status(&self) -> Result<CoordinatorStatus, EditorError> {
        self.call(|reply| CoordinatorCmd::Status { reply }).await
    }

    /// Documents with unsaved changes, in configured order.
    pub async fn dirty_documents(&self) -> Result<Vec<DocumentId>, EditorError> {
        self.call(|reply| CoordinatorCmd::DirtyDocuments { reply }).await
    }

    async fn call<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> CoordinatorCmd,
    ) -> Result<T, EditorError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| EditorError::CoordinatorClosed)?;
        rx.await.map_err(|_| EditorError::CoordinatorClosed)
    }
}
