use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::models::DocumentId;

/// Rendering side of the editor.
///
/// Callbacks run on the coordinator task and must return promptly. A
/// decision requested through `request_unsaved_decision` is answered later
/// via `CoordinatorHandle::confirm_save_or_discard`.
pub trait Presenter: Send + Sync {
    /// A document finished loading and is now the active one.
    fn on_activated(&self, id: &DocumentId, content: &str);

    fn on_save_succeeded(&self, id: &DocumentId);

    fn on_save_failed(&self, id: &DocumentId, reason: &str);

    fn on_validation_error(&self, id: &DocumentId, reason: &str);

    /// The active document is dirty and a switch was requested.
    fn request_unsaved_decision(&self, id: &DocumentId);

    /// A switch did not go through; selection should point back at `id`.
    fn on_selection_reverted(&self, id: &DocumentId);

    fn on_load_failed(&self, id: &DocumentId, reason: &str);

    fn on_nothing_to_save(&self, _id: &DocumentId) {}

    fn on_nothing_to_discard(&self, _id: &DocumentId) {}
}

/// Presenter callback captured as a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    Activated { id: DocumentId, content: String },
    SaveSucceeded { id: DocumentId },
    SaveFailed { id: DocumentId, reason: String },
    ValidationError { id: DocumentId, reason: String },
    DecisionRequested { id: DocumentId },
    SelectionReverted { id: DocumentId },
    LoadFailed { id: DocumentId, reason: String },
    NothingToSave { id: DocumentId },
    NothingToDiscard { id: DocumentId },
}

/// Presenter that forwards every callback over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelPresenter {
    tx: UnboundedSender<PresenterEvent>,
}

impl ChannelPresenter {
    /// Presenter paired with the receiving end of its events.
    pub fn channel() -> (Self, UnboundedReceiver<PresenterEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: PresenterEvent) {
        debug!(?event, "presenter event");
        // Receiver gone means nobody is rendering anymore.
        let _ = self.tx.send(event);
    }
}

impl Presenter for ChannelPresenter {
    fn on_activated(&self, id: &DocumentId, content: &str) {
        self.emit(PresenterEvent::Activated {
            id: id.clone(),
            content: content.to_string(),
        });
    }

    fn on_save_succeeded(&self, id: &DocumentId) {
        self.emit(PresenterEvent::SaveSucceeded { id: id.clone() });
    }

    fn on_save_failed(&self, id: &DocumentId, reason: &str) {
        self.emit(PresenterEvent::SaveFailed {
            id: id.clone(),
            reason: reason.to_string(),
        });
    }

    fn on_validation_error(&self, id: &DocumentId, reason: &str) {
        self.emit(PresenterEvent::ValidationError {
            id: id.clone(),
            reason: reason.to_string(),
        });
    }

    fn request_unsaved_decision(&self, id: &DocumentId) {
        self.emit(PresenterEvent::DecisionRequested { id: id.clone() });
    }

    fn on_selection_reverted(&self, id: &DocumentId) {
        self.emit(PresenterEvent::SelectionReverted { id: id.clone() });
    }

    fn on_load_failed(&self, id: &DocumentId, reason: &str) {
        self.emit(PresenterEvent::LoadFailed {
            id: id.clone(),
            reason: reason.to_string(),
        });
    }

    fn on_nothing_to_save(&self, id: &DocumentId) {
        self.emit(PresenterEvent::NothingToSave { id: id.clone() });
    }

    fn on_nothing_to_discard(&self, id: &DocumentId) {
        self.emit(PresenterEvent::NothingToDiscard { id: id.clone() });
    }
}
