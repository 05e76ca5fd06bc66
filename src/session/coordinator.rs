use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::{
    CoordinatorStatus, DocumentId, EditorError, PersistenceError, SessionSnapshot, UnsavedDecision,
};
use crate::presenter::Presenter;
use crate::services::gateway::PersistenceGateway;
use crate::utils::CompletionGuard;

use super::edit_session::{EditSession, SaveFuture, SaveOutcome, SaveReport};
use super::handle::CoordinatorHandle;

const COMMAND_CAPACITY: usize = 64;

/// Commands accepted by the coordinator actor.
#[derive(Debug)]
pub(crate) enum CoordinatorCmd {
    RequestActivate {
        id: DocumentId,
        reply: oneshot::Sender<Result<(), EditorError>>,
    },
    Decide {
        decision: UnsavedDecision,
        reply: oneshot::Sender<Result<(), EditorError>>,
    },
    Edit {
        id: DocumentId,
        content: String,
        reply: oneshot::Sender<Result<(), EditorError>>,
    },
    SaveActive {
        reply: oneshot::Sender<Result<(), EditorError>>,
    },
    DiscardActive {
        reply: oneshot::Sender<Result<(), EditorError>>,
    },
    Snapshot {
        id: DocumentId,
        reply: oneshot::Sender<Result<SessionSnapshot, EditorError>>,
    },
    Status {
        reply: oneshot::Sender<CoordinatorStatus>,
    },
    DirtyDocuments {
        reply: oneshot::Sender<Vec<DocumentId>>,
    },
}

/// Results of background gateway calls, posted back to the actor.
#[derive(Debug)]
pub(crate) enum Completion {
    Loaded {
        id: DocumentId,
        result: Result<String, PersistenceError>,
    },
    Saved {
        id: DocumentId,
        report: SaveReport,
    },
}

/// Where the current switch (or standalone save) stands.
#[derive(Debug)]
enum Phase {
    Idle,
    /// Loading `target`; it becomes active when the load completes.
    Activating { ticket: Uuid, target: DocumentId },
    /// Waiting on the Presenter for what to do with `from`'s edits.
    AwaitingDecision {
        ticket: Uuid,
        from: DocumentId,
        target: DocumentId,
    },
    /// Saving `from`; switches to `target` on success if there is one.
    Saving {
        ticket: Uuid,
        from: DocumentId,
        target: Option<DocumentId>,
    },
}

/// Owns every edit session and the active-document pointer.
///
/// Runs as a single tokio task. Gateway calls are spawned and report back
/// through the completion channel, so all state changes happen here, one
/// message at a time. While `phase` is not `Idle` the coordinator is
/// switching and rejects every mutating request with `EditorError::Busy`.
pub struct SessionCoordinator {
    sessions: BTreeMap<DocumentId, EditSession>,
    order: Vec<DocumentId>,
    active: Option<DocumentId>,
    phase: Phase,
    presenter: Arc<dyn Presenter>,
    completion_tx: mpsc::UnboundedSender<Completion>,
}

impl SessionCoordinator {
    /// Spawns the coordinator actor with one session per document key.
    pub fn start(
        documents: impl IntoIterator<Item = DocumentId>,
        gateway: Arc<dyn PersistenceGateway>,
        presenter: Arc<dyn Presenter>,
    ) -> CoordinatorHandle {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let mut sessions = BTreeMap::new();
        let mut order = Vec::new();
        for id in documents {
            if sessions.contains_key(&id) {
                continue;
            }
            order.push(id.clone());
            sessions.insert(id.clone(), EditSession::new(id, gateway.clone()));
        }
        info!("Session coordinator managing {} documents", order.len());

        let coordinator = Self {
            sessions,
            order,
            active: None,
            phase: Phase::Idle,
            presenter,
            completion_tx,
        };
        tokio::spawn(coordinator.run(rx, completion_rx));

        CoordinatorHandle::new(tx)
    }

    async fn run(
        mut self,
        mut rx: mpsc::Receiver<CoordinatorCmd>,
        mut completion_rx: mpsc::UnboundedReceiver<Completion>,
    ) {
        loop {
            tokio::select! {
                biased;
                Some(completion) = completion_rx.recv() => self.handle_completion(completion),
                cmd = rx.recv() => {
                    let Some(cmd) = cmd else {
                        break;
                    };
                    self.handle_cmd(cmd);
                }
            }
        }
        debug!("Session coordinator stopped");
    }

    fn handle_cmd(&mut self, cmd: CoordinatorCmd) {
        match cmd {
            CoordinatorCmd::RequestActivate { id, reply } => {
                let _ = reply.send(self.request_activate(id));
            }
            CoordinatorCmd::Decide { decision, reply } => {
                let _ = reply.send(self.decide(decision));
            }
            CoordinatorCmd::Edit { id, content, reply } => {
                let _ = reply.send(self.edit(&id, content));
            }
            CoordinatorCmd::SaveActive { reply } => {
                let _ = reply.send(self.save_active());
            }
            CoordinatorCmd::DiscardActive { reply } => {
                let _ = reply.send(self.discard_active());
            }
            CoordinatorCmd::Snapshot { id, reply } => {
                let _ = reply.send(self.session(&id).map(EditSession::snapshot));
            }
            CoordinatorCmd::Status { reply } => {
                let _ = reply.send(self.status());
            }
            CoordinatorCmd::DirtyDocuments { reply } => {
                let _ = reply.send(self.dirty_documents());
            }
        }
    }

    fn is_switching(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    fn status(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            active: self.active.clone(),
            switching: self.is_switching(),
        }
    }

    fn dirty_documents(&self) -> Vec<DocumentId> {
        self.order
            .iter()
            .filter(|id| self.sessions.get(*id).is_some_and(EditSession::is_dirty))
            .cloned()
            .collect()
    }

    fn session(&self, id: &DocumentId) -> Result<&EditSession, EditorError> {
        self.sessions
            .get(id)
            .ok_or_else(|| EditorError::UnknownDocument(id.clone()))
    }

    fn session_mut(&mut self, id: &DocumentId) -> Result<&mut EditSession, EditorError> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| EditorError::UnknownDocument(id.clone()))
    }

    fn ensure_idle(&self, request: &str) -> Result<(), EditorError> {
        if self.is_switching() {
            warn!("Rejecting {} while busy ({:?})", request, self.phase);
            return Err(EditorError::Busy);
        }
        Ok(())
    }

    fn active_id(&self) -> Result<DocumentId, EditorError> {
        self.active.clone().ok_or(EditorError::NoActiveDocument)
    }

    fn request_activate(&mut self, target: DocumentId) -> Result<(), EditorError> {
        self.session(&target)?;
        self.ensure_idle("switch request")?;

        let ticket = Uuid::new_v4();
        info!(switch = %ticket, "Switch to '{}' requested (active: {:?})", target, self.active);

        let from = match self.active.clone() {
            Some(active) if active != target => active,
            // First activation or refresh of the active document.
            _ => {
                self.begin_activation(ticket, target);
                return Ok(());
            }
        };

        if !self.session(&from)?.is_dirty() {
            self.begin_activation(ticket, target);
            return Ok(());
        }

        info!(switch = %ticket, "'{}' has unsaved changes, asking for a decision", from);
        self.presenter.request_unsaved_decision(&from);
        self.phase = Phase::AwaitingDecision {
            ticket,
            from,
            target,
        };
        Ok(())
    }

    fn decide(&mut self, decision: UnsavedDecision) -> Result<(), EditorError> {
        let (ticket, from, target) = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::AwaitingDecision {
                ticket,
                from,
                target,
            } => (ticket, from, target),
            other => {
                self.phase = other;
                warn!("Decision {} arrived with nothing pending", decision);
                return Err(EditorError::NoPendingDecision);
            }
        };
        info!(switch = %ticket, "Decision {} for '{}'", decision, from);

        match decision {
            UnsavedDecision::Stay => {
                self.presenter.on_selection_reverted(&from);
            }
            UnsavedDecision::Discard => {
                self.session_mut(&from)?.discard();
                self.begin_activation(ticket, target);
            }
            UnsavedDecision::Save => {
                let save = self.session(&from)?.save();
                match save {
                    Ok(save) => {
                        self.phase = Phase::Saving {
                            ticket,
                            from: from.clone(),
                            target: Some(target),
                        };
                        self.spawn_save(from, save);
                    }
                    Err(e) => {
                        warn!(switch = %ticket, "Save of '{}' blocked: {}", from, e);
                        self.presenter.on_validation_error(&from, &e.reason());
                        self.presenter.on_selection_reverted(&from);
                    }
                }
            }
        }
        Ok(())
    }

    fn edit(&mut self, id: &DocumentId, content: String) -> Result<(), EditorError> {
        self.session(id)?;
        self.ensure_idle("edit")?;
        self.session_mut(id)?.edit(content);
        Ok(())
    }

    fn save_active(&mut self) -> Result<(), EditorError> {
        self.ensure_idle("save")?;
        let id = self.active_id()?;
        let session = self.session(&id)?;

        // Empty content is reported even when nothing changed.
        let save = match session.save() {
            Ok(save) => save,
            Err(e) => {
                warn!("Save of '{}' blocked: {}", id, e);
                self.presenter.on_validation_error(&id, &e.reason());
                return Ok(());
            }
        };
        if !session.is_dirty() {
            debug!("Nothing to save for '{}'", id);
            self.presenter.on_nothing_to_save(&id);
            return Ok(());
        }

        self.phase = Phase::Saving {
            ticket: Uuid::new_v4(),
            from: id.clone(),
            target: None,
        };
        self.spawn_save(id, save);
        Ok(())
    }

    fn discard_active(&mut self) -> Result<(), EditorError> {
        self.ensure_idle("discard")?;
        let id = self.active_id()?;
        let session = self.session_mut(&id)?;

        if !session.is_dirty() {
            self.presenter.on_nothing_to_discard(&id);
            return Ok(());
        }
        session.discard();
        info!("Discarded changes for '{}'", id);
        let content = session.current().to_string();
        self.presenter.on_activated(&id, &content);
        Ok(())
    }

    fn begin_activation(&mut self, ticket: Uuid, target: DocumentId) {
        let load = match self.session(&target) {
            Ok(session) => session.load(),
            Err(e) => {
                error!(switch = %ticket, "Cannot activate: {}", e);
                return;
            }
        };
        self.phase = Phase::Activating {
            ticket,
            target: target.clone(),
        };

        let fallback = Completion::Loaded {
            id: target.clone(),
            result: Err(PersistenceError::Abandoned { id: target.clone() }),
        };
        self.spawn(fallback, async move {
            let result = load.await;
            Completion::Loaded { id: target, result }
        });
    }

    fn spawn_save(&self, id: DocumentId, save: SaveFuture) {
        let fallback = Completion::Saved {
            id: id.clone(),
            report: SaveReport {
                content: String::new(),
                result: Err(PersistenceError::Abandoned { id: id.clone() }),
            },
        };
        self.spawn(fallback, async move {
            let report = save.await;
            Completion::Saved { id, report }
        });
    }

    fn spawn(&self, fallback: Completion, work: impl Future<Output = Completion> + Send + 'static) {
        let guard = CompletionGuard::new(self.completion_tx.clone(), fallback);
        tokio::spawn(async move {
            let completion = work.await;
            guard.complete(completion);
        });
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Loaded { id, result } => self.on_loaded(id, result),
            Completion::Saved { id, report } => self.on_saved(id, report),
        }
    }

    fn on_loaded(&mut self, id: DocumentId, result: Result<String, PersistenceError>) {
        let ticket = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Activating { ticket, target } if target == id => ticket,
            other => {
                self.phase = other;
                warn!("Unexpected load completion for '{}'", id);
                // Last completed load wins.
                if let (Ok(content), Some(session)) = (result, self.sessions.get_mut(&id)) {
                    session.complete_load(content);
                }
                return;
            }
        };

        match result {
            Ok(content) => {
                let Some(session) = self.sessions.get_mut(&id) else {
                    error!(switch = %ticket, "Loaded unknown document '{}'", id);
                    return;
                };
                session.complete_load(content);
                self.active = Some(id.clone());
                info!(switch = %ticket, "Activated '{}'", id);
                self.presenter.on_activated(&id, session.current());
            }
            Err(e) => {
                error!(switch = %ticket, "Failed to load '{}': {}", id, e);
                self.presenter.on_load_failed(&id, &e.to_string());
                if let Some(active) = &self.active {
                    self.presenter.on_selection_reverted(active);
                }
            }
        }
    }

    fn on_saved(&mut self, id: DocumentId, report: SaveReport) {
        let (ticket, target) = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Saving {
                ticket,
                from,
                target,
            } if from == id => (ticket, target),
            other => {
                self.phase = other;
                warn!("Unexpected save completion for '{}'", id);
                return;
            }
        };
        let Some(session) = self.sessions.get_mut(&id) else {
            error!(switch = %ticket, "Saved unknown document '{}'", id);
            return;
        };

        match session.complete_save(report) {
            SaveOutcome::Succeeded => {
                info!(switch = %ticket, "Saved '{}'", id);
                self.presenter.on_save_succeeded(&id);
                if let Some(target) = target {
                    self.begin_activation(ticket, target);
                }
            }
            SaveOutcome::Failed(e) => {
                warn!(switch = %ticket, "Save of '{}' failed: {}", id, e);
                self.presenter.on_save_failed(&id, &e.to_string());
                if target.is_some() {
                    self.presenter.on_selection_reverted(&id);
                }
            }
        }
    }
}
