use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

use crate::models::{DocumentId, EditorError, PersistenceError, SessionSnapshot};
use crate::services::gateway::PersistenceGateway;

pub type LoadFuture = Pin<Box<dyn Future<Output = Result<String, PersistenceError>> + Send>>;
pub type SaveFuture = Pin<Box<dyn Future<Output = SaveReport> + Send>>;

/// Result of a gateway save, carrying the content that was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub content: String,
    pub result: Result<(), PersistenceError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Succeeded,
    Failed(PersistenceError),
}

/// Editing state of one document: what the store last confirmed and what
/// the user currently sees.
///
/// `load` and `save` only build the gateway request; the owner runs it and
/// feeds the result back through `complete_load` / `complete_save`, so the
/// session is never mutated off the owning task.
pub struct EditSession {
    id: DocumentId,
    baseline: String,
    current: String,
    gateway: Arc<dyn PersistenceGateway>,
}

impl EditSession {
    pub fn new(id: DocumentId, gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            id,
            baseline: String::new(),
            current: String::new(),
            gateway,
        }
    }

    pub fn baseline(&self) -> &str {
        &self.baseline
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// Replace the presented content. No validation here.
    pub fn edit(&mut self, content: impl Into<String>) {
        self.current = content.into();
    }

    pub fn is_dirty(&self) -> bool {
        self.current.trim() != self.baseline.trim()
    }

    pub fn discard(&mut self) {
        self.current.clone_from(&self.baseline);
    }

    /// Content must be non-empty once trimmed.
    pub fn validate(&self) -> Result<(), EditorError> {
        if self.current.trim().is_empty() {
            return Err(EditorError::validation(
                &self.id,
                "Menu content cannot be empty. Please enter some dishes.",
            ));
        }
        Ok(())
    }

    pub fn load(&self) -> LoadFuture {
        let id = self.id.clone();
        let gateway = self.gateway.clone();
        Box::pin(async move {
            debug!("Loading '{}'", id);
            gateway.load(&id).await
        })
    }

    /// Overwrites both baseline and current, including any unsaved edit.
    pub fn complete_load(&mut self, content: String) {
        self.current.clone_from(&content);
        self.baseline = content;
    }

    /// Fails fast on invalid content without touching the gateway.
    pub fn save(&self) -> Result<SaveFuture, EditorError> {
        self.validate()?;

        let id = self.id.clone();
        let gateway = self.gateway.clone();
        let content = self.current.clone();
        Ok(Box::pin(async move {
            debug!("Saving '{}'", id);
            let result = gateway.save(&id, &content).await;
            SaveReport { content, result }
        }))
    }

    /// A failed save leaves both baseline and current untouched.
    pub fn complete_save(&mut self, report: SaveReport) -> SaveOutcome {
        match report.result {
            Ok(()) => {
                self.baseline = report.content;
                SaveOutcome::Succeeded
            }
            Err(e) => SaveOutcome::Failed(e),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            baseline: self.baseline.clone(),
            current: self.current.clone(),
            dirty: self.is_dirty(),
        }
    }
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("id", &self.id)
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::ScriptedGateway;
    use proptest::prelude::*;

    fn loaded_session(gateway: Arc<ScriptedGateway>, id: &str) -> EditSession {
        let mut session = EditSession::new(DocumentId::from(id), gateway.clone());
        let content = gateway.stored(id).unwrap();
        session.complete_load(content);
        session
    }

    #[tokio::test]
    async fn load_sets_baseline_and_current() {
        let gateway = Arc::new(ScriptedGateway::with(&[("MONDAY", "Soup")]));
        let mut session = EditSession::new(DocumentId::from("MONDAY"), gateway);
        session.edit("stale edit");

        let content = session.load().await.unwrap();
        session.complete_load(content);

        assert_eq!(session.baseline(), "Soup");
        assert_eq!(session.current(), "Soup");
        assert!(!session.is_dirty());
    }

    #[test]
    fn dirty_tracks_last_edit_against_baseline() {
        let gateway = Arc::new(ScriptedGateway::with(&[("MONDAY", "Soup")]));
        let mut session = loaded_session(gateway, "MONDAY");

        session.edit("Soup, Salad");
        assert!(session.is_dirty());
        session.edit("  Soup \n");
        assert!(!session.is_dirty(), "whitespace-only difference is not dirty");
        session.edit("Bread");
        session.edit("Soup");
        assert!(!session.is_dirty());
    }

    #[test]
    fn discard_restores_baseline() {
        let gateway = Arc::new(ScriptedGateway::with(&[("MONDAY", "Soup")]));
        let mut session = loaded_session(gateway, "MONDAY");

        session.edit("Soup, Salad");
        session.discard();

        assert_eq!(session.current(), "Soup");
        assert!(!session.is_dirty());
    }

    #[test]
    fn empty_content_fails_before_gateway() {
        let gateway = Arc::new(ScriptedGateway::with(&[("MONDAY", "Soup")]));
        let mut session = loaded_session(gateway.clone(), "MONDAY");

        session.edit("   ");
        let err = session.save().err().expect("validation error");

        assert!(matches!(err, EditorError::Validation { .. }));
        assert!(gateway.saves().is_empty());
    }

    #[tokio::test]
    async fn failed_save_keeps_edit_and_retry_persists_it() {
        let gateway = Arc::new(ScriptedGateway::with(&[("MONDAY", "Soup")]));
        let mut session = loaded_session(gateway.clone(), "MONDAY");
        session.edit("Soup, Salad");
        gateway.fail_next_saves(1);

        let report = session.save().unwrap().await;
        let outcome = session.complete_save(report);
        assert!(matches!(outcome, SaveOutcome::Failed(PersistenceError::ConnectionInterrupted { .. })));
        assert_eq!(session.current(), "Soup, Salad");
        assert_eq!(session.baseline(), "Soup");
        assert!(session.is_dirty());

        let report = session.save().unwrap().await;
        assert_eq!(session.complete_save(report), SaveOutcome::Succeeded);
        assert_eq!(session.baseline(), "Soup, Salad");
        assert!(!session.is_dirty());
        assert_eq!(gateway.stored("MONDAY").as_deref(), Some("Soup, Salad"));

        let saves = gateway.saves();
        assert_eq!(saves.len(), 2);
        assert_eq!(saves[0].1, saves[1].1);
    }

    #[derive(Debug, Clone)]
    enum Step {
        Edit(String),
        Discard,
        Save,
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            4 => "[ \n]{0,2}(Soup|Soup, Salad|Bread)?[ \n]{0,2}".prop_map(Step::Edit),
            1 => Just(Step::Discard),
            1 => Just(Step::Save),
        ]
    }

    proptest! {
        #[test]
        fn dirty_follows_trimmed_comparison(steps in prop::collection::vec(step(), 0..40)) {
            let gateway = Arc::new(ScriptedGateway::with(&[("MONDAY", "Soup")]));
            let mut session = loaded_session(gateway, "MONDAY");
            let mut baseline = "Soup".to_string();

            for step in steps {
                match step {
                    Step::Edit(content) => session.edit(content),
                    Step::Discard => {
                        session.discard();
                        prop_assert!(!session.is_dirty());
                        prop_assert_eq!(session.current(), baseline.as_str());
                    }
                    Step::Save => {
                        if session.save().is_ok() {
                            let content = session.current().to_string();
                            let outcome = session.complete_save(SaveReport {
                                content: content.clone(),
                                result: Ok(()),
                            });
                            prop_assert_eq!(outcome, SaveOutcome::Succeeded);
                            prop_assert!(!session.is_dirty());
                            baseline = content;
                        }
                    }
                }
                prop_assert_eq!(session.baseline(), baseline.as_str());
                prop_assert_eq!(
                    session.is_dirty(),
                    session.current().trim() != baseline.trim()
                );
            }
        }

        #[test]
        fn failed_save_changes_nothing(edits in prop::collection::vec("[a-z ]{0,8}", 1..10)) {
            let gateway = Arc::new(ScriptedGateway::with(&[("MONDAY", "Soup")]));
            let mut session = loaded_session(gateway, "MONDAY");
            for content in edits {
                session.edit(content);
            }
            let before = session.snapshot();

            let outcome = session.complete_save(SaveReport {
                content: session.current().to_string(),
                result: Err(PersistenceError::ConnectionInterrupted { id: DocumentId::from("MONDAY") }),
            });

            prop_assert!(matches!(outcome, SaveOutcome::Failed(_)));
            prop_assert_eq!(session.snapshot(), before);
        }
    }
}
