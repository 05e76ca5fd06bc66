use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::models::{DocumentId, PersistenceError};
use super::gateway::PersistenceGateway;

/// Deterministic gateway: no latency, fails the next N saves on demand and
/// records every save call it receives.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    store: Mutex<HashMap<DocumentId, String>>,
    failing_saves: AtomicUsize,
    saves: Mutex<Vec<(DocumentId, String)>>,
}

impl ScriptedGateway {
    pub(crate) fn with(documents: &[(&str, &str)]) -> Self {
        let store = documents
            .iter()
            .map(|(id, content)| (DocumentId::from(*id), content.to_string()))
            .collect();
        Self {
            store: Mutex::new(store),
            ..Self::default()
        }
    }

    pub(crate) fn fail_next_saves(&self, count: usize) {
        self.failing_saves.store(count, Ordering::SeqCst);
    }

    pub(crate) fn saves(&self) -> Vec<(DocumentId, String)> {
        self.saves.lock().unwrap().clone()
    }

    pub(crate) fn stored(&self, id: &str) -> Option<String> {
        self.store.lock().unwrap().get(&DocumentId::from(id)).cloned()
    }
}

#[async_trait]
impl PersistenceGateway for ScriptedGateway {
    async fn load(&self, id: &DocumentId) -> Result<String, PersistenceError> {
        self.store
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound { id: id.clone() })
    }

    async fn save(&self, id: &DocumentId, content: &str) -> Result<(), PersistenceError> {
        self.saves.lock().unwrap().push((id.clone(), content.to_string()));
        let failing = self
            .failing_saves
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(PersistenceError::ConnectionInterrupted { id: id.clone() });
        }
        self.store.lock().unwrap().insert(id.clone(), content.to_string());
        Ok(())
    }
}
