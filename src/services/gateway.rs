use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::models::{DocumentId, PersistenceError};
use super::seed;

/// Remote store holding one document per key.
///
/// Implementations must not panic or partially write: every outcome,
/// including an interrupted connection, comes back as a `Result`.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Fetch the stored content of a document.
    async fn load(&self, id: &DocumentId) -> Result<String, PersistenceError>;

    /// Replace the stored content of a document.
    async fn save(&self, id: &DocumentId, content: &str) -> Result<(), PersistenceError>;
}

/// Latency and failure injection for [`SimulatedGateway`].
#[derive(Debug, Clone, PartialEq)]
pub struct GatewaySettings {
    pub latency_min: Duration,
    pub latency_max: Duration,
    /// Chance in `[0, 1]` that a save is interrupted.
    pub save_failure_probability: f64,
}

impl GatewaySettings {
    /// No latency and no failures.
    pub fn instant() -> Self {
        Self {
            latency_min: Duration::ZERO,
            latency_max: Duration::ZERO,
            save_failure_probability: 0.0,
        }
    }

    pub fn with_failure_probability(mut self, probability: f64) -> Self {
        self.save_failure_probability = probability;
        self.normalized()
    }

    /// Clamp the probability and order the latency bounds.
    pub fn normalized(mut self) -> Self {
        self.save_failure_probability = if self.save_failure_probability.is_nan() {
            0.0
        } else {
            self.save_failure_probability.clamp(0.0, 1.0)
        };
        if self.latency_min > self.latency_max {
            std::mem::swap(&mut self.latency_min, &mut self.latency_max);
        }
        self
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            latency_min: Duration::from_millis(200),
            latency_max: Duration::from_millis(1000),
            save_failure_probability: 0.1,
        }
    }
}

/// Persisted record of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredDocument {
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

/// In-memory stand-in for the remote menu store.
#[derive(Debug)]
pub struct SimulatedGateway {
    settings: GatewaySettings,
    store: RwLock<HashMap<DocumentId, StoredDocument>>,
}

impl SimulatedGateway {
    /// Store seeded with the weekday sample menus.
    pub fn new(settings: GatewaySettings) -> Self {
        Self::with_documents(settings, seed::weekday_menus())
    }

    pub fn with_documents(
        settings: GatewaySettings,
        documents: impl IntoIterator<Item = (DocumentId, String)>,
    ) -> Self {
        let now = Utc::now();
        let store = documents
            .into_iter()
            .map(|(id, content)| (id, StoredDocument { content, updated_at: now }))
            .collect::<HashMap<_, _>>();
        info!("Simulated store initialized with {} documents", store.len());
        Self {
            settings: settings.normalized(),
            store: RwLock::new(store),
        }
    }

    /// Current persisted record, bypassing latency.
    pub async fn stored(&self, id: &DocumentId) -> Option<StoredDocument> {
        self.store.read().await.get(id).cloned()
    }

    fn next_latency(&self) -> Duration {
        let min = self.settings.latency_min.as_millis() as u64;
        let max = self.settings.latency_max.as_millis() as u64;
        if min >= max {
            return Duration::from_millis(min);
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }

    fn roll_save_failure(&self) -> bool {
        rand::thread_rng().gen_bool(self.settings.save_failure_probability)
    }

    async fn simulate_latency(&self) {
        let latency = self.next_latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl PersistenceGateway for SimulatedGateway {
    async fn load(&self, id: &DocumentId) -> Result<String, PersistenceError> {
        self.simulate_latency().await;

        match self.store.read().await.get(id) {
            Some(doc) => {
                debug!("Loaded '{}' ({} bytes)", id, doc.content.len());
                Ok(doc.content.clone())
            }
            None => {
                warn!("No stored content for '{}'", id);
                Err(PersistenceError::NotFound { id: id.clone() })
            }
        }
    }

    async fn save(&self, id: &DocumentId, content: &str) -> Result<(), PersistenceError> {
        self.simulate_latency().await;

        if self.roll_save_failure() {
            warn!("Simulated connection interruption while saving '{}'", id);
            return Err(PersistenceError::ConnectionInterrupted { id: id.clone() });
        }

        self.store.write().await.insert(
            id.clone(),
            StoredDocument {
                content: content.to_string(),
                updated_at: Utc::now(),
            },
        );
        info!("Saved '{}' ({} bytes)", id, content.len());
        Ok(())
    }
}
