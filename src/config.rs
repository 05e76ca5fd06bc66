use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

use crate::models::{DocumentId, WEEKDAYS};
use crate::services::gateway::GatewaySettings;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EditorConfig {
    /// Document keys managed for the whole run (comma-separated in the environment)
    #[serde(default = "default_documents")]
    pub documents: Vec<String>,

    /// Lower bound of the simulated store latency
    #[serde(default = "default_latency_min_ms")]
    pub latency_min_ms: u64,

    /// Upper bound of the simulated store latency
    #[serde(default = "default_latency_max_ms")]
    pub latency_max_ms: u64,

    /// Chance that a simulated save is interrupted
    #[serde(default = "default_save_failure_probability")]
    pub save_failure_probability: f64,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl EditorConfig {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        let config = match envy::from_env::<EditorConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("❌ Failed to load configuration: {}", e);
                return Err(ConfigError::Env(e));
            }
        };

        config.validate()?;
        info!("✅ Configuration loaded successfully");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.document_ids().is_empty() {
            return Err(ConfigError::Invalid("at least one document key is required".to_string()));
        }
        if self.latency_min_ms > self.latency_max_ms {
            return Err(ConfigError::Invalid(format!(
                "latency_min_ms ({}) exceeds latency_max_ms ({})",
                self.latency_min_ms, self.latency_max_ms
            )));
        }
        Ok(())
    }

    /// Trimmed, non-empty, de-duplicated document keys in configured order.
    pub fn document_ids(&self) -> Vec<DocumentId> {
        let mut ids: Vec<DocumentId> = Vec::with_capacity(self.documents.len());
        for key in self.documents.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
            let id = DocumentId::from(key);
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            latency_min: Duration::from_millis(self.latency_min_ms),
            latency_max: Duration::from_millis(self.latency_max_ms),
            save_failure_probability: self.save_failure_probability,
        }
        .normalized()
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            documents: default_documents(),
            latency_min_ms: default_latency_min_ms(),
            latency_max_ms: default_latency_max_ms(),
            save_failure_probability: default_save_failure_probability(),
            environment: default_environment(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// Default value functions
fn default_documents() -> Vec<String> {
    WEEKDAYS.iter().map(|day| day.to_string()).collect()
}

fn default_latency_min_ms() -> u64 {
    200
}

fn default_latency_max_ms() -> u64 {
    1000
}

fn default_save_failure_probability() -> f64 {
    0.1
}

fn default_environment() -> String {
    "development".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_store() {
        let config = EditorConfig::default();
        assert_eq!(config.document_ids().len(), 7);
        assert_eq!(config.document_ids()[0], DocumentId::from("MONDAY"));

        let settings = config.gateway_settings();
        assert_eq!(settings.latency_min, Duration::from_millis(200));
        assert_eq!(settings.latency_max, Duration::from_millis(1000));
        assert!((settings.save_failure_probability - 0.1).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
        assert!(config.is_development());
    }

    #[test]
    fn document_keys_are_trimmed_and_deduplicated() {
        let config = EditorConfig {
            documents: vec![" MONDAY".into(), "".into(), "TUESDAY".into(), "MONDAY ".into()],
            ..EditorConfig::default()
        };
        assert_eq!(
            config.document_ids(),
            vec![DocumentId::from("MONDAY"), DocumentId::from("TUESDAY")]
        );
    }

    #[test]
    fn rejects_inverted_latency_and_empty_documents() {
        let inverted = EditorConfig {
            latency_min_ms: 500,
            latency_max_ms: 100,
            ..EditorConfig::default()
        };
        assert!(matches!(inverted.validate(), Err(ConfigError::Invalid(_))));

        let empty = EditorConfig {
            documents: vec!["  ".into()],
            ..EditorConfig::default()
        };
        assert!(matches!(empty.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn failure_probability_is_clamped() {
        let config = EditorConfig {
            save_failure_probability: 3.5,
            ..EditorConfig::default()
        };
        assert!((config.gateway_settings().save_failure_probability - 1.0).abs() < f64::EPSILON);
    }
}
