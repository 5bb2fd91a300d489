use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::board::{Color, PieceType};
use crate::error::ConfigError;

/// Settings for the automated opponent. Every field has a default, so a
/// config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Side played by the engine; `None` for two humans.
    pub automated_color: Option<Color>,
    /// How many of the best-scored moves the selector picks from.
    pub selection_pool: usize,
    /// Upper bound on waiting for the advisor. `None` waits until it answers,
    /// fails or is cancelled.
    pub advisor_timeout_ms: Option<u64>,
    pub automated_promotion: PieceType,
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            automated_color: Some(Color::Black),
            selection_pool: 3,
            advisor_timeout_ms: None,
            automated_promotion: PieceType::Queen,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.selection_pool == 0 {
            return Err(ConfigError::Invalid("selection_pool must be at least 1".to_string()));
        }
        if !self.automated_promotion.is_promotion_choice() {
            return Err(ConfigError::Invalid(format!(
                "automated_promotion cannot be {}",
                self.automated_promotion
            )));
        }
        Ok(())
    }

    pub fn advisor_timeout(&self) -> Option<Duration> {
        self.advisor_timeout_ms.map(Duration::from_millis)
    }
}
