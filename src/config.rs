use crate::countdown::DEFAULT_COUNTDOWN_SECS;
use crate::generators::GeneratorParams;
use crate::widget::DEFAULT_FRAME_INTERVAL;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Settings for a feed session, loadable from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Seconds the driver has to answer each offer
    pub countdown_secs: u64,
    /// Pause with no offer on screen between two offers (ms)
    pub settle_delay_ms: u64,
    /// Progress bar refresh rate (ms)
    pub frame_interval_ms: u64,
    /// Resolved offers kept in memory for the session summary
    pub history_limit: usize,
    /// Mock offer generation
    pub generator: GeneratorParams,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            settle_delay_ms: 1500,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL.as_millis() as u64,
            history_limit: 50,
            generator: GeneratorParams::default(),
        }
    }
}

impl FeedConfig {
    /// Read a config file, falling back to defaults for missing fields
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn settle_delay(&self) -> Duration {
        if self.settle_delay_ms == 0 {
            warn!("Settling delay of 0ms is not allowed, using 1ms");
        }
        Duration::from_millis(self.settle_delay_ms.max(1))
    }

    pub fn frame_interval(&self) -> Duration {
        if self.frame_interval_ms == 0 {
            warn!("Frame interval of 0ms is not allowed, using 1ms");
        }
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}
