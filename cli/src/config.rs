//! CLI Configuration

use pktforge_common::{ForgeError, ForgeResult, LoggerConfig};
use pktforge_dataplane::buffer::{DEFAULT_HEADROOM, FRAME_SIZE};
use pktforge_dataplane::EngineConfig;
use pktforge_generator::GeneratorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Everything a run needs, as read from a JSON or YAML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub logger: LoggerConfig,
    /// Execution contexts (worker threads)
    pub parallelism: usize,
    /// Frames to process across all contexts
    pub count: u64,
    pub pin_cores: bool,
    /// Throughput report interval, 0 disables reporting
    pub report_interval_ms: u64,
    /// Length of the seed frame each worker replays
    pub inbound_len: usize,
    pub generator: GeneratorConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            logger: LoggerConfig::default(),
            parallelism: engine.contexts,
            count: engine.packets,
            pin_cores: engine.pin_cores,
            report_interval_ms: 1000,
            inbound_len: 1500,
            generator: GeneratorConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load from `path`, choosing the format by extension
    pub fn load(path: &Path) -> ForgeResult<Self> {
        let content = fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            _ => Err(ForgeError::ConfigError(format!(
                "unsupported config format: {} (expected .json, .yaml or .yml)",
                path.display()
            ))),
        }
    }

    pub fn validate(&self) -> ForgeResult<()> {
        self.engine_config()
            .validate()
            .map_err(|e| ForgeError::ConfigError(e.to_string()))?;
        let room = FRAME_SIZE - DEFAULT_HEADROOM;
        if self.inbound_len > room {
            return Err(ForgeError::ConfigError(format!(
                "inbound_len {} exceeds buffer room of {}",
                self.inbound_len, room
            )));
        }
        self.generator.validate()
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            contexts: self.parallelism,
            packets: self.count,
            pin_cores: self.pin_cores,
            report_interval: (self.report_interval_ms > 0)
                .then(|| Duration::from_millis(self.report_interval_ms)),
        }
    }
}
