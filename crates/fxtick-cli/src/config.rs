//! Pump configuration

use std::path::Path;

use anyhow::{Context, Result};
use fxtick_js::RuntimeConfig;
use serde::{Deserialize, Serialize};

/// How the pump drives a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PumpConfig {
    /// Number of ticks to run
    pub frames: u64,

    /// Wall-clock period between ticks (ms)
    pub frame_ms: u64,

    pub runtime: RuntimeConfig,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            frames: 60,
            frame_ms: 16, // ~60 fps
            runtime: RuntimeConfig::default(),
        }
    }
}

impl PumpConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_runtime_section() {
        let config: PumpConfig = serde_json::from_str(
            r#"{ "frames": 5, "runtime": { "max_jobs_per_flush": 10 } }"#,
        )
        .unwrap();
        assert_eq!(config.frames, 5);
        assert_eq!(config.frame_ms, 16);
        assert_eq!(config.runtime.max_jobs_per_flush, Some(10));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PumpConfig::load(Path::new("/nonexistent/fxtick.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }
}
