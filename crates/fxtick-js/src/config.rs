//! Runtime configuration

use serde::{Deserialize, Serialize};

/// QuickJS runtime options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// QuickJS heap limit (bytes)
    pub memory_limit: usize,

    /// Native stack limit for script execution (bytes)
    pub max_stack_size: Option<usize>,

    /// Cap on promise jobs run by one tick's flush. `None` drains the queue
    /// until it is empty.
    pub max_jobs_per_flush: Option<usize>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            memory_limit: 32 * 1024 * 1024, // 32MB
            max_stack_size: None,
            max_jobs_per_flush: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: RuntimeConfig =
            serde_json::from_str(r#"{ "max_jobs_per_flush": 64 }"#).unwrap();
        assert_eq!(config.max_jobs_per_flush, Some(64));
        assert_eq!(config.memory_limit, RuntimeConfig::default().memory_limit);
        assert_eq!(config.max_stack_size, None);
    }
}
