//! Engine configuration
//!
//! Environment-variable driven with hard defaults, so the CLI and the batch
//! sweep run without any setup against the production proxy.

use std::time::Duration;

/// Runtime configuration for the resolution engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the same-origin proxy all upstream requests go through.
    /// Empty means "call upstream hosts directly" (tests, local tooling).
    pub proxy_base: String,

    /// How long a cache entry is served without refreshing
    pub cache_fresh: Duration,

    /// How long a cache entry may still be served after a failed refresh
    pub cache_stale: Duration,
}

impl EngineConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self {
            proxy_base: std::env::var("CHART_PROXY_BASE").unwrap_or_default(),
            cache_fresh: Duration::from_secs(env_u64("CHART_CACHE_FRESH_SECS", 300)),
            cache_stale: Duration::from_secs(env_u64("CHART_CACHE_STALE_SECS", 86_400)),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            proxy_base: String::new(),
            cache_fresh: Duration::from_secs(300),
            cache_stale: Duration::from_secs(86_400),
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.cache_fresh, Duration::from_secs(300));
        assert_eq!(config.cache_stale, Duration::from_secs(86_400));
        assert!(config.proxy_base.is_empty());
    }
}
