//! Runtime settings.

use std::env;
use std::time::Duration;

/// Default configuration cache TTL (5 minutes).
pub const DEFAULT_CONFIG_CACHE_TTL: Duration = Duration::from_secs(300);

/// Tunables for [`AgentRuntime`](crate::AgentRuntime).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    /// How long resolved configuration and knowledge stay cached.
    pub config_cache_ttl: Duration,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            config_cache_ttl: DEFAULT_CONFIG_CACHE_TTL,
        }
    }
}

impl RuntimeSettings {
    /// Load settings from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `AGENT_CONFIG_CACHE_TTL_SECS` | `300` |
    pub fn from_env() -> Self {
        let config_cache_ttl = env::var("AGENT_CONFIG_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CONFIG_CACHE_TTL);

        Self { config_cache_ttl }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_scenarios() {
        env::remove_var("AGENT_CONFIG_CACHE_TTL_SECS");
        assert_eq!(RuntimeSettings::from_env(), RuntimeSettings::default());

        env::set_var("AGENT_CONFIG_CACHE_TTL_SECS", "30");
        assert_eq!(RuntimeSettings::from_env().config_cache_ttl, Duration::from_secs(30));

        env::set_var("AGENT_CONFIG_CACHE_TTL_SECS", "soon");
        assert_eq!(RuntimeSettings::from_env().config_cache_ttl, DEFAULT_CONFIG_CACHE_TTL);

        env::remove_var("AGENT_CONFIG_CACHE_TTL_SECS");
    }
}
