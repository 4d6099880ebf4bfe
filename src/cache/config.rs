//! Cache configuration.
//!
//! Controls the post and user entity caches via `vellum.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_POST_LIMIT: usize = 500;
const DEFAULT_USER_LIMIT: usize = 1000;
const DEFAULT_POST_TTL_SECS: u64 = 600;
const DEFAULT_USER_TTL_SECS: u64 = 1800;

/// Cache configuration from `vellum.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum resident posts.
    pub post_limit: usize,
    /// Maximum resident users.
    pub user_limit: usize,
    /// Post entry lifetime from last write, in seconds.
    pub post_ttl_secs: u64,
    /// User entry lifetime from last write, in seconds.
    pub user_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            post_limit: DEFAULT_POST_LIMIT,
            user_limit: DEFAULT_USER_LIMIT,
            post_ttl_secs: DEFAULT_POST_TTL_SECS,
            user_ttl_secs: DEFAULT_USER_TTL_SECS,
        }
    }
}

impl CacheConfig {
    /// Returns the post limit as NonZeroUsize, clamping to 1 if zero.
    pub fn post_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.post_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the user limit as NonZeroUsize, clamping to 1 if zero.
    pub fn user_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.user_limit).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn post_ttl(&self) -> Duration {
        Duration::from_secs(self.post_ttl_secs)
    }

    pub fn user_ttl(&self) -> Duration {
        Duration::from_secs(self.user_ttl_secs)
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            post_limit: settings.post_limit,
            user_limit: settings.user_limit,
            post_ttl_secs: settings.post_ttl_secs,
            user_ttl_secs: settings.user_ttl_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert_eq!(config.post_limit, 500);
        assert_eq!(config.user_limit, 1000);
        assert_eq!(config.post_ttl(), Duration::from_secs(600));
        assert_eq!(config.user_ttl(), Duration::from_secs(1800));
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            post_limit: 0,
            ..Default::default()
        };
        assert_eq!(config.post_limit_non_zero().get(), 1);
    }
}
