//! Cache configuration parameters.

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Configuration for [`LruCache`](crate::LruCache) and
/// [`SharedLruCache`](crate::SharedLruCache).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries kept. Default: 100. Must be non-zero.
    pub cache_size: usize,
}

impl CacheConfig {
    /// Default entry limit, sized for a compiled-pattern cache.
    pub const DEFAULT_CACHE_SIZE: usize = 100;

    /// Create a config with the given entry limit.
    pub fn new(cache_size: usize) -> Self {
        Self { cache_size }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.cache_size == 0 {
            return Err(CacheError::InvalidConfig {
                reason: "cache_size must be at least 1".into(),
            });
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CACHE_SIZE)
    }
}
