//! Cache error types.

use thiserror::Error;

/// Errors from cache lookups and construction.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CacheError {
    /// [`LruCache::at`](crate::LruCache::at) found no entry for the key.
    #[error("key not found in cache")]
    KeyNotFound,
    /// Cache construction parameters are invalid.
    #[error("invalid cache configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: String,
    },
}
