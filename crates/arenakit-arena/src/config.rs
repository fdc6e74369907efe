//! Arena configuration parameters.

use serde::{Deserialize, Serialize};

use crate::error::ArenaError;
use crate::storage::MAX_ALIGN;

/// Configuration for a heap-backed arena ([`HeapArena`](crate::HeapArena)).
///
/// Inline arenas fix their capacity at compile time; this struct covers the
/// runtime-sized variant, e.g. one request-scoped arena per worker whose
/// size comes from a config file. Validated at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Buffer size in bytes.
    ///
    /// Default: 4096. Zero is allowed when `use_fallback` is set (every
    /// request then goes straight to the fallback).
    pub capacity: usize,

    /// Alignment of every block handed out by the arena.
    ///
    /// Default: 16. Must be a power of two. Requests with a stricter
    /// alignment are rejected with [`ArenaError::AlignmentTooLarge`].
    pub alignment: usize,

    /// Whether requests that do not fit go to the fallback allocator.
    ///
    /// Default: `true`. When `false`, a full buffer reports
    /// [`ArenaError::Exhausted`].
    pub use_fallback: bool,
}

impl ArenaConfig {
    /// Default buffer size in bytes.
    pub const DEFAULT_CAPACITY: usize = 4096;

    /// Default block alignment.
    pub const DEFAULT_ALIGNMENT: usize = MAX_ALIGN;

    /// Create a config for the given capacity with default alignment and
    /// fallback enabled.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            alignment: Self::DEFAULT_ALIGNMENT,
            use_fallback: true,
        }
    }

    /// Set the block alignment.
    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    /// Enable or disable the fallback allocator.
    pub fn with_fallback(mut self, use_fallback: bool) -> Self {
        self.use_fallback = use_fallback;
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if !self.alignment.is_power_of_two() {
            return Err(ArenaError::InvalidConfig {
                reason: format!("alignment {} is not a power of two", self.alignment),
            });
        }
        if self.capacity == 0 && !self.use_fallback {
            return Err(ArenaError::InvalidConfig {
                reason: "zero capacity without a fallback can never allocate".into(),
            });
        }
        if self.capacity > isize::MAX as usize - (self.alignment - 1) {
            return Err(ArenaError::InvalidConfig {
                reason: format!("capacity {} overflows isize", self.capacity),
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = ArenaConfig::default();
        assert_eq!(config.capacity, 4096);
        assert_eq!(config.alignment, 16);
        assert!(config.use_fallback);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_power_of_two_alignment_rejected() {
        let config = ArenaConfig::new(64).with_alignment(12);
        assert!(matches!(
            config.validate(),
            Err(ArenaError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn zero_capacity_needs_fallback() {
        assert!(ArenaConfig::new(0).validate().is_ok());
        let config = ArenaConfig::new(0).with_fallback(false);
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: ArenaConfig = serde_json::from_str(r#"{"capacity": 512}"#).unwrap();
        assert_eq!(config.capacity, 512);
        assert_eq!(config.alignment, ArenaConfig::DEFAULT_ALIGNMENT);
        assert!(config.use_fallback);
    }

    #[test]
    fn full_config_deserializes() {
        let json = r#"{"capacity": 1024, "alignment": 64, "use_fallback": false}"#;
        let config: ArenaConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config, ArenaConfig::new(1024).with_alignment(64).with_fallback(false));
    }
}
