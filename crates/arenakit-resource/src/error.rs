//! Memory resource error types.

use arenakit_arena::ArenaError;
use thiserror::Error;

/// Errors reported by [`MemoryResource`](crate::MemoryResource) calls.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// The size and alignment do not form a valid layout.
    #[error("invalid layout: {bytes} bytes aligned to {alignment}")]
    InvalidLayout {
        /// Requested size in bytes.
        bytes: usize,
        /// Requested alignment.
        alignment: usize,
    },
    /// The null resource was asked for memory.
    #[error("null memory resource cannot allocate")]
    NullResource,
    /// The underlying allocator refused the request.
    #[error("allocation of {bytes} bytes aligned to {alignment} failed")]
    AllocationFailed {
        /// Requested size in bytes.
        bytes: usize,
        /// Requested alignment.
        alignment: usize,
    },
    /// An arena used as a resource refused the request.
    #[error(transparent)]
    Arena(#[from] ArenaError),
}
