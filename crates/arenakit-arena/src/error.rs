//! Arena-specific error types.

use thiserror::Error;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// The buffer cannot hold the request and no fallback is configured.
    ///
    /// Distinct from [`FallbackFailed`](Self::FallbackFailed): the arena
    /// itself is full, the system is not out of memory.
    #[error(
        "arena exhausted: requested {requested} bytes, {remaining} of {capacity} bytes remaining"
    )]
    Exhausted {
        /// Number of bytes requested, after rounding to the arena alignment.
        requested: usize,
        /// Bytes still free in the buffer.
        remaining: usize,
        /// Total buffer capacity.
        capacity: usize,
    },
    /// The requested alignment is stricter than the arena guarantees.
    #[error("alignment {required} exceeds arena alignment {supported}")]
    AlignmentTooLarge {
        /// Alignment of the request.
        required: usize,
        /// Alignment every arena block is guaranteed to have.
        supported: usize,
    },
    /// The buffer was full and the fallback allocator refused the request.
    #[error("fallback allocator failed to provide {requested} bytes")]
    FallbackFailed {
        /// Size of the request forwarded to the fallback.
        requested: usize,
    },
    /// A pointer outside the buffer was freed on an arena without fallback.
    #[error("pointer {addr:#x} was not issued by this arena")]
    ForeignPointer {
        /// Address of the offending pointer.
        addr: usize,
    },
    /// `n` elements of the requested type do not form a valid layout.
    #[error("array of {count} elements of {elem_size} bytes overflows a layout")]
    LayoutOverflow {
        /// Element count requested.
        count: usize,
        /// Size of one element in bytes.
        elem_size: usize,
    },
    /// Arena construction parameters are invalid.
    #[error("invalid arena configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: String,
    },
}
