//! Type-erased memory resources and a polymorphic allocator.
//!
//! A [`MemoryResource`] hides where memory comes from behind a trait
//! object, so containers using [`PolymorphicAllocator`] have one concrete
//! type whether they allocate from the heap, an arena, or some custom
//! source.
//!
//! # Architecture
//!
//! ```text
//! PolymorphicAllocator<'r, T>       (Copy, implements Allocator)
//! └── &'r dyn MemoryResource
//!     ├── NewDeleteResource          global heap (default)
//!     ├── NullMemoryResource         always fails
//!     ├── ResourceAdaptor<A>         any Allocator + AllocatorIdentity
//!     │   └── StackResource<'a, A>   adaptor over an arena handle
//!     └── Arena<S, F, L>             arenas directly
//! ```
//!
//! The process-wide default resource is read by
//! [`PolymorphicAllocator::new`] and replaced with
//! [`set_default_resource`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod adaptor;
pub mod default;
pub mod error;
pub mod polymorphic;
pub mod resource;
pub mod stock;

// Public re-exports for the primary API surface.
pub use adaptor::{ResourceAdaptor, StackResource};
pub use default::{
    compare_exchange_default_resource, get_default_resource, reset_default_resource,
    set_default_resource,
};
pub use error::ResourceError;
pub use polymorphic::PolymorphicAllocator;
pub use resource::{MemoryResource, MAX_ALIGN};
pub use stock::{
    new_delete_resource, null_memory_resource, NewDeleteResource, NullMemoryResource,
    StaticResource,
};
