//! The process-wide default resource.
//!
//! The slot starts out pointing at [`new_delete_resource`] and is guarded
//! by a `parking_lot::RwLock` built in a `const` initialiser, so it is
//! usable from the first call without any initialisation order concerns.

use std::mem;

use parking_lot::RwLock;
use tracing::debug;

use crate::resource::same_resource;
use crate::stock::{new_delete_resource, StaticResource, NEW_DELETE};

static DEFAULT_RESOURCE: RwLock<StaticResource> =
    parking_lot::const_rwlock::<StaticResource>(&NEW_DELETE);

/// The current default resource.
pub fn get_default_resource() -> StaticResource {
    *DEFAULT_RESOURCE.read()
}

/// Install `resource` as the default and return the previous one.
pub fn set_default_resource(resource: StaticResource) -> StaticResource {
    let previous = mem::replace(&mut *DEFAULT_RESOURCE.write(), resource);
    debug!(
        previous = ?(previous as *const _ as *const ()),
        current = ?(resource as *const _ as *const ()),
        "default memory resource replaced"
    );
    previous
}

/// Restore the global-heap resource as the default and return the previous
/// one.
pub fn reset_default_resource() -> StaticResource {
    set_default_resource(new_delete_resource())
}

/// Replace the default with `new` only if it is still `current`.
///
/// Returns `Ok(previous)` on success and `Err(actual)` when another
/// resource was installed in the meantime.
pub fn compare_exchange_default_resource(
    current: StaticResource,
    new: StaticResource,
) -> Result<StaticResource, StaticResource> {
    let mut slot = DEFAULT_RESOURCE.write();
    if !same_resource(*slot, current) {
        return Err(*slot);
    }
    let previous = mem::replace(&mut *slot, new);
    drop(slot);
    debug!("default memory resource exchanged");
    Ok(previous)
}
