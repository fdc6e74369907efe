//! Lock policies for the arena cursor.
//!
//! An arena is single-threaded by default ([`Unlocked`]): its cursor lives
//! in a `Cell`, which makes the arena `!Sync` so sharing it across threads
//! is a compile error. [`Locked`] keeps the cursor behind a
//! `parking_lot::Mutex`; each arena operation is one scoped critical
//! section and the lock is never held across calls.

use std::cell::Cell;

use parking_lot::Mutex;

/// Cursor and counters mutated together in one critical section.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CursorState {
    /// Byte offset of the next free position in the buffer.
    pub cursor: usize,
    /// Largest cursor value since construction or the last reset.
    pub peak: usize,
    /// Blocks served from the buffer.
    pub allocations: u64,
    /// Blocks served by the fallback allocator.
    pub fallback_allocations: u64,
    /// Blocks returned to the fallback allocator.
    pub fallback_deallocations: u64,
}

mod private {
    use super::CursorState;

    pub trait Sealed {
        type Cell;

        fn new_cell(state: CursorState) -> Self::Cell;

        fn with<R>(cell: &Self::Cell, f: impl FnOnce(&mut CursorState) -> R) -> R;

        fn get_mut(cell: &mut Self::Cell) -> &mut CursorState;
    }
}

pub(crate) use private::Sealed;

/// Selects how an arena protects its cursor.
///
/// Sealed: implemented only by [`Unlocked`] and [`Locked`].
pub trait LockPolicy: Sealed {
    /// Whether operations run under a mutex.
    const IS_LOCKED: bool;
}

/// No synchronisation. Arenas using this policy are `!Sync`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Unlocked;

/// Every operation holds a `parking_lot::Mutex` for its duration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Locked;

impl Sealed for Unlocked {
    type Cell = Cell<CursorState>;

    fn new_cell(state: CursorState) -> Self::Cell {
        Cell::new(state)
    }

    fn with<R>(cell: &Self::Cell, f: impl FnOnce(&mut CursorState) -> R) -> R {
        let mut state = cell.get();
        let result = f(&mut state);
        cell.set(state);
        result
    }

    fn get_mut(cell: &mut Self::Cell) -> &mut CursorState {
        cell.get_mut()
    }
}

impl LockPolicy for Unlocked {
    const IS_LOCKED: bool = false;
}

impl Sealed for Locked {
    type Cell = Mutex<CursorState>;

    fn new_cell(state: CursorState) -> Self::Cell {
        Mutex::new(state)
    }

    fn with<R>(cell: &Self::Cell, f: impl FnOnce(&mut CursorState) -> R) -> R {
        let mut guard = cell.lock();
        f(&mut *guard)
    }

    fn get_mut(cell: &mut Self::Cell) -> &mut CursorState {
        cell.get_mut()
    }
}

impl LockPolicy for Locked {
    const IS_LOCKED: bool = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bump<L: LockPolicy>() -> CursorState {
        let cell = L::new_cell(CursorState::default());
        L::with(&cell, |s| s.cursor += 8);
        L::with(&cell, |s| {
            s.cursor += 8;
            s.peak = s.cursor;
        });
        L::with(&cell, |s| *s)
    }

    #[test]
    fn unlocked_persists_updates() {
        let state = bump::<Unlocked>();
        assert_eq!(state.cursor, 16);
        assert_eq!(state.peak, 16);
    }

    #[test]
    fn locked_persists_updates() {
        let state = bump::<Locked>();
        assert_eq!(state.cursor, 16);
        assert_eq!(state.peak, 16);
    }

    #[test]
    fn get_mut_bypasses_lock() {
        let mut cell = Locked::new_cell(CursorState::default());
        Locked::get_mut(&mut cell).cursor = 32;
        assert_eq!(Locked::with(&cell, |s| s.cursor), 32);
    }
}
