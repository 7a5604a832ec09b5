//! The shared access contract implemented by both lazy cell variants.

use thiserror::Error;

/// Error returned when a lazy cell is constructed from an absent supplier.
///
/// See [`SyncLazy::from_supplier`] and [`UnsyncLazy::from_supplier`]: a
/// caller holding a maybe-absent function handle must present `Some` of it;
/// `None` is rejected before any cell exists.
///
/// [`SyncLazy::from_supplier`]: crate::SyncLazy::from_supplier
/// [`UnsyncLazy::from_supplier`]: crate::UnsyncLazy::from_supplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot construct a lazy cell without a supplier")]
pub struct MissingSupplier;

/// A value computed at most once, on first demand.
///
/// Implementors hold a supplier from construction, run it on the first
/// [`get`] call, and hand back the one cached result on every call after
/// that. Which accesses may happen concurrently is up to the implementor:
/// [`SyncLazy`] allows arbitrary concurrent callers, while [`UnsyncLazy`]
/// is single-threaded by construction (`!Sync`).
///
/// [`get`]: LazyValue::get
/// [`SyncLazy`]: crate::SyncLazy
/// [`UnsyncLazy`]: crate::UnsyncLazy
pub trait LazyValue<T> {
   /// Returns the memoized value, running the supplier on the first call.
   fn get(&self) -> &T;
}
