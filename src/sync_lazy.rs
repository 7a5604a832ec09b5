//! Thread-safe lazy cell with double-checked initialization.
//!
//! This module provides the [`SyncLazy<T, F>`] type: a cell that owns a
//! supplier function and runs it at most once, on first access, no matter
//! how many threads race to read the value. The common case, reading an
//! already-computed cell, is a single acquire load with no locking; only
//! threads that arrive before the value exists enter the futex-parked
//! critical section of the internal state machine.
//!
//! The supplier is owned by the cell until its first *successful* run and is
//! dropped immediately after, releasing whatever the closure captured. A
//! supplier that fails (an `Err` from [`try_get`], or a panic) leaves the
//! cell uncomputed with the supplier intact, so the next caller attempts the
//! computation again.
//!
//! [`try_get`]: SyncLazy::try_get

use core::cell::UnsafeCell;
use core::ops::Deref;
use core::{fmt, mem};

use crate::lazy_value::{LazyValue, MissingSupplier};
use crate::state::LazyState;

/// A thread-safe, memoizing lazy value.
///
/// The cell is constructed with a supplier and computes the value on the
/// first [`get`](SyncLazy::get) (or [`try_get`](SyncLazy::try_get)) call.
/// Concurrent first accesses are arbitrated by a per-cell critical section:
/// exactly one thread runs the supplier while the rest park and then read
/// the published value. Every later access is a lock-free acquire load.
///
/// The supplier bound is `FnMut` rather than `FnOnce` because a failed
/// attempt keeps the supplier for the next caller to retry; it is consumed
/// only once a value has actually been stored.
///
/// # Examples
///
/// ```rust
/// use poly_lazy::SyncLazy;
///
/// static MOTD: SyncLazy<String> = SyncLazy::new(|| "expensive banner".to_string());
///
/// // First access computes, later accesses reuse the cached value.
/// assert_eq!(MOTD.get(), "expensive banner");
/// assert!(MOTD.is_computed());
/// ```
pub struct SyncLazy<T, F = fn() -> T> {
   value: UnsafeCell<mem::MaybeUninit<T>>,
   supplier: UnsafeCell<Option<F>>,
   state: LazyState,
}

impl<T, F> SyncLazy<T, F> {
   /// Creates a new, uncomputed cell owning `supplier`.
   #[inline]
   #[must_use]
   pub const fn new(supplier: F) -> Self {
      Self {
         state: LazyState::new(),
         value: UnsafeCell::new(mem::MaybeUninit::uninit()),
         supplier: UnsafeCell::new(Some(supplier)),
      }
   }

   /// Creates a cell that is already computed with `value`; no supplier is
   /// held and none will ever run.
   #[inline]
   #[must_use]
   pub const fn with_value(value: T) -> Self {
      Self {
         state: LazyState::computed(),
         value: UnsafeCell::new(mem::MaybeUninit::new(value)),
         supplier: UnsafeCell::new(None),
      }
   }

   /// Creates a cell from a maybe-absent supplier.
   ///
   /// Returns [`MissingSupplier`] for `None`; no cell exists afterwards.
   #[inline]
   pub fn from_supplier(supplier: Option<F>) -> Result<Self, MissingSupplier> {
      match supplier {
         Some(supplier) => Ok(Self::new(supplier)),
         None => Err(MissingSupplier),
      }
   }

   /// Whether the value has been computed.
   ///
   /// This method never blocks. A `true` result guarantees the value is
   /// visible to this thread.
   #[inline]
   pub fn is_computed(&self) -> bool {
      self.state.is_computed()
   }

   /// Returns the value if it has already been computed.
   ///
   /// Never runs the supplier and never blocks.
   #[inline]
   pub fn peek(&self) -> Option<&T> {
      if self.is_computed() {
         // SAFETY: COMPUTED was observed with acquire ordering, so the value
         // write is initialized and visible.
         Some(unsafe { self.value_unchecked() })
      } else {
         None
      }
   }

   /// # Safety
   ///
   /// The cell must be computed, observed via an acquire load of the state.
   #[inline]
   unsafe fn value_unchecked(&self) -> &T {
      debug_assert!(self.is_computed(), "value read before computation");
      (*self.value.get()).assume_init_ref()
   }
}

impl<T, F: FnMut() -> T> SyncLazy<T, F> {
   /// Returns the memoized value, computing it on first access.
   ///
   /// If the value is already computed this is a lock-free read. Otherwise
   /// the calling thread either runs the supplier itself or parks until the
   /// thread that won the race publishes the value. However many threads
   /// call `get` concurrently, the supplier runs once.
   ///
   /// A panicking supplier unwinds into the caller that ran it; the cell
   /// stays uncomputed and keeps the supplier, and the next `get` call
   /// attempts the computation again.
   #[inline]
   pub fn get(&self) -> &T {
      if let Some(value) = self.peek() {
         return value;
      }
      // Cold path: needs computation
      self.initialize();
      // SAFETY: initialize returns only once the cell is computed.
      unsafe { self.value_unchecked() }
   }

   /// Cold path for `get`. Enters the critical section and runs the supplier.
   #[cold]
   fn initialize(&self) {
      let Some(guard) = self.state.lock() else {
         return; // Another thread computed the value while we waited
      };
      // SAFETY: Holding the critical section grants exclusive access to both
      // the supplier and the value slot.
      let supplier = unsafe { &mut *self.supplier.get() };
      let value = (supplier
         .as_mut()
         .expect("supplier is retained until the first successful computation"))();
      // SAFETY: As above; the slot is written exactly once, before commit.
      unsafe { (*self.value.get()).write(value) };
      // The supplier is never needed again; drop what it captured.
      *supplier = None;
      guard.commit();
   }
}

impl<T, E, F: FnMut() -> Result<T, E>> SyncLazy<T, F> {
   /// Returns the memoized value, computing it with the fallible supplier on
   /// first access.
   ///
   /// An `Err` from the supplier propagates verbatim to the caller whose
   /// call ran it, and to any caller parked on the same attempt once it
   /// re-checks; the cell stays uncomputed and keeps the supplier, so the
   /// next call retries. After the first `Ok`, the value is memoized and
   /// this method can no longer fail.
   pub fn try_get(&self) -> Result<&T, E> {
      if let Some(value) = self.peek() {
         return Ok(value);
      }
      // Cold path: needs a computation attempt
      self.try_initialize()?;
      debug_assert!(self.is_computed());
      // SAFETY: try_initialize succeeded, so the cell is computed.
      Ok(unsafe { self.value_unchecked() })
   }

   /// Cold path for `try_get`. Enters the critical section and runs the
   /// fallible supplier.
   #[cold]
   fn try_initialize(&self) -> Result<(), E> {
      let Some(guard) = self.state.lock() else {
         return Ok(()); // Another thread computed the value while we waited
      };
      // SAFETY: Holding the critical section grants exclusive access to both
      // the supplier and the value slot.
      let supplier = unsafe { &mut *self.supplier.get() };
      // On Err the guard drops, resetting the state; the supplier stays put
      // for the next attempt.
      let value = (supplier
         .as_mut()
         .expect("supplier is retained until the first successful computation"))()?;
      // SAFETY: As above; the slot is written exactly once, before commit.
      unsafe { (*self.value.get()).write(value) };
      *supplier = None;
      guard.commit();
      Ok(())
   }
}

// --- Trait Implementations ---

impl<T, F: FnMut() -> T> LazyValue<T> for SyncLazy<T, F> {
   #[inline]
   fn get(&self) -> &T {
      SyncLazy::get(self)
   }
}

impl<T, F: FnMut() -> T> Deref for SyncLazy<T, F> {
   type Target = T;

   #[inline]
   fn deref(&self) -> &T {
      self.get()
   }
}

// SAFETY:
// Sharing a `&SyncLazy<T, F>` across threads hands out `&T` (requiring
// `T: Sync`) and lets whichever thread wins the race run and then drop the
// supplier, and drop the value it produced (requiring `F: Send` and
// `T: Send`). The state machine itself is thread-safe.
unsafe impl<T: Sync + Send, F: Send> Sync for SyncLazy<T, F> {}
// SAFETY:
// Moving the cell moves the supplier and the value with it.
unsafe impl<T: Send, F: Send> Send for SyncLazy<T, F> {}

impl<T: Default> Default for SyncLazy<T> {
   /// Creates an uncomputed cell whose supplier is `T::default`.
   #[inline]
   fn default() -> Self {
      Self::new(T::default)
   }
}

impl<T, F> From<T> for SyncLazy<T, F> {
   /// Creates an already-computed cell from the given value.
   #[inline]
   fn from(value: T) -> Self {
      Self::with_value(value)
   }
}

impl<T: fmt::Display, F> fmt::Display for SyncLazy<T, F> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self.peek() {
         Some(v) => fmt::Display::fmt(v, f),
         None => f.write_str("<uncomputed>"),
      }
   }
}

impl<T: fmt::Debug, F> fmt::Debug for SyncLazy<T, F> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let mut d = f.debug_tuple("SyncLazy");
      match self.peek() {
         Some(v) => d.field(v),
         None => d.field(&format_args!("<uncomputed>")),
      };
      d.finish()
   }
}

impl<T, F> Drop for SyncLazy<T, F> {
   #[inline]
   fn drop(&mut self) {
      if self.is_computed() {
         // SAFETY: We have exclusive access, the slot is initialized, and
         // nothing reads it after this.
         unsafe { self.value.get_mut().assume_init_drop() };
      }
   }
}
