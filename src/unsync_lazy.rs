//! Single-threaded lazy cell.
//!
//! [`UnsyncLazy<T, F>`] is the uncontended sibling of
//! [`SyncLazy`](crate::SyncLazy): the supplier is owned from construction,
//! runs at most once, and the value is cached for the cell's lifetime, but
//! there are no atomics and no lock. The type is `!Sync`, so the "single-threaded
//! access only" precondition is enforced by the compiler instead of by
//! documentation.

use core::cell::{RefCell, UnsafeCell};
use core::fmt;
use core::ops::Deref;

use crate::lazy_value::{LazyValue, MissingSupplier};

/// A single-threaded, memoizing lazy value.
///
/// The value slot doubles as the computed flag: `None` until the supplier
/// has run successfully, `Some` forever after. A failed attempt (`Err` from
/// [`try_get`](UnsyncLazy::try_get), or a panic) leaves the slot `None` and
/// the supplier in place, so the next call retries.
///
/// Calling back into the same cell from inside its own supplier panics
/// rather than corrupting the cell.
///
/// # Examples
///
/// ```rust
/// use poly_lazy::UnsyncLazy;
///
/// let mut runs = 0;
/// let cell = UnsyncLazy::new(move || {
///    runs += 1;
///    runs * 42
/// });
/// assert_eq!(*cell.get(), 42);
/// assert_eq!(*cell.get(), 42); // supplier did not run again
/// ```
pub struct UnsyncLazy<T, F = fn() -> T> {
   value: UnsafeCell<Option<T>>,
   supplier: RefCell<Option<F>>,
}

impl<T, F> UnsyncLazy<T, F> {
   /// Creates a new, uncomputed cell owning `supplier`.
   #[inline]
   #[must_use]
   pub const fn new(supplier: F) -> Self {
      Self {
         value: UnsafeCell::new(None),
         supplier: RefCell::new(Some(supplier)),
      }
   }

   /// Creates a cell that is already computed with `value`; no supplier is
   /// held and none will ever run.
   #[inline]
   #[must_use]
   pub const fn with_value(value: T) -> Self {
      Self {
         value: UnsafeCell::new(Some(value)),
         supplier: RefCell::new(None),
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
   #[inline]
   pub fn is_computed(&self) -> bool {
      self.peek().is_some()
   }

   /// Returns the value if it has already been computed, without running the
   /// supplier.
   #[inline]
   pub fn peek(&self) -> Option<&T> {
      // SAFETY: The slot moves `None` -> `Some` exactly once and the payload
      // is never written again, so the returned reference stays valid for as
      // long as the cell is borrowed.
      unsafe { (*self.value.get()).as_ref() }
   }
}

impl<T, F: FnMut() -> T> UnsyncLazy<T, F> {
   /// Returns the memoized value, computing it on first access.
   ///
   /// The first call runs the supplier, caches its result and drops the
   /// supplier; every later call returns the cached value. A panicking
   /// supplier leaves the cell uncomputed with the supplier intact, so the
   /// next call attempts the computation again.
   #[inline]
   pub fn get(&self) -> &T {
      if let Some(value) = self.peek() {
         return value;
      }
      // Cold path: needs computation
      self.initialize();
      self.peek().expect("cell is computed once initialize returns")
   }

   /// Cold path for `get`.
   #[cold]
   fn initialize(&self) {
      // Dynamic borrow: a supplier that re-enters this cell panics here
      // instead of aliasing the slot.
      let mut supplier = self.supplier.borrow_mut();
      let value = (supplier
         .as_mut()
         .expect("supplier is retained until the first successful computation"))();
      // SAFETY: The slot is `None`, so no reference into it exists.
      unsafe { *self.value.get() = Some(value) };
      // The supplier is never needed again; drop what it captured.
      *supplier = None;
   }
}

impl<T, E, F: FnMut() -> Result<T, E>> UnsyncLazy<T, F> {
   /// Returns the memoized value, computing it with the fallible supplier on
   /// first access.
   ///
   /// An `Err` propagates verbatim and leaves the cell uncomputed with the
   /// supplier retained, so the next call retries. After the first `Ok`, the
   /// value is memoized and this method can no longer fail.
   pub fn try_get(&self) -> Result<&T, E> {
      if let Some(value) = self.peek() {
         return Ok(value);
      }
      // Cold path: needs a computation attempt
      self.try_initialize()?;
      Ok(self.peek().expect("cell is computed once try_initialize returns"))
   }

   /// Cold path for `try_get`.
   #[cold]
   fn try_initialize(&self) -> Result<(), E> {
      let mut supplier = self.supplier.borrow_mut();
      // On Err the slot stays `None` and the supplier stays put.
      let value = (supplier
         .as_mut()
         .expect("supplier is retained until the first successful computation"))()?;
      // SAFETY: The slot is `None`, so no reference into it exists.
      unsafe { *self.value.get() = Some(value) };
      *supplier = None;
      Ok(())
   }
}

// --- Trait Implementations ---

impl<T, F: FnMut() -> T> LazyValue<T> for UnsyncLazy<T, F> {
   #[inline]
   fn get(&self) -> &T {
      UnsyncLazy::get(self)
   }
}

impl<T, F: FnMut() -> T> Deref for UnsyncLazy<T, F> {
   type Target = T;

   #[inline]
   fn deref(&self) -> &T {
      self.get()
   }
}

impl<T: Default> Default for UnsyncLazy<T> {
   /// Creates an uncomputed cell whose supplier is `T::default`.
   #[inline]
   fn default() -> Self {
      Self::new(T::default)
   }
}

impl<T, F> From<T> for UnsyncLazy<T, F> {
   /// Creates an already-computed cell from the given value.
   #[inline]
   fn from(value: T) -> Self {
      Self::with_value(value)
   }
}

impl<T: fmt::Display, F> fmt::Display for UnsyncLazy<T, F> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self.peek() {
         Some(v) => fmt::Display::fmt(v, f),
         None => f.write_str("<uncomputed>"),
      }
   }
}

impl<T: fmt::Debug, F> fmt::Debug for UnsyncLazy<T, F> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let mut d = f.debug_tuple("UnsyncLazy");
      match self.peek() {
         Some(v) => d.field(v),
         None => d.field(&format_args!("<uncomputed>")),
      };
      d.finish()
   }
}
