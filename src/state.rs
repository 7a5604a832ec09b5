//! Internal synchronization state for the thread-safe lazy cell.
//!
//! A single `AtomicU8` tracks the whole lifecycle of a [`SyncLazy`] instance,
//! with futex-style blocking via `parking_lot_core` for threads that lose the
//! race to compute. Layout:
//! - Bit 0: COMPUTED - the value slot holds the supplier's result
//! - Bit 1: LOCKED - a thread is inside the critical section
//! - Bit 2: WAITING - at least one thread is parked on this cell
//! - Bits 3-7: EPOCH - generation counter guarding parked waiters against ABA
//!
//! The COMPUTED bit is published with `Release` and observed with `Acquire`,
//! so a reader that sees it set also sees the value write that preceded it.
//! Reads of an already-computed cell therefore never touch the lock.
//!
//! [`SyncLazy`]: crate::SyncLazy

use core::mem;
use core::sync::atomic::{AtomicU8, Ordering};

use parking_lot_core::{DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN};

/// Atomic lifecycle state of one lazy cell.
#[repr(transparent)]
pub struct LazyState(AtomicU8);

impl LazyState {
   /// Bit flag: the cached value has been written.
   const COMPUTED: u8 = 1;
   /// Bit flag: a thread holds the critical section.
   const LOCKED: u8 = 2;
   /// Bit flag: at least one thread is parked waiting for the outcome.
   const WAITING: u8 = 4;
   /// Start of the epoch bits.
   const EPOCH_1: u8 = 8;
   /// Mask for the epoch bits.
   const EPOCH_MASK: u8 = !(Self::COMPUTED | Self::LOCKED | Self::WAITING);

   /// Next epoch value derived from the current state.
   #[inline(always)]
   const fn next_epoch(current_state: u8) -> u8 {
      (current_state & Self::EPOCH_MASK).wrapping_add(Self::EPOCH_1) & Self::EPOCH_MASK
   }

   /// State of a cell that has not been computed yet.
   #[inline]
   pub(crate) const fn new() -> Self {
      Self(AtomicU8::new(0))
   }

   /// State of a cell that was constructed already holding a value.
   #[inline]
   pub(crate) const fn computed() -> Self {
      Self(AtomicU8::new(Self::COMPUTED))
   }

   /// Wakes every thread parked on this cell.
   #[inline]
   fn notify_all(&self) {
      // SAFETY: The key passed to unpark must match the key used for park;
      // both are the address of our AtomicU8.
      unsafe {
         parking_lot_core::unpark_all(self.0.as_ptr() as usize, DEFAULT_UNPARK_TOKEN);
      }
   }

   /// Parks the calling thread until the state moves off `expected_state`.
   #[inline]
   fn wait(&self, expected_state: u8) {
      // SAFETY: See the key-matching comment in `notify_all`.
      unsafe {
         // park() re-validates the state before sleeping and only sleeps if
         // it is still `expected_state`; wake-ups may be spurious, the outer
         // loop re-checks.
         let _ = parking_lot_core::park(
            self.0.as_ptr() as usize,
            || self.0.load(Ordering::Acquire) == expected_state,
            || {},
            |_, _| {},
            DEFAULT_PARK_TOKEN,
            None,
         );
      }
   }

   /// Marks the cell computed, bumps the epoch and wakes waiters.
   ///
   /// Must only be called while holding the critical section (via
   /// [`ComputeGuard`]). The `Release` swap publishes the value write that
   /// happened before it.
   #[inline]
   pub(crate) fn set_computed(&self) {
      // Relaxed read is fine for the epoch math; the swap below is the
      // synchronizing operation.
      let current_state = self.0.load(Ordering::Relaxed);
      let new_state = Self::COMPUTED | Self::next_epoch(current_state);

      let prev_state = self.0.swap(new_state, Ordering::Release);
      if prev_state & Self::WAITING != 0 {
         self.notify_all();
      }
   }

   /// Clears LOCKED (and WAITING), bumps the epoch and wakes waiters, leaving
   /// the cell not computed.
   ///
   /// This is the failed-attempt path: the next `lock()` caller gets to run
   /// the supplier again.
   #[inline]
   pub(crate) fn reset(&self) {
      let current_state = self.0.load(Ordering::Relaxed);
      let new_state = Self::next_epoch(current_state);

      let prev_state = self.0.swap(new_state, Ordering::Release);
      if prev_state & Self::WAITING != 0 {
         self.notify_all();
      }
   }

   /// Whether the COMPUTED bit is set.
   ///
   /// `Acquire`: a `true` result synchronizes with the `Release` in
   /// `set_computed`, so the caller may read the value slot.
   #[inline]
   pub(crate) fn is_computed(&self) -> bool {
      self.0.load(Ordering::Acquire) & Self::COMPUTED != 0
   }

   /// One attempt to enter the critical section.
   ///
   /// Returns:
   ///   - `Ok(None)`: the cell is already computed.
   ///   - `Ok(Some(guard))`: critical section acquired.
   ///   - `Err(state)`: another thread holds it; `state` is the observed
   ///     value (with WAITING set) to park against.
   #[inline]
   fn lock_step(&self) -> Result<Option<ComputeGuard<'_>>, u8> {
      loop {
         let current_state = self.0.load(Ordering::Acquire);
         if current_state & Self::COMPUTED != 0 {
            return Ok(None);
         }

         if current_state & Self::LOCKED == 0 {
            let new_state = current_state | Self::LOCKED;
            match self.0.compare_exchange_weak(
               current_state,
               new_state,
               Ordering::Acquire,
               Ordering::Relaxed,
            ) {
               Ok(_) => return Ok(Some(ComputeGuard::new(self))),
               Err(_) => {
                  std::hint::spin_loop();
                  continue;
               }
            }
         }

         // Locked by someone else; make sure WAITING is set before parking so
         // the holder knows to wake us.
         if current_state & Self::WAITING == 0 {
            let new_state = current_state | Self::WAITING;
            match self.0.compare_exchange_weak(
               current_state,
               new_state,
               Ordering::Relaxed,
               Ordering::Relaxed,
            ) {
               Ok(_) => return Err(new_state),
               Err(_) => {
                  // State moved under us (possibly to COMPUTED); retry.
                  std::hint::spin_loop();
                  continue;
               }
            }
         }
         return Err(current_state);
      }
   }

   /// Enters the critical section, parking while another thread computes.
   ///
   /// Returns `Some(guard)` if this thread must run the supplier, or `None`
   /// if the cell became computed while acquiring.
   #[inline]
   pub(crate) fn lock(&self) -> Option<ComputeGuard<'_>> {
      match self.lock_step() {
         Ok(guard_opt) => guard_opt,
         Err(mut state_when_failed) => loop {
            self.wait(state_when_failed);
            match self.lock_step() {
               Ok(guard_opt) => return guard_opt,
               Err(new_state) => {
                  state_when_failed = new_state;
               }
            }
         },
      }
   }
}

/// RAII handle over the LOCKED state.
///
/// `commit()` marks the cell computed. Dropping the guard without committing
/// (supplier returned an error or panicked) resets the cell to not computed
/// and wakes waiters, so the next caller retries.
pub struct ComputeGuard<'a> {
   state: &'a LazyState,
}

impl<'a> ComputeGuard<'a> {
   /// Wraps an already-acquired LOCKED state.
   #[inline(always)]
   pub(crate) const fn new(state: &'a LazyState) -> Self {
      Self { state }
   }

   /// Publishes the computed value and consumes the guard.
   #[inline(always)]
   pub(crate) fn commit(self) {
      self.state.set_computed();
      mem::forget(self); // Drop would reset the state we just published.
   }
}

impl Drop for ComputeGuard<'_> {
   /// Failed attempt: release the critical section without publishing.
   #[inline(always)]
   fn drop(&mut self) {
      self.state.reset();
   }
}
