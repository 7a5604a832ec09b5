//! Memoizing lazy values, computed at most once on first demand.
//!
//! This crate provides two cells that own a supplier function and run it
//! lazily, exactly once on the first successful access:
//!
//! - [`UnsyncLazy<T, F>`]: a single-threaded cell with zero synchronization
//!   overhead. It is `!Sync`, so the single-threaded precondition is checked
//!   by the compiler.
//! - [`SyncLazy<T, F>`]: a thread-safe cell using double-checked
//!   initialization: a lock-free acquire load once the value exists, and
//!   `parking_lot`-style futex parking for threads that lose the race to
//!   compute it.
//!
//! Both implement the [`LazyValue`] contract and `Deref`, and both preserve
//! a deliberate recovery property: a supplier that fails (an error or a
//! panic) leaves the cell uncomputed with the supplier retained, and the
//! next access simply tries again. Only a successful computation consumes
//! the supplier and releases whatever it captured.
//!
//! # Features
//!
//! - **Lock-free fast path**: Reading a computed value is one atomic load.
//! - **Exactly-once computation**: However many threads race on a
//!   [`SyncLazy`], the supplier runs once.
//! - **Retry after failure**: Fallible suppliers ([`SyncLazy::try_get`])
//!   propagate their error verbatim and may be retried on the next call.
//! - **No heap allocation**: Value and supplier live inline in the cell.
//!
//! # Examples
//!
//! ## Shared lazy state
//!
//! ```rust
//! use poly_lazy::SyncLazy;
//!
//! static CONFIG: SyncLazy<String> = SyncLazy::new(|| "production".to_string());
//!
//! // Computed on first access, from whichever thread gets there first.
//! assert_eq!(CONFIG.get(), "production");
//! assert!(CONFIG.is_computed());
//! ```
//!
//! ## Single-threaded use
//!
//! ```rust
//! use poly_lazy::UnsyncLazy;
//!
//! let cell = UnsyncLazy::new(|| vec![1, 2, 3]);
//! assert!(!cell.is_computed());
//! assert_eq!(cell.get().len(), 3);
//! assert_eq!(cell.peek(), Some(&vec![1, 2, 3]));
//! ```

/// Shared access contract and construction errors.
mod lazy_value;

/// Internal synchronization state management.
mod state;

/// Thread-safe lazy cell.
mod sync_lazy;

/// Single-threaded lazy cell.
mod unsync_lazy;

pub use lazy_value::{LazyValue, MissingSupplier};
pub use sync_lazy::SyncLazy;
pub use unsync_lazy::UnsyncLazy;
