use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use poly_lazy::{LazyValue, MissingSupplier, SyncLazy};

#[test]
fn test_new_is_not_computed() {
   let lazy: SyncLazy<i32> = SyncLazy::new(|| 5);
   assert!(!lazy.is_computed());
   assert_eq!(lazy.peek(), None);
}

#[test]
fn test_with_value_is_computed() {
   let lazy: SyncLazy<i32> = SyncLazy::with_value(42);
   assert!(lazy.is_computed());
   assert_eq!(lazy.peek(), Some(&42));
   assert_eq!(*lazy.get(), 42);
}

#[test]
fn test_peek_never_computes() {
   let counter = Arc::new(AtomicUsize::new(0));
   let lazy: SyncLazy<i32, _> = SyncLazy::new({
      let counter = Arc::clone(&counter);
      move || {
         counter.fetch_add(1, Ordering::SeqCst);
         42
      }
   });
   assert_eq!(lazy.peek(), None);
   assert_eq!(lazy.peek(), None);
   assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn test_sequential_gets_run_supplier_once() {
   let counter = Arc::new(AtomicUsize::new(0));
   let lazy = SyncLazy::new({
      let counter = Arc::clone(&counter);
      move || {
         counter.fetch_add(1, Ordering::SeqCst);
         99
      }
   });

   let v1 = *lazy.get();
   let v2 = *lazy.get();
   let v3 = *lazy.get();

   assert_eq!(v1, 99);
   assert_eq!(v2, 99);
   assert_eq!(v3, 99);
   assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_get_returns_the_same_instance() {
   let lazy = SyncLazy::new(|| String::from("cached"));
   let first = lazy.get();
   let second = lazy.get();
   // Memoization hands out the one stored value, not a copy.
   assert!(std::ptr::eq(first, second));
}

#[test]
fn test_supports_absent_values() {
   // A supplier legitimately producing "no value" is distinct from the
   // cell's own not-yet-computed state.
   let lazy: SyncLazy<Option<String>, _> = SyncLazy::new(|| None);
   assert!(!lazy.is_computed());
   assert_eq!(lazy.get(), &None);
   assert!(lazy.is_computed());
   assert_eq!(lazy.get(), &None);
   assert_eq!(lazy.peek(), Some(&None));
}

#[test]
fn test_from_supplier_rejects_absent() {
   let lazy = SyncLazy::<i32, fn() -> i32>::from_supplier(None);
   assert_eq!(lazy.err(), Some(MissingSupplier));
}

#[test]
fn test_from_supplier_accepts_present() {
   let lazy = SyncLazy::<i32, fn() -> i32>::from_supplier(Some(|| 7)).unwrap();
   assert_eq!(*lazy.get(), 7);
}

#[test]
fn test_concurrent_gets_run_supplier_once() {
   let counter = Arc::new(AtomicUsize::new(0));
   let lazy = Arc::new(SyncLazy::new({
      let counter = Arc::clone(&counter);
      move || {
         counter.fetch_add(1, Ordering::SeqCst);
         // Hold the critical section long enough for every thread to queue up.
         thread::sleep(Duration::from_millis(50));
         777
      }
   }));

   let threads: Vec<_> = (0..10)
      .map(|_| {
         let lazy = Arc::clone(&lazy);
         thread::spawn(move || *lazy.get())
      })
      .collect();

   // Every thread observes the one computed value
   for handle in threads {
      assert_eq!(handle.join().unwrap(), 777);
   }
   assert_eq!(lazy.peek(), Some(&777));
   // and the supplier ran exactly once despite the race.
   assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failed_attempt_retries_on_next_call() {
   // Retry-after-failure is a deliberate contract: the computed flag is only
   // set after a successful run, so an Err leaves the cell eligible for
   // another attempt.
   let counter = Arc::new(AtomicUsize::new(0));
   let lazy = SyncLazy::new({
      let counter = Arc::clone(&counter);
      move || {
         if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Err("first attempt fails")
         } else {
            Ok(5)
         }
      }
   });

   assert_eq!(lazy.try_get(), Err("first attempt fails"));
   assert!(!lazy.is_computed());
   assert_eq!(counter.load(Ordering::SeqCst), 1);

   // Second call re-invokes the supplier and memoizes its Ok.
   assert_eq!(lazy.try_get(), Ok(&5));
   assert!(lazy.is_computed());

   // From here on the supplier is gone; no further invocations.
   assert_eq!(lazy.try_get(), Ok(&5));
   assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn test_panicking_supplier_retries_on_next_call() {
   let counter = Arc::new(AtomicUsize::new(0));
   let lazy = Arc::new(SyncLazy::new({
      let counter = Arc::clone(&counter);
      move || {
         if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("supplier blew up");
         }
         42
      }
   }));

   // First attempt panics on its own thread; the cell must reset itself.
   let attempt = {
      let lazy = Arc::clone(&lazy);
      thread::spawn(move || *lazy.get()).join()
   };
   assert!(attempt.is_err());
   assert!(!lazy.is_computed());

   // The supplier survived the failed attempt and runs again.
   assert_eq!(*lazy.get(), 42);
   assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn test_supplier_dropped_after_computation() {
   // Once the value exists the supplier is released, together with anything
   // it captured.
   let resource = Arc::new(());
   let lazy = SyncLazy::new({
      let resource = Arc::clone(&resource);
      move || Arc::strong_count(&resource)
   });

   assert_eq!(Arc::strong_count(&resource), 2);
   assert_eq!(*lazy.get(), 2);
   assert_eq!(Arc::strong_count(&resource), 1);
}

#[test]
fn test_waiters_observe_winner_value() {
   // Threads that lose the race must block until the winner commits, then
   // read the winner's value without re-running the supplier.
   let counter = Arc::new(AtomicUsize::new(0));
   let lazy = Arc::new(SyncLazy::new({
      let counter = Arc::clone(&counter);
      move || {
         counter.fetch_add(1, Ordering::SeqCst);
         thread::sleep(Duration::from_millis(20));
         String::from("winner")
      }
   }));

   let threads: Vec<_> = (0..4)
      .map(|_| {
         let lazy = Arc::clone(&lazy);
         thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            lazy.get().clone()
         })
      })
      .collect();

   for handle in threads {
      assert_eq!(handle.join().unwrap(), "winner");
   }
   assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_static_cell() {
   static CELL: SyncLazy<String> = SyncLazy::new(|| "static data".to_string());

   let threads: Vec<_> = (0..4).map(|_| thread::spawn(|| CELL.get().len())).collect();
   for handle in threads {
      assert_eq!(handle.join().unwrap(), "static data".len());
   }
   assert_eq!(CELL.peek(), Some(&"static data".to_string()));
}

#[test]
fn test_lazy_value_contract() {
   fn read_twice<T, L: LazyValue<T>>(lazy: &L) -> (&T, &T) {
      (lazy.get(), lazy.get())
   }

   let lazy = SyncLazy::new(|| 31_u64);
   let (a, b) = read_twice(&lazy);
   assert_eq!((*a, *b), (31, 31));
   assert!(std::ptr::eq(a, b));
}

#[test]
fn test_deref() {
   let lazy = SyncLazy::new(|| vec![1, 2, 3]);
   assert_eq!(lazy.len(), 3);
   assert_eq!(lazy.get()[1], 2);
}

#[test]
fn test_default() {
   let lazy: SyncLazy<Vec<i32>> = SyncLazy::default();
   assert!(!lazy.is_computed());
   assert!(lazy.get().is_empty());
}

#[test]
fn test_from_value() {
   let lazy: SyncLazy<i32> = SyncLazy::from(9);
   assert!(lazy.is_computed());
   assert_eq!(*lazy.get(), 9);
}

#[test]
fn test_debug_and_display() {
   let lazy: SyncLazy<i32> = SyncLazy::new(|| 5);
   assert_eq!(format!("{lazy:?}"), "SyncLazy(<uncomputed>)");
   assert_eq!(format!("{lazy}"), "<uncomputed>");
   lazy.get();
   assert_eq!(format!("{lazy:?}"), "SyncLazy(5)");
   assert_eq!(format!("{lazy}"), "5");
}

#[test]
fn test_missing_supplier_message() {
   assert_eq!(
      MissingSupplier.to_string(),
      "cannot construct a lazy cell without a supplier"
   );
}
