use std::sync::atomic::{AtomicUsize, Ordering};

use poly_lazy::SyncLazy;

static COUNTER: AtomicUsize = AtomicUsize::new(0);
static DATA: SyncLazy<String> = SyncLazy::new(|| {
   // This supplier runs only once, on whichever thread asks first
   COUNTER.fetch_add(1, Ordering::Relaxed);
   println!("Computing data...");
   // Simulate work
   std::thread::sleep(std::time::Duration::from_millis(50));
   "Expensive data".to_string()
});

fn main() {
   let threads: Vec<_> = (0..10)
      .map(|_| {
         std::thread::spawn(|| {
            println!("Thread access: {}", DATA.get());
         })
      })
      .collect();

   for t in threads {
      t.join().unwrap();
   }

   assert_eq!(DATA.peek(), Some(&"Expensive data".to_string()));
   assert_eq!(COUNTER.load(Ordering::Relaxed), 1); // Supplier ran only once
   println!("Final data: {}", DATA.get());
}
