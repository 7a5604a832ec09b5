use std::cell::Cell;

use poly_lazy::UnsyncLazy;

fn main() {
   let runs = Cell::new(0);
   let answer = UnsyncLazy::new(|| {
      runs.set(runs.get() + 1);
      println!("Computing the answer...");
      42
   });

   println!("Nothing computed yet: {answer:?}");
   assert!(!answer.is_computed());

   for _ in 0..3 {
      println!("Answer: {}", answer.get());
   }

   assert_eq!(runs.get(), 1); // Supplier ran only once
   println!("Final state: {answer:?}");
}
