use poly_lazy::SyncLazy;

fn main() {
   let mut attempts = 0;
   let data = SyncLazy::new(move || -> Result<String, String> {
      attempts += 1;
      println!("Attempt #{attempts}...");
      if attempts == 1 {
         Err(format!("attempt #{attempts} failed"))
      } else {
         Ok("Successfully computed".to_string())
      }
   });

   // First attempt fails; the cell stays uncomputed and keeps the supplier.
   match data.try_get() {
      Ok(_) => panic!("Should have failed"),
      Err(e) => println!("Caught error: {e}"),
   }
   assert!(!data.is_computed());

   // Second attempt succeeds and memoizes.
   match data.try_get() {
      Ok(value) => println!("Got: {value}"),
      Err(_) => panic!("Should have succeeded"),
   }
   assert!(data.is_computed());

   // Later calls return the cached value without touching the supplier.
   match data.try_get() {
      Ok(value) => println!("Got again: {value}"),
      Err(_) => panic!("Should have returned the cached value"),
   }
}
