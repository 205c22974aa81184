use std::ptr;

use umalloc::{HeapConfig, Stats, global};

/// Prints the statistics snapshot, the one thing the allocator leaves to us.
fn print_stats(label: &str) {
  let Some(Stats {
    allocations,
    deallocations,
    allocated_bytes,
    free_bytes,
    fragmentation,
  }) = global::stats()
  else {
    println!("[{label}] heap not initialized");
    return;
  };

  println!(
    "[{label}] allocations = {allocations}, deallocations = {deallocations}, \
     allocated = {allocated_bytes} B, free = {free_bytes} B, fragmentation = {fragmentation:.2}%"
  );
}

fn main() {
  // UMALLOC_REGION_SIZE and UMALLOC_STRATEGY override the defaults.
  let config = HeapConfig::from_env();

  // --------------------------------------------------------------------
  // 1) Map the heap. A second init is refused.
  // --------------------------------------------------------------------
  global::init(config.region_size, config.strategy).unwrap();
  println!("[1] Heap of {} bytes using {}", config.region_size, config.strategy);

  if let Err(err) = global::init(config.region_size, config.strategy) {
    println!("[1] Second init refused: {err}");
  }

  // --------------------------------------------------------------------
  // 2) Two allocations.
  // --------------------------------------------------------------------
  let first = global::alloc(16);
  let second = global::alloc(32);
  println!("\n[2] first = {first:?}, second = {second:?}");

  unsafe { ptr::write_bytes(second, 0xAB, 32) };
  print_stats("2");

  // --------------------------------------------------------------------
  // 3) Free the first block, then grow the second one. The payload moves
  //    but its bytes come along.
  // --------------------------------------------------------------------
  global::free(first);
  let grown = global::realloc(second, 64);
  println!("\n[3] second moved from {second:?} to {grown:?}, first byte = {:#X}", unsafe {
    *grown
  });
  print_stats("3");

  // --------------------------------------------------------------------
  // 4) A larger allocation reuses the space released so far.
  // --------------------------------------------------------------------
  let large = global::alloc(128);
  println!("\n[4] large = {large:?}");
  print_stats("4");

  // --------------------------------------------------------------------
  // 5) Release everything. Freeing `first` again here would abort the
  //    process with a double-free report.
  // --------------------------------------------------------------------
  global::free(grown);
  global::free(large);
  print_stats("5");
}
