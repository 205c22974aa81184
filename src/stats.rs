//! Allocation counters and the snapshot handed to presenters.

/// Running totals updated by every allocator call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counters {
  pub allocations: usize,
  pub deallocations: usize,
  /// Footprint (header + payload) of every live block.
  pub allocated_bytes: usize,
}

impl Counters {
  pub fn record_alloc(
    &mut self,
    footprint: usize,
  ) {
    self.allocations += 1;
    self.allocated_bytes += footprint;
  }

  pub fn record_free(
    &mut self,
    footprint: usize,
  ) {
    self.deallocations += 1;
    self.allocated_bytes -= footprint;
  }
}

/// Point-in-time view of the allocator. Formatting is left to the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Stats {
  pub allocations: usize,
  pub deallocations: usize,
  pub allocated_bytes: usize,
  /// Region size minus `allocated_bytes`.
  pub free_bytes: usize,
  /// Share of free bytes sitting in nodes smaller than half the largest one,
  /// as a percentage.
  pub fragmentation: f64,
}

impl Stats {
  pub fn new(
    counters: Counters,
    region_len: usize,
    fragmentation: f64,
  ) -> Self {
    Self {
      allocations: counters.allocations,
      deallocations: counters.deallocations,
      allocated_bytes: counters.allocated_bytes,
      free_bytes: region_len - counters.allocated_bytes,
      fragmentation,
    }
  }
}

/// Fragmentation heuristic over the sizes of the free nodes.
///
/// Finds the largest node, sums every node smaller than half of it and
/// returns that sum as a percentage of all free bytes. An empty list, or one
/// holding a single node, yields 0.
pub fn fragmentation<I>(sizes: I) -> f64
where
  I: IntoIterator<Item = usize>,
  I::IntoIter: Clone,
{
  let sizes = sizes.into_iter();

  let largest = sizes.clone().max().unwrap_or(0);
  let total: usize = sizes.clone().sum();

  if total == 0 {
    return 0.0;
  }

  let fragmented: usize = sizes.filter(|&size| size < largest / 2).sum();

  fragmented as f64 * 100.0 / total as f64
}
