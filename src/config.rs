//! Heap configuration.

use std::env;

use crate::{region::page_size, strategy::Strategy};

/// Environment variable holding the region size in bytes.
pub const REGION_SIZE_VAR: &str = "UMALLOC_REGION_SIZE";

/// Environment variable holding the strategy name, e.g. `next-fit`.
pub const STRATEGY_VAR: &str = "UMALLOC_STRATEGY";

/// Parameters for [`Allocator::init_with`](crate::Allocator::init_with).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeapConfig {
  /// Requested region size. Rounded up to the page size at init.
  pub region_size: usize,
  pub strategy: Strategy,
}

impl HeapConfig {
  pub fn new(
    region_size: usize,
    strategy: Strategy,
  ) -> Self {
    Self {
      region_size,
      strategy,
    }
  }

  /// Reads [`REGION_SIZE_VAR`] and [`STRATEGY_VAR`], keeping the defaults for
  /// anything missing or malformed.
  pub fn from_env() -> Self {
    Self::from_lookup(|key| env::var(key).ok())
  }

  fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
    let mut config = Self::default();

    if let Some(raw) = lookup(REGION_SIZE_VAR) {
      match raw.trim().parse() {
        Ok(size) => config.region_size = size,
        Err(err) => log::warn!("ignoring {REGION_SIZE_VAR}={raw:?}: {err}"),
      }
    }

    if let Some(raw) = lookup(STRATEGY_VAR) {
      match raw.parse() {
        Ok(strategy) => config.strategy = strategy,
        Err(err) => log::warn!("ignoring {STRATEGY_VAR}: {err}"),
      }
    }

    config
  }
}

impl Default for HeapConfig {
  fn default() -> Self {
    Self::new(page_size(), Strategy::default())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
    move |key| {
      pairs
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
    }
  }

  #[test]
  fn defaults_to_one_page_best_fit() {
    let config = HeapConfig::from_lookup(lookup(&[]));
    assert_eq!(config, HeapConfig::new(page_size(), Strategy::BestFit));
  }

  #[test]
  fn reads_overrides() {
    let config = HeapConfig::from_lookup(lookup(&[
      (REGION_SIZE_VAR, "65536"),
      (STRATEGY_VAR, "next-fit"),
    ]));
    assert_eq!(config, HeapConfig::new(65536, Strategy::NextFit));
  }

  #[test]
  fn malformed_values_fall_back() {
    let config = HeapConfig::from_lookup(lookup(&[
      (REGION_SIZE_VAR, "lots"),
      (STRATEGY_VAR, "buddy"),
    ]));
    assert_eq!(config, HeapConfig::default());
  }
}
