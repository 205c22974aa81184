//! Placement policies choosing which free node serves a request.

use std::{fmt, str::FromStr};

use crate::{
  free_list::{FreeList, FreeNode},
  region::Region,
};

/// Block selection policy, fixed for the lifetime of an allocator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
  /// First node in address order that fits.
  FirstFit,
  /// Smallest node that fits.
  #[default]
  BestFit,
  /// Largest node that fits.
  WorstFit,
  /// First fit, resuming after the previously returned block.
  NextFit,
}

impl Strategy {
  pub const ALL: [Strategy; 4] = [
    Strategy::FirstFit,
    Strategy::BestFit,
    Strategy::WorstFit,
    Strategy::NextFit,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Strategy::FirstFit => "first-fit",
      Strategy::BestFit => "best-fit",
      Strategy::WorstFit => "worst-fit",
      Strategy::NextFit => "next-fit",
    }
  }
}

impl fmt::Display for Strategy {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Returned when a strategy name is not recognized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownStrategy(pub String);

impl fmt::Display for UnknownStrategy {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "unknown allocation strategy: {:?}", self.0)
  }
}

impl std::error::Error for UnknownStrategy {}

impl FromStr for Strategy {
  type Err = UnknownStrategy;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalized = s.trim().to_ascii_lowercase().replace('_', "-");

    Strategy::ALL
      .into_iter()
      .find(|strategy| strategy.name() == normalized)
      .ok_or_else(|| UnknownStrategy(s.to_owned()))
  }
}

/// A strategy plus the state it carries between calls.
#[derive(Clone, Debug)]
pub struct Placement {
  strategy: Strategy,
  cursor: Option<usize>,
}

impl Placement {
  pub const fn new(strategy: Strategy) -> Self {
    Self {
      strategy,
      cursor: None,
    }
  }

  pub fn strategy(&self) -> Strategy {
    self.strategy
  }

  /// Offset of the block last returned by next-fit.
  pub fn cursor(&self) -> Option<usize> {
    self.cursor
  }

  /// Picks a free node able to hold `footprint` bytes without touching the
  /// list.
  pub fn select(
    &mut self,
    list: &FreeList,
    region: &Region,
    footprint: usize,
  ) -> Option<FreeNode> {
    let mut fits = list.iter(region).filter(|node| node.size >= footprint);

    match self.strategy {
      Strategy::FirstFit => fits.next(),
      Strategy::BestFit => fits.min_by_key(|node| node.size),
      Strategy::WorstFit => fits.reduce(|worst, node| if node.size > worst.size { node } else { worst }),
      Strategy::NextFit => {
        let chosen = match self.cursor {
          Some(cursor) => fits.clone().find(|node| node.offset > cursor).or_else(|| fits.next()),
          None => fits.next(),
        };

        if let Some(node) = chosen {
          self.cursor = Some(node.offset);
        }
        chosen
      }
    }
  }
}
