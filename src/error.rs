//! Allocator error types.

use std::error::Error;
use std::fmt;

/// Errors reported by the allocator.
///
/// Configuration errors leave the allocator untouched and can be handled by
/// the caller. Integrity violations and a missing backing region are fatal,
/// see [`AllocError::is_fatal`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
  /// `init` was called on an allocator that already owns a region.
  AlreadyInitialized,
  /// The requested region size is zero or cannot be page-rounded.
  InvalidSize {
    /// Number of bytes requested.
    requested: usize,
  },
  /// The OS refused to map the backing region.
  RegionUnavailable {
    /// Page-rounded length that was requested.
    len: usize,
    /// `errno` reported by `mmap`.
    errno: i32,
  },
  /// The header in front of a pointer does not carry the sentinel tag.
  Corruption {
    /// Payload address passed by the caller.
    addr: usize,
  },
  /// The pointer refers to a block that is already on the free list.
  DoubleFree {
    /// Payload address passed by the caller.
    addr: usize,
  },
}

impl AllocError {
  /// Whether the error leaves no safe way to continue.
  pub fn is_fatal(&self) -> bool {
    matches!(
      self,
      Self::RegionUnavailable { .. } | Self::Corruption { .. } | Self::DoubleFree { .. }
    )
  }
}

impl fmt::Display for AllocError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      Self::AlreadyInitialized => write!(f, "allocator already initialized"),
      Self::InvalidSize { requested } => {
        write!(f, "invalid region size: {requested} bytes")
      }
      Self::RegionUnavailable { len, errno } => {
        write!(f, "unable to map a {len} byte region (errno {errno})")
      }
      Self::Corruption { addr } => {
        write!(f, "memory corruption detected at block {addr:#x}")
      }
      Self::DoubleFree { addr } => {
        write!(f, "double free detected at block {addr:#x}")
      }
    }
  }
}

impl Error for AllocError {}
