use crate::region::Region;

/// Sentinel written into every header the allocator manages.
pub const TAG: u64 = 0x756D_616C_6C6F_6321;

/// Bytes taken by a header in front of every block.
pub const HEADER_SIZE: usize = 2 * size_of::<u64>();

/// Encoded "no next node" link.
const NIL: u64 = u64::MAX;

/// Metadata preceding each block's payload.
///
/// ```text
///   offset      offset + 8      offset + 16
///   ┌───────────┬───────────────┬──────────────────────────┐
///   │   size    │      tag      │  payload (size bytes)    │
///   └───────────┴───────────────┴──────────────────────────┘
///                               ▲
///                               └── pointer returned to user
/// ```
///
/// The tag sits right in front of the payload so that an underflowing write
/// is caught on the next `free`. Free nodes use the same header; their
/// forward link lives in the first payload word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
  pub size: usize,
  pub tag: u64,
}

impl Header {
  pub fn new(size: usize) -> Self {
    Self { size, tag: TAG }
  }

  pub fn read(
    region: &Region,
    offset: usize,
  ) -> Self {
    Self {
      size: region.read_word(offset) as usize,
      tag: region.read_word(offset + 8),
    }
  }

  pub fn write(
    self,
    region: &mut Region,
    offset: usize,
  ) {
    region.write_word(offset, self.size as u64);
    region.write_word(offset + 8, self.tag);
  }

  pub fn is_valid(&self) -> bool {
    self.tag == TAG
  }

  /// Header plus payload.
  pub fn footprint(&self) -> usize {
    HEADER_SIZE + self.size
  }
}

/// Reads the link of the free node at `offset`.
pub fn read_link(
  region: &Region,
  offset: usize,
) -> Option<usize> {
  match region.read_word(offset + HEADER_SIZE) {
    NIL => None,
    next => Some(next as usize),
  }
}

/// Writes the link of the free node at `offset`.
pub fn write_link(
  region: &mut Region,
  offset: usize,
  next: Option<usize>,
) {
  let raw = next.map_or(NIL, |next| next as u64);
  region.write_word(offset + HEADER_SIZE, raw);
}
