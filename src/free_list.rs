//! Address-ordered singly linked list of free blocks.
//!
//! Nodes live inside the region itself and are referenced by byte offset, so
//! a node is just a [`Header`] whose first payload word holds the offset of
//! the next node.
//!
//! ```text
//!   head
//!    │
//!    ▼
//!   ┌──────┬──────┬────┐        ┌──────┬──────┬────┐        ┌──────┬──────┬────┐
//!   │ tag  │ size │next│──────▶ │ tag  │ size │next│──────▶ │ tag  │ size │NIL │
//!   └──────┴──────┴────┘        └──────┴──────┴────┘        └──────┴──────┴────┘
//!   low address                                                    high address
//! ```

use crate::{
  align::ALIGNMENT,
  header::{HEADER_SIZE, Header, read_link, write_link},
  region::Region,
};

/// Snapshot of one free node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreeNode {
  /// Offset of the node's header from the region base.
  pub offset: usize,
  /// Bytes available after the node's header.
  pub size: usize,
}

impl FreeNode {
  /// First offset past this node.
  pub fn end(&self) -> usize {
    self.offset + HEADER_SIZE + self.size
  }
}

pub struct FreeList {
  head: Option<usize>,
}

impl FreeList {
  pub const fn empty() -> Self {
    Self { head: None }
  }

  /// Installs a single node covering the whole region.
  pub fn seed(region: &mut Region) -> Self {
    Header::new(region.len() - HEADER_SIZE).write(region, 0);
    write_link(region, 0, None);

    Self { head: Some(0) }
  }

  pub fn iter<'a>(
    &self,
    region: &'a Region,
  ) -> Iter<'a> {
    Iter {
      region,
      current: self.head,
    }
  }

  /// Links a block of `size` payload bytes at `offset` in address order.
  ///
  /// Does not merge neighbours, call [`FreeList::coalesce`] afterwards.
  pub fn insert(
    &mut self,
    region: &mut Region,
    offset: usize,
    size: usize,
  ) {
    let mut prev = None;
    let mut current = self.head;

    while let Some(cur) = current {
      if cur > offset {
        break;
      }
      prev = Some(cur);
      current = read_link(region, cur);
    }

    Header::new(size).write(region, offset);
    write_link(region, offset, current);
    self.relink(region, prev, Some(offset));
  }

  /// Removes the node at `offset` to make room for a block of `footprint`
  /// bytes, splitting off the tail when enough is left over.
  ///
  /// Returns the payload size granted to the block, or `None` if no node
  /// starts at `offset` or the node is too small.
  pub fn take(
    &mut self,
    region: &mut Region,
    offset: usize,
    footprint: usize,
  ) -> Option<usize> {
    let mut prev = None;
    let mut current = self.head;

    while let Some(cur) = current {
      if cur == offset {
        break;
      }
      if cur > offset {
        return None;
      }
      prev = Some(cur);
      current = read_link(region, cur);
    }
    current?;

    let size = Header::read(region, offset).size;
    if size + HEADER_SIZE < footprint {
      return None;
    }
    let next = read_link(region, offset);

    match size.checked_sub(footprint) {
      Some(remainder) if remainder > ALIGNMENT => {
        let tail = offset + footprint;
        Header::new(remainder).write(region, tail);
        write_link(region, tail, next);
        self.relink(region, prev, Some(tail));
        Some(footprint - HEADER_SIZE)
      }
      _ => {
        self.relink(region, prev, next);
        Some(size)
      }
    }
  }

  /// Merges every pair of physically adjacent nodes. Returns the number of
  /// merges performed.
  pub fn coalesce(
    &mut self,
    region: &mut Region,
  ) -> usize {
    let mut merges = 0;
    let mut current = self.head;

    while let Some(cur) = current {
      let node = node_at(region, cur);

      match read_link(region, cur) {
        Some(next) if node.end() == next => {
          let absorbed = node_at(region, next);
          let after = read_link(region, next);

          Header::new(node.size + HEADER_SIZE + absorbed.size).write(region, cur);
          write_link(region, cur, after);
          merges += 1;
        }
        next => current = next,
      }
    }

    merges
  }

  /// The free node whose byte range covers `offset`.
  pub fn find_containing(
    &self,
    region: &Region,
    offset: usize,
  ) -> Option<FreeNode> {
    self
      .iter(region)
      .take_while(|node| node.offset <= offset)
      .find(|node| offset < node.end())
  }

  /// Sum of all free payload bytes.
  pub fn total(
    &self,
    region: &Region,
  ) -> usize {
    self.iter(region).map(|node| node.size).sum()
  }

  pub fn len(
    &self,
    region: &Region,
  ) -> usize {
    self.iter(region).count()
  }

  pub fn largest(
    &self,
    region: &Region,
  ) -> Option<FreeNode> {
    self.iter(region).max_by_key(|node| node.size)
  }

  fn relink(
    &mut self,
    region: &mut Region,
    prev: Option<usize>,
    next: Option<usize>,
  ) {
    match prev {
      Some(prev) => write_link(region, prev, next),
      None => self.head = next,
    }
  }
}

fn node_at(
  region: &Region,
  offset: usize,
) -> FreeNode {
  FreeNode {
    offset,
    size: Header::read(region, offset).size,
  }
}

/// Address-ordered walk over the free list.
#[derive(Clone)]
pub struct Iter<'a> {
  region: &'a Region,
  current: Option<usize>,
}

impl Iterator for Iter<'_> {
  type Item = FreeNode;

  fn next(&mut self) -> Option<Self::Item> {
    let offset = self.current?;
    self.current = read_link(self.region, offset);
    Some(node_at(self.region, offset))
  }
}
