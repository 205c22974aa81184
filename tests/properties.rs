use std::{ptr::NonNull, slice};

use proptest::prelude::*;
use umalloc::{Allocator, HEADER_SIZE, Strategy as Fit};

#[derive(Clone, Debug)]
enum Op {
  Alloc(usize),
  Free(usize),
  Realloc(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
  prop_oneof![
    3 => (0usize..600).prop_map(Op::Alloc),
    2 => any::<usize>().prop_map(Op::Free),
    1 => (any::<usize>(), 0usize..900).prop_map(|(i, size)| Op::Realloc(i, size)),
  ]
}

fn any_fit() -> impl Strategy<Value = Fit> {
  prop::sample::select(Fit::ALL.to_vec())
}

/// A live block and the marker byte written over its first `len` bytes.
#[derive(Clone, Copy, Debug)]
struct Live {
  ptr: NonNull<u8>,
  marker: u8,
  len: usize,
}

impl Live {
  fn intact(&self) -> bool {
    let bytes = unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) };
    bytes.iter().all(|&b| b == self.marker)
  }
}

/// Live blocks must not overlap each other or their neighbours' headers, and
/// every byte of the region is either in a live block or on the free list.
fn check_invariants(
  allocator: &Allocator,
  live: &[Live],
) {
  let mut ranges: Vec<_> = live
    .iter()
    .map(|block| {
      let start = block.ptr.as_ptr() as usize;
      (start, start + allocator.payload_size(block.ptr.as_ptr()).unwrap())
    })
    .collect();
  ranges.sort();

  for pair in ranges.windows(2) {
    assert!(pair[0].1 + HEADER_SIZE <= pair[1].0, "overlap: {pair:?}");
  }

  let free = allocator.free_blocks();
  for pair in free.windows(2) {
    assert!(pair[0].end() < pair[1].offset, "unmerged or overlapping: {pair:?}");
  }

  let free_bytes: usize = free.iter().map(|node| HEADER_SIZE + node.size).sum();
  assert_eq!(allocator.stats().allocated_bytes + free_bytes, allocator.region_len());
}

proptest! {
  #[test]
  fn heap_stays_consistent(fit in any_fit(), ops in prop::collection::vec(op(), 1..120)) {
    let mut allocator = Allocator::new();
    allocator.init(8192, fit).unwrap();

    let mut live: Vec<Live> = Vec::new();
    let mut marker = 0u8;

    for op in ops {
      match op {
        Op::Alloc(size) => {
          if let Some(ptr) = allocator.alloc(size) {
            marker = marker.wrapping_add(1);
            unsafe { ptr.as_ptr().write_bytes(marker, size) };
            live.push(Live { ptr, marker, len: size });
          }
        }
        Op::Free(i) if !live.is_empty() => {
          let block = live.swap_remove(i % live.len());
          prop_assert!(block.intact());
          allocator.free(block.ptr.as_ptr()).unwrap();
        }
        Op::Realloc(i, size) if !live.is_empty() => {
          let index = i % live.len();
          let block = live[index];
          let old = allocator.payload_size(block.ptr.as_ptr()).unwrap();

          match allocator.realloc(block.ptr.as_ptr(), size).unwrap() {
            Some(moved) => {
              let kept = Live { ptr: moved, len: block.len.min(size), ..block };
              prop_assert!(kept.intact());
              if size <= old {
                prop_assert_eq!(moved, block.ptr);
              }
              live[index] = kept;
            }
            None if size == 0 => {
              live.swap_remove(index);
            }
            None => {
              prop_assert_eq!(allocator.payload_size(block.ptr.as_ptr()), Ok(old));
              prop_assert!(block.intact());
            }
          }
        }
        _ => {}
      }

      check_invariants(&allocator, &live);
    }

    for block in &live {
      prop_assert!(block.intact());
    }
  }

  #[test]
  fn freeing_everything_restores_one_block(
    fit in any_fit(),
    sizes in prop::collection::vec(0usize..300, 1..40),
  ) {
    let mut allocator = Allocator::new();
    allocator.init(16384, fit).unwrap();
    let len = allocator.region_len();

    let blocks: Vec<_> = sizes.iter().filter_map(|&size| allocator.alloc(size)).collect();
    let evens = blocks.iter().rev().step_by(2);
    let odds = blocks.iter().rev().skip(1).step_by(2);
    for block in evens.chain(odds) {
      allocator.free(block.as_ptr()).unwrap();
    }

    let free = allocator.free_blocks();
    prop_assert_eq!(free.len(), 1);
    prop_assert_eq!(free[0].size, len - HEADER_SIZE);
    prop_assert_eq!(allocator.stats().fragmentation, 0.0);
    prop_assert_eq!(allocator.coalesce(), 0);
  }
}
