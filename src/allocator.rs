use std::ptr::NonNull;

use crate::{
  align::{ALIGNMENT, checked_align_to},
  config::HeapConfig,
  error::AllocError,
  free_list::{FreeList, FreeNode},
  header::{HEADER_SIZE, Header},
  region::{Region, page_size},
  stats::{self, Counters, Stats},
  strategy::{Placement, Strategy},
};

/// Free-list allocator serving blocks out of a single mapped region.
///
/// A fresh value owns nothing; [`Allocator::init`] maps the region and fixes
/// the placement strategy. Every method takes `&mut self`, so one instance is
/// only ever driven from one place at a time.
pub struct Allocator {
  heap: Option<Heap>,
}

struct Heap {
  region: Region,
  free_list: FreeList,
  placement: Placement,
  counters: Counters,
}

impl Allocator {
  pub const fn new() -> Self {
    Self { heap: None }
  }

  /// Maps a region of at least `region_size` bytes, rounded up to the page
  /// size, and makes it one big free block.
  ///
  /// Fails without side effects if the allocator already owns a region or the
  /// size is zero.
  pub fn init(
    &mut self,
    region_size: usize,
    strategy: Strategy,
  ) -> Result<(), AllocError> {
    if self.heap.is_some() {
      return Err(AllocError::AlreadyInitialized);
    }

    let invalid = AllocError::InvalidSize {
      requested: region_size,
    };
    if region_size == 0 {
      return Err(invalid);
    }
    let len = checked_align_to(region_size, page_size()).ok_or(invalid)?;

    let mut region = Region::map(len)?;
    let free_list = FreeList::seed(&mut region);

    log::debug!("mapped {len} byte heap at {:p} using {strategy}", region.base());

    self.heap = Some(Heap {
      region,
      free_list,
      placement: Placement::new(strategy),
      counters: Counters::default(),
    });
    Ok(())
  }

  pub fn init_with(
    &mut self,
    config: &HeapConfig,
  ) -> Result<(), AllocError> {
    self.init(config.region_size, config.strategy)
  }

  pub fn is_initialized(&self) -> bool {
    self.heap.is_some()
  }

  pub fn strategy(&self) -> Option<Strategy> {
    self.heap.as_ref().map(|heap| heap.placement.strategy())
  }

  /// Page-rounded length of the region, 0 before `init`.
  pub fn region_len(&self) -> usize {
    self.heap.as_ref().map_or(0, |heap| heap.region.len())
  }

  /// Hands out at least `size` bytes, 8-byte aligned.
  ///
  /// Returns `None` before `init` or when no free block is large enough.
  pub fn alloc(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    let heap = self.heap.as_mut()?;
    let offset = heap.alloc(size)?;

    Some(heap.region.ptr_at(offset))
  }

  /// Returns a block to the free list. Null is a no-op.
  ///
  /// A pointer whose header does not carry the tag yields
  /// [`AllocError::Corruption`], one that is already free yields
  /// [`AllocError::DoubleFree`]. Both are fatal: the caller must not keep
  /// using the allocator.
  pub fn free(
    &mut self,
    ptr: *mut u8,
  ) -> Result<(), AllocError> {
    if ptr.is_null() {
      return Ok(());
    }

    let heap = self.heap_for(ptr)?;
    let (offset, header) = heap.live_block(ptr)?;
    heap.release(offset, header);

    log::trace!("free({ptr:p}) released {} bytes", header.footprint());
    Ok(())
  }

  /// Resizes a block, moving it only when it has to grow.
  ///
  /// Null delegates to [`Allocator::alloc`] and a zero size to
  /// [`Allocator::free`]. `Ok(None)` means no block could be found; the
  /// original block is then left untouched.
  pub fn realloc(
    &mut self,
    ptr: *mut u8,
    size: usize,
  ) -> Result<Option<NonNull<u8>>, AllocError> {
    if ptr.is_null() {
      return Ok(self.alloc(size));
    }
    if size == 0 {
      self.free(ptr)?;
      return Ok(None);
    }

    let heap = self.heap_for(ptr)?;
    let (offset, header) = heap.live_block(ptr)?;

    let Some(wanted) = checked_align_to(size, ALIGNMENT) else {
      return Ok(None);
    };
    if header.size >= wanted {
      return Ok(NonNull::new(ptr));
    }

    let Some(moved) = heap.alloc(size) else {
      log::debug!("realloc({ptr:p}, {size}) found no room, block left in place");
      return Ok(None);
    };

    heap.region.copy(offset + HEADER_SIZE, moved, header.size);
    heap.release(offset, header);

    let moved = heap.region.ptr_at(moved);
    log::trace!("realloc({ptr:p}, {size}) moved to {moved:p}");
    Ok(Some(moved))
  }

  /// Payload size recorded for a live block.
  pub fn payload_size(
    &self,
    ptr: *const u8,
  ) -> Result<usize, AllocError> {
    let heap = self.heap.as_ref().ok_or(AllocError::Corruption { addr: ptr as usize })?;
    let (_, header) = heap.live_block(ptr)?;

    Ok(header.size)
  }

  pub fn stats(&self) -> Stats {
    let Some(heap) = &self.heap else {
      return Stats::default();
    };

    let sizes = heap.free_list.iter(&heap.region).map(|node| node.size);
    Stats::new(heap.counters, heap.region.len(), stats::fragmentation(sizes))
  }

  /// Address-ordered snapshot of the free list.
  pub fn free_blocks(&self) -> Vec<FreeNode> {
    self
      .heap
      .as_ref()
      .map(|heap| heap.free_list.iter(&heap.region).collect())
      .unwrap_or_default()
  }

  /// Merges adjacent free blocks. Every `free` already does this, so the
  /// result is normally 0.
  pub fn coalesce(&mut self) -> usize {
    self
      .heap
      .as_mut()
      .map_or(0, |heap| heap.free_list.coalesce(&mut heap.region))
  }

  fn heap_for(
    &mut self,
    ptr: *const u8,
  ) -> Result<&mut Heap, AllocError> {
    self
      .heap
      .as_mut()
      .ok_or(AllocError::Corruption { addr: ptr as usize })
  }
}

impl Default for Allocator {
  fn default() -> Self {
    Self::new()
  }
}

impl Heap {
  /// Carves out a block and returns the offset of its payload.
  fn alloc(
    &mut self,
    size: usize,
  ) -> Option<usize> {
    let payload = checked_align_to(size.max(ALIGNMENT), ALIGNMENT)?;
    let footprint = payload.checked_add(HEADER_SIZE)?;

    let Some(node) = self.placement.select(&self.free_list, &self.region, footprint) else {
      log::debug!(
        "no free block for {size} bytes ({footprint} byte footprint, {})",
        self.placement.strategy()
      );
      return None;
    };

    let granted = self.free_list.take(&mut self.region, node.offset, footprint)?;
    let header = Header::new(granted);
    header.write(&mut self.region, node.offset);
    self.counters.record_alloc(header.footprint());

    log::trace!("alloc({size}) -> offset {} ({granted} bytes)", node.offset + HEADER_SIZE);
    Some(node.offset + HEADER_SIZE)
  }

  /// Locates the header behind `ptr` and checks that it belongs to a block
  /// currently handed out.
  fn live_block(
    &self,
    ptr: *const u8,
  ) -> Result<(usize, Header), AllocError> {
    let addr = ptr as usize;
    let corruption = || AllocError::Corruption { addr };

    let offset = self
      .region
      .offset_of(ptr)
      .and_then(|payload| payload.checked_sub(HEADER_SIZE))
      .filter(|offset| offset % ALIGNMENT == 0)
      .ok_or_else(corruption)?;

    let header = Header::read(&self.region, offset);
    if !header.is_valid() || header.size > self.region.len() - offset - HEADER_SIZE {
      return Err(corruption());
    }

    if self.free_list.find_containing(&self.region, offset).is_some() {
      return Err(AllocError::DoubleFree { addr });
    }

    Ok((offset, header))
  }

  fn release(
    &mut self,
    offset: usize,
    header: Header,
  ) {
    self.counters.record_free(header.footprint());
    self.free_list.insert(&mut self.region, offset, header.size);

    let merges = self.free_list.coalesce(&mut self.region);
    if merges > 0 {
      log::trace!("coalesced {merges} free blocks around offset {offset}");
    }
  }
}
