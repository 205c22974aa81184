//! The backing byte range the allocator carves blocks out of.
//!
//! Everything that touches raw memory goes through [`Region`]: the rest of the
//! crate only deals in byte offsets from the start of the mapping.

use std::{io, ptr, ptr::NonNull};

use crate::error::AllocError;

const FALLBACK_PAGE_SIZE: usize = 4096;

/// Returns the platform page size.
pub fn page_size() -> usize {
  let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };

  if size <= 0 {
    FALLBACK_PAGE_SIZE
  } else {
    size as usize
  }
}

/// An anonymous, private, zero-initialized mapping.
pub struct Region {
  base: NonNull<u8>,
  len: usize,
}

// SAFETY: the mapping is owned exclusively by this value; nothing else holds
// its base pointer except payload pointers the caller received through the
// allocator, which carry no ownership of the region itself.
unsafe impl Send for Region {}

impl Region {
  /// Maps `len` bytes of fresh memory. `len` must already be page-rounded.
  pub fn map(len: usize) -> Result<Self, AllocError> {
    let addr = unsafe {
      libc::mmap(
        ptr::null_mut(),
        len,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
        -1,
        0,
      )
    };

    if addr == libc::MAP_FAILED {
      let errno = io::Error::last_os_error().raw_os_error().unwrap_or(0);
      return Err(AllocError::RegionUnavailable { len, errno });
    }

    match NonNull::new(addr as *mut u8) {
      Some(base) => Ok(Self { base, len }),
      None => Err(AllocError::RegionUnavailable { len, errno: 0 }),
    }
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn base(&self) -> NonNull<u8> {
    self.base
  }

  /// Translates an address into an offset from the region base.
  pub fn offset_of(
    &self,
    addr: *const u8,
  ) -> Option<usize> {
    let offset = (addr as usize).checked_sub(self.base.as_ptr() as usize)?;
    (offset < self.len).then_some(offset)
  }

  /// Address of the byte at `offset`.
  pub fn ptr_at(
    &self,
    offset: usize,
  ) -> NonNull<u8> {
    assert!(offset <= self.len, "offset {offset} outside region of {} bytes", self.len);
    unsafe { NonNull::new_unchecked(self.base.as_ptr().add(offset)) }
  }

  /// Reads the 64-bit word stored at `offset`.
  pub fn read_word(
    &self,
    offset: usize,
  ) -> u64 {
    self.check_range(offset, size_of::<u64>());
    unsafe { ptr::read_unaligned(self.base.as_ptr().add(offset) as *const u64) }
  }

  /// Writes a 64-bit word at `offset`.
  pub fn write_word(
    &mut self,
    offset: usize,
    value: u64,
  ) {
    self.check_range(offset, size_of::<u64>());
    unsafe { ptr::write_unaligned(self.base.as_ptr().add(offset) as *mut u64, value) }
  }

  /// Copies `len` bytes between two non-overlapping ranges of the region.
  pub fn copy(
    &mut self,
    src: usize,
    dst: usize,
    len: usize,
  ) {
    self.check_range(src, len);
    self.check_range(dst, len);
    assert!(src + len <= dst || dst + len <= src, "overlapping copy");

    unsafe {
      let base = self.base.as_ptr();
      ptr::copy_nonoverlapping(base.add(src), base.add(dst), len);
    }
  }

  fn check_range(
    &self,
    offset: usize,
    len: usize,
  ) {
    let end = offset.checked_add(len);
    assert!(
      end.is_some_and(|end| end <= self.len),
      "access of {len} bytes at offset {offset} outside region of {} bytes",
      self.len
    );
  }
}

impl Drop for Region {
  fn drop(&mut self) {
    unsafe { libc::munmap(self.base.as_ptr().cast(), self.len) };
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn page_size_is_power_of_two() {
    assert!(page_size().is_power_of_two());
  }

  #[test]
  fn mapping_is_zeroed() {
    let region = Region::map(page_size()).unwrap();

    for offset in (0..region.len()).step_by(8) {
      assert_eq!(region.read_word(offset), 0);
    }
  }

  #[test]
  fn words_round_trip_at_offsets() {
    let mut region = Region::map(page_size()).unwrap();

    region.write_word(0, 0xDEAD_BEEF);
    region.write_word(region.len() - 8, u64::MAX);

    assert_eq!(region.read_word(0), 0xDEAD_BEEF);
    assert_eq!(region.read_word(region.len() - 8), u64::MAX);
  }

  #[test]
  fn offset_of_rejects_foreign_addresses() {
    let region = Region::map(page_size()).unwrap();
    let base = region.base().as_ptr();

    assert_eq!(region.offset_of(base), Some(0));
    assert_eq!(region.offset_of(unsafe { base.add(40) }), Some(40));
    assert_eq!(region.offset_of(unsafe { base.add(region.len()) }), None);
    assert_eq!(region.offset_of(ptr::null()), None);
  }

  #[test]
  fn copy_moves_bytes() {
    let mut region = Region::map(page_size()).unwrap();

    region.write_word(16, 42);
    region.copy(16, 64, 8);

    assert_eq!(region.read_word(64), 42);
  }

  #[test]
  #[should_panic]
  fn out_of_bounds_read_panics() {
    let region = Region::map(page_size()).unwrap();
    region.read_word(region.len() - 4);
  }
}
