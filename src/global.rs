//! The process-wide allocator.
//!
//! These functions mirror the [`Allocator`] methods but speak in raw
//! pointers, and they turn integrity violations into an immediate abort: once
//! a header is found corrupted or a block freed twice, nothing the allocator
//! does afterwards can be trusted.
//!
//! The allocator is single-threaded by contract. The mutex only exists so
//! the static is sound; callers still must not race allocator calls.

use std::{
  process,
  ptr::{self, NonNull},
  sync::{Mutex, MutexGuard, PoisonError},
};

use crate::{allocator::Allocator, error::AllocError, stats::Stats, strategy::Strategy};

static HEAP: Mutex<Allocator> = Mutex::new(Allocator::new());

fn heap() -> MutexGuard<'static, Allocator> {
  HEAP.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reports an unrecoverable error and aborts the process.
pub fn fatal(err: AllocError) -> ! {
  log::error!("{err}");
  eprintln!("Error: {err}");
  process::abort()
}

/// Maps the process heap. Only the first successful call has any effect;
/// later ones return [`AllocError::AlreadyInitialized`].
///
/// Aborts if the OS cannot supply the region.
pub fn init(
  region_size: usize,
  strategy: Strategy,
) -> Result<(), AllocError> {
  match heap().init(region_size, strategy) {
    Err(err) if err.is_fatal() => fatal(err),
    result => result,
  }
}

/// Null when uninitialized or out of room.
pub fn alloc(size: usize) -> *mut u8 {
  heap().alloc(size).map_or(ptr::null_mut(), NonNull::as_ptr)
}

/// Aborts on corruption or double free.
pub fn free(ptr: *mut u8) {
  let result = heap().free(ptr);

  if let Err(err) = result {
    fatal(err);
  }
}

/// Null when the block could not be resized (the original stays valid) or
/// when `size` is zero (the original was freed).
pub fn realloc(
  ptr: *mut u8,
  size: usize,
) -> *mut u8 {
  let result = heap().realloc(ptr, size);

  match result {
    Ok(moved) => moved.map_or(ptr::null_mut(), NonNull::as_ptr),
    Err(err) => fatal(err),
  }
}

/// `None` until [`init`] succeeds.
pub fn stats() -> Option<Stats> {
  let heap = heap();
  heap.is_initialized().then(|| heap.stats())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::{env, process::Command};

  const CHILD: &str = "UMALLOC_GLOBAL_CHILD";

  /// Runs one of the ignored tests below in its own process, which gets a
  /// fresh process heap.
  fn run_child(name: &str) -> (bool, String, String) {
    let output = Command::new(env::current_exe().unwrap())
      .args(["--ignored", "--exact", "--nocapture", "--test-threads=1"])
      .arg(format!("global::tests::{name}"))
      .env(CHILD, "1")
      .output()
      .unwrap();

    (
      output.status.success(),
      String::from_utf8_lossy(&output.stdout).into_owned(),
      String::from_utf8_lossy(&output.stderr).into_owned(),
    )
  }

  fn in_child() -> bool {
    env::var_os(CHILD).is_some()
  }

  #[test]
  fn lifecycle_runs_to_completion() {
    let (success, stdout, _) = run_child("child_lifecycle");

    assert!(success);
    assert!(stdout.contains("1 passed"), "{stdout}");
  }

  #[test]
  fn double_free_aborts() {
    let (success, _, stderr) = run_child("child_double_free");

    assert!(!success);
    assert!(stderr.contains("double free detected"), "{stderr}");
  }

  #[test]
  fn corruption_aborts() {
    let (success, _, stderr) = run_child("child_corruption");

    assert!(!success);
    assert!(stderr.contains("memory corruption detected"), "{stderr}");
  }

  #[test]
  #[ignore = "runs in a child process"]
  fn child_lifecycle() {
    if !in_child() {
      return;
    }

    assert!(stats().is_none());
    assert!(alloc(16).is_null());
    assert_eq!(init(0, Strategy::NextFit), Err(AllocError::InvalidSize { requested: 0 }));

    init(4096, Strategy::NextFit).unwrap();
    assert_eq!(init(4096, Strategy::BestFit), Err(AllocError::AlreadyInitialized));

    let ptr = alloc(100);
    assert!(!ptr.is_null());
    let grown = realloc(ptr, 400);
    assert!(!grown.is_null());
    assert!(realloc(grown, 0).is_null());
    free(ptr::null_mut());

    let stats = stats().unwrap();
    assert_eq!((stats.allocations, stats.deallocations), (2, 2));
    assert_eq!(stats.allocated_bytes, 0);
  }

  #[test]
  #[ignore = "runs in a child process"]
  fn child_double_free() {
    if !in_child() {
      return;
    }

    init(4096, Strategy::BestFit).unwrap();
    let ptr = alloc(32);
    free(ptr);
    free(ptr);
  }

  #[test]
  #[ignore = "runs in a child process"]
  fn child_corruption() {
    if !in_child() {
      return;
    }

    init(4096, Strategy::FirstFit).unwrap();
    let ptr = alloc(32);
    unsafe { ptr.sub(8).write_bytes(0xAA, 8) };
    free(ptr);
  }
}
