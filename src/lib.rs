//! # umalloc - A Free-List Heap Allocator
//!
//! This crate implements a user-space heap on top of a single anonymous
//! `mmap(2)` region. Blocks are carved out of the region by one of four
//! placement strategies, split when oversized, and merged back with their
//! neighbours when freed.
//!
//! ## Overview
//!
//! ```text
//!   Region (page-rounded, mapped once):
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │ ┌────┬───────┐┌────┬──────────┐┌────┬────┐┌────┬──────────────────┐  │
//!   │ │hdr │ used  ││hdr │   free   ││hdr │used││hdr │       free       │  │
//!   │ └────┴───────┘└────┴──────────┘└────┴────┘└────┴──────────────────┘  │
//!   │                 ▲                           ▲                        │
//!   │                 │                           │                        │
//!   │   free list ────┴───────────────────────────┘  (address order)       │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every block, used or free, starts with a 16 byte header holding the
//! payload size and a sentinel tag. Free blocks are chained through their
//! first payload word, by offset from the region base.
//!
//! ## Crate Structure
//!
//! ```text
//!   umalloc
//!   ├── align      - Alignment macros (align!, align_to!)
//!   ├── region     - mmap-backed byte range and offset accessors
//!   ├── header     - Block header view
//!   ├── free_list  - Address-ordered free list, split and coalesce
//!   ├── strategy   - First, best, worst and next fit
//!   ├── stats      - Counters and fragmentation
//!   ├── config     - HeapConfig
//!   ├── allocator  - Allocator
//!   └── global     - Process-wide allocator that aborts on corruption
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use umalloc::{Allocator, Strategy};
//!
//! let mut allocator = Allocator::new();
//! allocator.init(4096, Strategy::BestFit).unwrap();
//!
//! let ptr = allocator.alloc(64).unwrap();
//! unsafe { ptr.as_ptr().write_bytes(0xAB, 64) };
//!
//! let grown = allocator.realloc(ptr.as_ptr(), 256).unwrap().unwrap();
//! assert_eq!(unsafe { *grown.as_ptr() }, 0xAB);
//!
//! allocator.free(grown.as_ptr()).unwrap();
//! assert_eq!(allocator.stats().allocated_bytes, 0);
//! ```
//!
//! ## Errors
//!
//! Running out of room is not an error: `alloc` returns `None`. Freeing a
//! pointer whose header lost its tag, or a block that is already free, is
//! reported as a fatal [`AllocError`]; the [`global`] functions abort the
//! process on those.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives
//! - **Fixed size**: The region is never grown or returned to the OS
//! - **Unix-only**: Requires `libc` and `mmap` (POSIX systems)

pub mod align;
pub mod allocator;
pub mod config;
pub mod error;
pub mod free_list;
pub mod global;
mod header;
pub mod region;
pub mod stats;
pub mod strategy;

pub use allocator::Allocator;
pub use config::HeapConfig;
pub use error::AllocError;
pub use free_list::FreeNode;
pub use header::HEADER_SIZE;
pub use stats::Stats;
pub use strategy::Strategy;
