//! # slpool - A Fixed-Capacity Free-List Pool Allocator
//!
//! This crate provides a **pool allocator** that reserves one contiguous run of
//! memory up front and serves sub-allocations out of it, keeping track of the
//! unused parts with a singly-linked free list.
//!
//! ## Overview
//!
//! The pool is cut into fixed-size blocks. Allocations and free regions are
//! both *runs*: a stretch of contiguous blocks described by the header of its
//! first block.
//!
//! ```text
//!   Pool Layout (N = 10 blocks, one of them the sentinel):
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                             POOL                                     │
//!   │                                                                      │
//!   │   ┌──────┬──────┬──────┬──────┬──────┬──────┬──────┬──────┬──────┬──┐│
//!   │   │  A   │  A   │ free │ free │ free │  B   │ free │ free │ free │S ││
//!   │   └──────┴──────┴──────┴──────┴──────┴──────┴──────┴──────┴──────┴──┘│
//!   │     ▲             ▲                    ▲      ▲                   ▲  │
//!   │     │             │                    │      │                   │  │
//!   │   used(2)      free(3)              used(1) free(3)          sentinel│
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   Free list:  sentinel ──► free(3) @2 ──► free(3) @6 ──► end
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   slpool
//!   ├── align      - Rounding macros (blocks!, align_to!)
//!   ├── block      - Block size, Header and its packed table slot
//!   ├── config     - PoolConfig and SearchMode
//!   ├── error      - PoolError, ParseSearchModeError
//!   ├── free_list  - Free-list engine: first-fit, best-fit, coalescing (internal)
//!   ├── pool       - SlPool, the pool itself
//!   ├── storage    - StoragePool / BestFitPool traits
//!   ├── tag        - Pool-tagged generic allocation
//!   └── view       - Block occupancy dump
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use slpool::SlPool;
//!
//! let mut pool = SlPool::new(220).unwrap();
//!
//! // Allocate room for six u32s
//! let ptr = pool.allocate(6 * size_of::<u32>()).unwrap().cast::<u32>();
//!
//! unsafe {
//!     ptr.write(42);
//!     assert_eq!(ptr.read(), 42);
//! }
//!
//! // Give it back
//! pool.free(ptr.cast()).unwrap();
//!
//! println!("{pool}");
//! ```
//!
//! ## How It Works
//!
//! Requests are rounded up to whole blocks. The free list is walked from the
//! sentinel, and the chosen run is either unlinked (exact fit) or split:
//!
//! ```text
//!   Allocating 2 blocks from a free run of 5:
//!
//!   before:  prev ──► [ free(5)                  ] ──► next
//!
//!   after:   prev ──────────────► [ free(3)      ] ──► next
//!                   [ used(2) ]
//!                   ▲
//!                   └── pointer returned to user
//! ```
//!
//! Freeing walks the list to the first free run past the released one, then
//! merges with whichever neighbours touch it:
//!
//! ```text
//!   Both sides touch:   [ free ][ freed ][ free ]  ──►  [ free            ]
//!   Left touches:       [ free ][ freed ] used      ──►  [ free    ] used
//!   Right touches:  used [ freed ][ free ]          ──►  used [ free      ]
//!   Neither:        used [ freed ] used             ──►  used [ free ] used
//! ```
//!
//! The list therefore always stays sorted by address with no two free runs
//! next to each other.
//!
//! ## Features
//!
//! - **First-fit and best-fit**: per call (`allocate` / `allocate_bf`) or per
//!   pool (`SearchMode` in `PoolConfig`)
//! - **Full coalescing**: released memory is always merged with its neighbours
//! - **Checked release**: foreign pointers and double frees are reported
//!   instead of corrupting the list
//! - **Pool tagging**: `allocate_tagged` / `release_tagged` route releases to
//!   the right pool, or to the system allocator
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives
//! - **Fixed capacity**: A pool never grows after construction
//! - **Block alignment only**: Pointers are 16-byte aligned, nothing stronger
//!
//! ## Safety
//!
//! Allocating and freeing are safe calls, but the returned pointers are raw:
//! reading and writing through them, and keeping them no longer than the pool
//! lives, is up to the caller.

pub mod align;
mod block;
mod config;
mod error;
mod free_list;
mod pool;
mod storage;
mod tag;
mod view;

pub use block::BLOCK_SIZE;
pub use config::{POOL_CONFIG_DEFAULT_CAPACITY, PoolConfig, SearchMode};
pub use error::{ParseSearchModeError, PoolError};
pub use pool::SlPool;
pub use storage::{BestFitPool, StoragePool};
pub use tag::{SharedPool, TAG_SIZE, allocate_tagged, release_tagged};
pub use view::{PoolView, Segment};
