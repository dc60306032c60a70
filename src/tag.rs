//! Pool-aware generic allocation.
//!
//! Every allocation made here carries a tag just in front of the client
//! bytes, naming the pool that served it or nothing for the system allocator.
//! Releasing reads the tag back, so the caller never has to remember where a
//! pointer came from.
//!
//! ```text
//!   ┌──────────────┬──────────────────────────────┐
//!   │ Tag          │ client bytes                 │
//!   │ pool: ───────┼──► owning pool, or None      │
//!   └──────────────┴──────────────────────────────┘
//!   ▲              ▲
//!   │              └── pointer returned to the client
//!   └── pointer the pool (or malloc) handed out
//! ```

use std::{cell::RefCell, mem, ptr::NonNull};

use tracing::trace;

use crate::{BLOCK_SIZE, align_to, error::PoolError, storage::StoragePool};

/// A pool shared with the tagging layer.
pub type SharedPool = RefCell<dyn StoragePool>;

#[repr(C)]
struct Tag {
  pool: Option<NonNull<SharedPool>>,
}

/// Bytes reserved in front of every tagged allocation. A whole number of
/// blocks, so client pointers keep the pool's block alignment.
pub const TAG_SIZE: usize = align_to!(mem::size_of::<Tag>(), BLOCK_SIZE);

/// Allocates `bytes` from `pool`, or from the system allocator when `pool` is
/// `None`, and records the owner in front of the returned pointer.
///
/// The pool must outlive the allocation.
///
/// # Panics
///
/// Panics if `pool` is already borrowed, like [`RefCell::borrow_mut`].
pub fn allocate_tagged(
  bytes: usize,
  pool: Option<&SharedPool>,
) -> Result<NonNull<u8>, PoolError> {
  let total = bytes
    .checked_add(TAG_SIZE)
    .ok_or(PoolError::OutOfMemory { requested: bytes })?;

  let region = match pool {
    Some(pool) => pool.borrow_mut().allocate(total)?,
    None => system_alloc(total)?,
  };

  trace!(bytes, system = pool.is_none(), "tagged allocation");

  unsafe {
    region.cast::<Tag>().write(Tag {
      pool: pool.map(NonNull::from),
    });

    Ok(region.add(TAG_SIZE))
  }
}

/// Releases memory obtained from [`allocate_tagged`], routing it to the pool
/// recorded in its tag or to the system allocator.
///
/// # Safety
///
/// `ptr` must come from [`allocate_tagged`] and not have been released yet.
/// The pool it was allocated from must still be alive and not mutably
/// borrowed.
pub unsafe fn release_tagged(ptr: NonNull<u8>) -> Result<(), PoolError> {
  unsafe {
    let region = ptr.sub(TAG_SIZE);
    let tag = region.cast::<Tag>().read();

    trace!(system = tag.pool.is_none(), "tagged release");

    match tag.pool {
      Some(pool) => pool.as_ref().borrow_mut().free(region),
      None => {
        libc::free(region.as_ptr().cast());
        Ok(())
      }
    }
  }
}

fn system_alloc(bytes: usize) -> Result<NonNull<u8>, PoolError> {
  let ptr = unsafe { libc::malloc(bytes) };

  NonNull::new(ptr.cast::<u8>()).ok_or(PoolError::OutOfMemory { requested: bytes })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{SlPool, blocks, view::PoolView};

  /// Forwards to a real pool and counts what reaches it.
  struct CountingPool {
    inner: SlPool,
    allocs: usize,
    frees: usize,
  }

  impl CountingPool {
    fn new(capacity: usize) -> RefCell<Self> {
      RefCell::new(Self {
        inner: SlPool::new(capacity).unwrap(),
        allocs: 0,
        frees: 0,
      })
    }
  }

  unsafe impl StoragePool for CountingPool {
    fn allocate(
      &mut self,
      bytes: usize,
    ) -> Result<NonNull<u8>, PoolError> {
      self.allocs += 1;
      self.inner.allocate(bytes)
    }

    fn free(
      &mut self,
      ptr: NonNull<u8>,
    ) -> Result<(), PoolError> {
      self.frees += 1;
      self.inner.free(ptr)
    }

    fn view(&self) -> PoolView {
      self.inner.view()
    }
  }

  #[test]
  fn test_tag_size() {
    assert_eq!(TAG_SIZE % BLOCK_SIZE, 0);
    assert!(TAG_SIZE >= mem::size_of::<Tag>());
  }

  #[test]
  fn test_release_routes_to_owning_pool() {
    let p = CountingPool::new(256);
    let q = CountingPool::new(256);

    let from_p = allocate_tagged(24, Some(&p)).unwrap();
    let from_q = allocate_tagged(40, Some(&q)).unwrap();

    assert!(p.borrow().inner.owns(from_p.as_ptr()));
    assert!(q.borrow().inner.owns(from_q.as_ptr()));

    unsafe { release_tagged(from_q).unwrap() };
    assert_eq!((p.borrow().frees, q.borrow().frees), (0, 1));

    unsafe { release_tagged(from_p).unwrap() };
    assert_eq!((p.borrow().frees, q.borrow().frees), (1, 1));

    assert_eq!(p.borrow().inner.free_blocks(), 16);
    assert_eq!(q.borrow().inner.free_blocks(), 16);
  }

  #[test]
  fn test_untagged_release_never_reaches_a_pool() {
    let p = CountingPool::new(256);
    let pooled = allocate_tagged(8, Some(&p)).unwrap();
    let system = allocate_tagged(8, None).unwrap();

    assert!(!p.borrow().inner.owns(system.as_ptr()));

    unsafe { release_tagged(system).unwrap() };
    assert_eq!(p.borrow().frees, 0);

    unsafe { release_tagged(pooled).unwrap() };
    assert_eq!((p.borrow().allocs, p.borrow().frees), (1, 1));
  }

  #[test]
  fn test_tag_costs_blocks_in_the_pool() {
    let pool = RefCell::new(SlPool::new(4 * BLOCK_SIZE).unwrap());
    let ptr = allocate_tagged(BLOCK_SIZE, Some(&pool)).unwrap();
    let used = blocks!(BLOCK_SIZE + TAG_SIZE);

    assert_eq!(pool.borrow().free_blocks(), 4 - used);

    let err = allocate_tagged(4 * BLOCK_SIZE, Some(&pool)).unwrap_err();
    assert_eq!(err, PoolError::OutOfMemory { requested: 4 * BLOCK_SIZE + TAG_SIZE });

    unsafe { release_tagged(ptr).unwrap() };
    assert_eq!(pool.borrow().free_blocks(), 4);
  }

  #[test]
  #[should_panic(expected = "already borrowed")]
  fn test_allocating_from_a_borrowed_pool_panics() {
    let pool = RefCell::new(SlPool::new(64).unwrap());
    let _guard = pool.borrow();

    let _ = allocate_tagged(8, Some(&pool));
  }

  #[test]
  fn test_tagged_data_survives() {
    let pool = RefCell::new(SlPool::new(512).unwrap());
    let pooled = allocate_tagged(6 * size_of::<i32>(), Some(&pool)).unwrap().cast::<i32>();
    let system = allocate_tagged(2 * size_of::<i32>(), None).unwrap().cast::<i32>();

    unsafe {
      for i in 0..6 {
        pooled.add(i).write(i as i32 * 7);
      }
      system.write(-1);
      system.add(1).write(-2);

      for i in 0..6 {
        assert_eq!(pooled.add(i).read(), i as i32 * 7);
      }
      assert_eq!((system.read(), system.add(1).read()), (-1, -2));

      release_tagged(pooled.cast()).unwrap();
      release_tagged(system.cast()).unwrap();
    }
  }
}
