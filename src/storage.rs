use std::ptr::NonNull;

use crate::{BLOCK_SIZE, error::PoolError, view::PoolView};

/// The capability set shared by every pool, so callers can hold "some pool"
/// without knowing how it searches for free space.
///
/// # Safety
///
/// A successful [`allocate`](StoragePool::allocate) must return a pointer
/// aligned to [`BLOCK_SIZE`] and valid for reads and writes of `bytes` bytes,
/// untouched by the pool until it comes back through
/// [`free`](StoragePool::free). Callers such as
/// [`allocate_tagged`](crate::allocate_tagged) write through it right away.
pub unsafe trait StoragePool {
  /// Allocates at least `bytes` bytes using the pool's own search policy.
  fn allocate(
    &mut self,
    bytes: usize,
  ) -> Result<NonNull<u8>, PoolError>;

  /// Returns memory obtained from [`StoragePool::allocate`] on the same pool.
  fn free(
    &mut self,
    ptr: NonNull<u8>,
  ) -> Result<(), PoolError>;

  /// Current block occupancy.
  fn view(&self) -> PoolView;
}

/// Pools that can also serve a request from the tightest free run.
pub trait BestFitPool: StoragePool {
  fn allocate_bf(
    &mut self,
    bytes: usize,
  ) -> Result<NonNull<u8>, PoolError>;
}
