use std::{
  alloc::{self, Layout},
  fmt,
  ptr::NonNull,
};

use tracing::{debug, trace, warn};

use crate::{
  BLOCK_SIZE, blocks,
  config::{PoolConfig, SearchMode},
  error::PoolError,
  free_list::FreeList,
  storage::{BestFitPool, StoragePool},
  view::PoolView,
};

/// A fixed-capacity pool serving allocations out of one contiguous run of
/// blocks, reserved once at construction and released on drop.
///
/// The pool is single-threaded: it is neither `Send` nor `Sync`.
pub struct SlPool {
  blocks: NonNull<u8>,
  layout: Layout,
  free_list: FreeList,
  search_mode: SearchMode,
}

impl SlPool {
  /// Reserves at least `capacity` bytes, rounded up to whole blocks.
  pub fn new(capacity: usize) -> Result<Self, PoolError> {
    Self::with_config(PoolConfig::new(capacity))
  }

  pub fn with_config(config: PoolConfig) -> Result<Self, PoolError> {
    if config.capacity == 0 {
      return Err(PoolError::ZeroSized);
    }

    let oom = || PoolError::OutOfMemory {
      requested: config.capacity,
    };

    let usable = blocks!(config.capacity);

    // One extra block for the sentinel.
    let layout = usable
      .checked_add(1)
      .and_then(|n| n.checked_mul(BLOCK_SIZE))
      .and_then(|size| Layout::from_size_align(size, BLOCK_SIZE).ok())
      .ok_or_else(oom)?;

    let free_list = FreeList::new(usable).ok_or_else(oom)?;
    let blocks = Self::alloc_blocks(layout).ok_or_else(oom)?;

    debug!(
      blocks = free_list.usable(),
      capacity = config.capacity,
      mode = %config.search_mode,
      "pool created"
    );

    Ok(Self {
      blocks,
      layout,
      free_list,
      search_mode: config.search_mode,
    })
  }

  fn alloc_blocks(layout: Layout) -> Option<NonNull<u8>> {
    // `layout` always spans at least two blocks.
    NonNull::new(unsafe { alloc::alloc(layout) })
  }

  /// Allocates `bytes` from the first free run large enough to hold them.
  pub fn allocate(
    &mut self,
    bytes: usize,
  ) -> Result<NonNull<u8>, PoolError> {
    self.allocate_with(bytes, SearchMode::FirstFit)
  }

  /// Allocates `bytes` from the smallest free run large enough to hold them.
  pub fn allocate_bf(
    &mut self,
    bytes: usize,
  ) -> Result<NonNull<u8>, PoolError> {
    self.allocate_with(bytes, SearchMode::BestFit)
  }

  /// The returned pointer is 16-byte aligned and valid for
  /// `blocks!(bytes) * BLOCK_SIZE` bytes until it is freed or the pool drops.
  pub fn allocate_with(
    &mut self,
    bytes: usize,
    mode: SearchMode,
  ) -> Result<NonNull<u8>, PoolError> {
    if bytes == 0 {
      return Err(PoolError::ZeroSized);
    }

    let n = blocks!(bytes);

    let Some(index) = self.free_list.allocate(n, mode) else {
      debug!(
        bytes,
        blocks = n,
        free = self.free_list.free_blocks(),
        %mode,
        "pool exhausted"
      );
      return Err(PoolError::OutOfMemory { requested: bytes });
    };

    trace!(index, blocks = n, %mode, "allocate");

    Ok(self.block_ptr(index))
  }

  /// Returns an allocation to the pool.
  ///
  /// Pointers the pool did not hand out, or already took back, are rejected
  /// with [`PoolError::InvalidRelease`] and leave the pool unchanged.
  pub fn free(
    &mut self,
    ptr: NonNull<u8>,
  ) -> Result<(), PoolError> {
    let Some(index) = self.index_of(ptr) else {
      warn!(?ptr, "release of a pointer that is not a block of this pool");
      return Err(PoolError::InvalidRelease);
    };

    match self.free_list.release(index) {
      Ok(length) => {
        trace!(index, blocks = length, "free");
        Ok(())
      }
      Err(err) => {
        warn!(index, "release of a block that is not allocated");
        Err(err)
      }
    }
  }

  pub fn view(&self) -> PoolView {
    PoolView::of(&self.free_list)
  }

  /// Usable bytes, excluding the sentinel.
  pub fn capacity(&self) -> usize {
    self.free_list.usable() * BLOCK_SIZE
  }

  /// Usable blocks, excluding the sentinel.
  pub fn block_count(&self) -> usize {
    self.free_list.usable()
  }

  pub fn free_blocks(&self) -> usize {
    self.free_list.free_blocks()
  }

  /// Free runs as `(first block, length in blocks)`, in list order.
  pub fn free_runs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
    self.free_list.runs()
  }

  pub fn search_mode(&self) -> SearchMode {
    self.search_mode
  }

  /// Whether `ptr` points anywhere into the pool's usable blocks.
  pub fn owns(
    &self,
    ptr: *const u8,
  ) -> bool {
    ptr
      .addr()
      .checked_sub(self.blocks.as_ptr().addr())
      .is_some_and(|offset| offset < self.capacity())
  }

  fn index_of(
    &self,
    ptr: NonNull<u8>,
  ) -> Option<usize> {
    let offset = ptr.as_ptr().addr().checked_sub(self.blocks.as_ptr().addr())?;

    (offset % BLOCK_SIZE == 0)
      .then_some(offset / BLOCK_SIZE)
      .filter(|&index| index < self.free_list.usable())
  }

  fn block_ptr(
    &self,
    index: usize,
  ) -> NonNull<u8> {
    debug_assert!(index < self.free_list.usable());

    unsafe { self.blocks.add(index * BLOCK_SIZE) }
  }
}

impl Drop for SlPool {
  fn drop(&mut self) {
    unsafe { alloc::dealloc(self.blocks.as_ptr(), self.layout) }
  }
}

impl fmt::Debug for SlPool {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("SlPool")
      .field("blocks", &self.block_count())
      .field("free_blocks", &self.free_blocks())
      .field("search_mode", &self.search_mode)
      .finish()
  }
}

impl fmt::Display for SlPool {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    fmt::Display::fmt(&self.view(), f)
  }
}

// Every run starts on a block boundary inside the buffer and spans at least
// `bytes` bytes until it is freed or the pool drops.
unsafe impl StoragePool for SlPool {
  fn allocate(
    &mut self,
    bytes: usize,
  ) -> Result<NonNull<u8>, PoolError> {
    self.allocate_with(bytes, self.search_mode)
  }

  fn free(
    &mut self,
    ptr: NonNull<u8>,
  ) -> Result<(), PoolError> {
    SlPool::free(self, ptr)
  }

  fn view(&self) -> PoolView {
    SlPool::view(self)
  }
}

impl BestFitPool for SlPool {
  fn allocate_bf(
    &mut self,
    bytes: usize,
  ) -> Result<NonNull<u8>, PoolError> {
    SlPool::allocate_bf(self, bytes)
  }
}
