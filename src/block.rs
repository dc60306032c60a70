/// Size in bytes of a single block, the allocation granularity of every pool.
/// Every run starts on a multiple of it, so every pointer a pool hands out is
/// 16-byte aligned.
pub const BLOCK_SIZE: usize = 16;

// Markers kept in a slot's `next` field. Real links are block indices and
// stay below all of them.
const END: u32 = u32::MAX;
const VACANT: u32 = u32::MAX - 1;
const USED: u32 = u32::MAX - 2;

/// Most usable blocks one pool can have. The sentinel takes the index right
/// after the last usable block, which still has to be below every marker.
pub const MAX_BLOCKS: usize = USED as usize - 1;

/// Metadata for the block slot with the same index.
///
/// Only the first slot of a run carries a length. A free run's slot doubles
/// as a free-list node, an allocated run's slot only remembers how many blocks
/// the client holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Header {
  /// Interior of a run, or a run head absorbed by coalescing.
  Vacant,
  Free { length: usize, next: Option<usize> },
  Used { length: usize },
  /// Permanent list head, never allocatable.
  Sentinel { next: Option<usize> },
}

impl Header {
  pub fn length(&self) -> usize {
    match *self {
      Header::Free { length, .. } | Header::Used { length } => length,
      Header::Vacant | Header::Sentinel { .. } => 0,
    }
  }

  pub fn next(&self) -> Option<usize> {
    match *self {
      Header::Free { next, .. } | Header::Sentinel { next } => next,
      Header::Vacant | Header::Used { .. } => None,
    }
  }

  pub fn is_free(&self) -> bool {
    matches!(self, Header::Free { .. })
  }
}

/// A [`Header`] as stored in a pool's header table: two 32-bit words, half a
/// block of bookkeeping per block.
///
/// ```text
///              length      next
///   Vacant     0           VACANT
///   Used       n > 0       USED
///   Free       n > 0       index | END
///   Sentinel   0           index | END
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
  length: u32,
  next: u32,
}

impl Slot {
  pub const VACANT: Slot = Slot {
    length: 0,
    next: VACANT,
  };
}

fn pack(value: usize) -> u32 {
  debug_assert!(value <= MAX_BLOCKS, "{value} does not fit a slot");
  value as u32
}

fn pack_link(next: Option<usize>) -> u32 {
  next.map_or(END, pack)
}

fn unpack_link(next: u32) -> Option<usize> {
  (next != END).then_some(next as usize)
}

impl From<Header> for Slot {
  fn from(header: Header) -> Self {
    match header {
      Header::Vacant => Slot::VACANT,
      Header::Free { length, next } => Slot {
        length: pack(length),
        next: pack_link(next),
      },
      Header::Used { length } => Slot {
        length: pack(length),
        next: USED,
      },
      Header::Sentinel { next } => Slot {
        length: 0,
        next: pack_link(next),
      },
    }
  }
}

impl From<Slot> for Header {
  fn from(slot: Slot) -> Self {
    match (slot.length, slot.next) {
      (_, VACANT) => Header::Vacant,
      (length, USED) => Header::Used {
        length: length as usize,
      },
      (0, next) => Header::Sentinel {
        next: unpack_link(next),
      },
      (length, next) => Header::Free {
        length: length as usize,
        next: unpack_link(next),
      },
    }
  }
}
