use std::fmt;

use crate::free_list::FreeList;

/// One run of a pool, in blocks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Segment {
  Free(usize),
  Used(usize),
}

impl Segment {
  pub fn blocks(&self) -> usize {
    match *self {
      Segment::Free(n) | Segment::Used(n) => n,
    }
  }
}

/// Snapshot of a pool's block occupancy, in address order.
///
/// Renders as one bracketed group per run, `+` for free blocks and `#` for
/// used ones, followed by a summary line:
///
/// ```text
/// [ ++ ] [ ### ] [ ++ ]
/// +[2] -[3] +[2] || Total blocks: 7
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolView {
  segments: Vec<Segment>,
  total: usize,
}

impl PoolView {
  /// Walks the blocks front to back, jumping a run at a time, and follows the
  /// free list alongside: a run is free exactly when the list cursor sits on it.
  pub(crate) fn of(list: &FreeList) -> Self {
    let mut segments = Vec::new();
    let mut free_cursor = list.head();
    let mut pos = 0;

    while pos < list.usable() {
      let header = list.header(pos);
      let length = header.length();

      debug_assert!(length > 0, "block {pos} does not start a run");
      if length == 0 {
        break;
      }

      if free_cursor == Some(pos) {
        segments.push(Segment::Free(length));
        free_cursor = header.next();
      } else {
        segments.push(Segment::Used(length));
      }

      pos += length;
    }

    Self {
      segments,
      total: list.usable(),
    }
  }

  pub fn segments(&self) -> &[Segment] {
    &self.segments
  }

  pub fn total_blocks(&self) -> usize {
    self.total
  }

  pub fn free_blocks(&self) -> usize {
    self
      .segments
      .iter()
      .filter(|s| matches!(s, Segment::Free(_)))
      .map(Segment::blocks)
      .sum()
  }
}

impl fmt::Display for PoolView {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    for segment in &self.segments {
      let symbol = match segment {
        Segment::Free(_) => "+",
        Segment::Used(_) => "#",
      };

      write!(f, "[ {} ] ", symbol.repeat(segment.blocks()))?;
    }

    writeln!(f)?;

    for segment in &self.segments {
      match segment {
        Segment::Free(n) => write!(f, "+[{n}] ")?,
        Segment::Used(n) => write!(f, "-[{n}] ")?,
      }
    }

    writeln!(f, "|| Total blocks: {}", self.total)
  }
}
