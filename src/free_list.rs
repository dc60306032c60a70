use crate::{
  block::{Header, MAX_BLOCKS, Slot},
  config::SearchMode,
  error::PoolError,
};

/// Singly-linked list of free runs, threaded through a pool's header table.
///
/// Runs are addressed by the index of their first block. The last slot of the
/// table is the sentinel: it never joins a run and its `next` is the head of
/// the list. Runs are kept in ascending index order and no two of them touch,
/// so a block's neighbours in the list are also its neighbours in memory.
///
/// ```text
///   index:    0   1   2   3   4   5   6   7   8   9
///           ┌───┬───┬───┬───┬───┬───┬───┬───┬───┬───┐
///           │ U │   │ F │   │   │ U │ F │   │   │ S │
///           └───┴───┴───┴───┴───┴───┴───┴───┴───┴───┘
///             2       3           1   3           ▲
///                                                 │
///   S.next ──► 2 ──► 6 ──► end                 sentinel
/// ```
pub struct FreeList {
  slots: Box<[Slot]>,
  sentinel: usize,
}

impl FreeList {
  /// A table for `usable` blocks plus the sentinel, formatted as a single free
  /// run. `None` when the table cannot be reserved or indexed.
  pub fn new(usable: usize) -> Option<Self> {
    debug_assert!(usable > 0);

    if usable > MAX_BLOCKS {
      return None;
    }

    let mut slots = Vec::new();
    slots.try_reserve_exact(usable + 1).ok()?;
    slots.resize(usable + 1, Slot::VACANT);

    let mut list = Self {
      slots: slots.into_boxed_slice(),
      sentinel: usable,
    };

    list.set(
      0,
      Header::Free {
        length: usable,
        next: None,
      },
    );
    list.set(usable, Header::Sentinel { next: Some(0) });

    Some(list)
  }

  /// Number of allocatable blocks.
  pub fn usable(&self) -> usize {
    self.sentinel
  }

  pub fn header(
    &self,
    index: usize,
  ) -> Header {
    self.slots[index].into()
  }

  fn set(
    &mut self,
    index: usize,
    header: Header,
  ) {
    self.slots[index] = header.into();
  }

  pub fn head(&self) -> Option<usize> {
    self.header(self.sentinel).next()
  }

  /// Free runs as `(start, length)` in list order.
  pub fn runs(&self) -> Runs<'_> {
    Runs {
      list: self,
      cursor: self.head(),
    }
  }

  pub fn free_blocks(&self) -> usize {
    self.runs().map(|(_, length)| length).sum()
  }

  /// Carves `n` blocks out of a free run picked by `mode` and returns the
  /// run's start. Leaves the list untouched when nothing fits.
  pub fn allocate(
    &mut self,
    n: usize,
    mode: SearchMode,
  ) -> Option<usize> {
    debug_assert!(n > 0);

    let (prev, pos) = match mode {
      SearchMode::FirstFit => self.first_fit(n)?,
      SearchMode::BestFit => self.best_fit(n)?,
    };

    Some(self.take(prev, pos, n))
  }

  /// First run large enough, with its list predecessor.
  fn first_fit(
    &self,
    n: usize,
  ) -> Option<(usize, usize)> {
    let mut prev = self.sentinel;
    let mut current = self.head();

    while let Some(pos) = current {
      let header = self.header(pos);

      if header.length() >= n {
        return Some((prev, pos));
      }

      prev = pos;
      current = header.next();
    }

    None
  }

  /// An exact fit if one comes up during the walk, otherwise the smallest
  /// larger run. Ties go to the run found first.
  fn best_fit(
    &self,
    n: usize,
  ) -> Option<(usize, usize)> {
    let mut prev = self.sentinel;
    let mut current = self.head();
    let mut best: Option<(usize, usize)> = None;

    while let Some(pos) = current {
      let header = self.header(pos);
      let length = header.length();

      if length == n {
        return Some((prev, pos));
      }

      if length > n {
        let smaller = best.is_none_or(|(_, b)| self.header(b).length() > length);

        if smaller {
          best = Some((prev, pos));
        }
      }

      prev = pos;
      current = header.next();
    }

    best
  }

  fn take(
    &mut self,
    prev: usize,
    pos: usize,
    n: usize,
  ) -> usize {
    let header = self.header(pos);
    let length = header.length();

    debug_assert!(header.is_free() && length >= n);

    if length == n {
      self.link(prev, header.next());
    } else {
      let rest = pos + n;

      self.set(
        rest,
        Header::Free {
          length: length - n,
          next: header.next(),
        },
      );
      self.link(prev, Some(rest));
    }

    self.set(pos, Header::Used { length: n });

    pos
  }

  /// Returns the run starting at `index` to the list, merging it with the
  /// free runs directly before and after it. Yields the run's length.
  ///
  /// Anything but the start of an allocated run is rejected without touching
  /// the list.
  pub fn release(
    &mut self,
    index: usize,
  ) -> Result<usize, PoolError> {
    let length = match self.slots.get(index).map(|&slot| Header::from(slot)) {
      Some(Header::Used { length }) => length,
      _ => return Err(PoolError::InvalidRelease),
    };

    let mut prev = self.sentinel;
    let mut current = self.head();

    while let Some(pos) = current {
      if pos > index {
        break;
      }

      prev = pos;
      current = self.header(pos).next();
    }

    let left = self.end_of(prev) == Some(index);
    let right = current.filter(|&pos| index + length == pos);

    match (left, right) {
      (true, Some(next_free)) => {
        let after = self.header(next_free);

        self.set(
          prev,
          Header::Free {
            length: self.header(prev).length() + length + after.length(),
            next: after.next(),
          },
        );
        self.set(index, Header::Vacant);
        self.set(next_free, Header::Vacant);
      }
      (true, None) => {
        let before = self.header(prev);

        self.set(
          prev,
          Header::Free {
            length: before.length() + length,
            next: before.next(),
          },
        );
        self.set(index, Header::Vacant);
      }
      (false, Some(next_free)) => {
        let after = self.header(next_free);

        self.set(
          index,
          Header::Free {
            length: length + after.length(),
            next: after.next(),
          },
        );
        self.set(next_free, Header::Vacant);
        self.link(prev, Some(index));
      }
      (false, None) => {
        self.set(
          index,
          Header::Free {
            length,
            next: current,
          },
        );
        self.link(prev, Some(index));
      }
    }

    Ok(length)
  }

  /// One past the last block of the free run at `node`. The sentinel borders
  /// nothing.
  fn end_of(
    &self,
    node: usize,
  ) -> Option<usize> {
    (node != self.sentinel).then(|| node + self.header(node).length())
  }

  fn link(
    &mut self,
    node: usize,
    to: Option<usize>,
  ) {
    let linked = match self.header(node) {
      Header::Free { length, .. } => Header::Free { length, next: to },
      Header::Sentinel { .. } => Header::Sentinel { next: to },
      other => {
        debug_assert!(false, "slot {node} is not a list node: {other:?}");
        return;
      }
    };

    self.set(node, linked);
  }
}

pub struct Runs<'a> {
  list: &'a FreeList,
  cursor: Option<usize>,
}

impl Iterator for Runs<'_> {
  type Item = (usize, usize);

  fn next(&mut self) -> Option<Self::Item> {
    let at = self.cursor?;
    let header = self.list.header(at);

    self.cursor = header.next();

    Some((at, header.length()))
  }
}
