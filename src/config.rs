use std::fmt;
use std::str::FromStr;

use crate::error::ParseSearchModeError;

/// How a pool picks the free run that serves a request.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SearchMode {
  /// The first run in the list that is large enough.
  #[default]
  FirstFit,
  /// The smallest run that is large enough, scanning the whole list.
  BestFit,
}

impl fmt::Display for SearchMode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      SearchMode::FirstFit => f.write_str("first-fit"),
      SearchMode::BestFit => f.write_str("best-fit"),
    }
  }
}

impl FromStr for SearchMode {
  type Err = ParseSearchModeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "first-fit" | "first" => Ok(SearchMode::FirstFit),
      "best-fit" | "best" => Ok(SearchMode::BestFit),
      other => Err(ParseSearchModeError(other.to_owned())),
    }
  }
}

pub const POOL_CONFIG_DEFAULT_CAPACITY: usize = 4096;

/// Construction settings for a [`SlPool`](crate::SlPool).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
  /// Requested capacity in bytes. Rounded up to whole blocks.
  pub capacity: usize,
  /// Search mode used by [`StoragePool::allocate`](crate::StoragePool::allocate).
  pub search_mode: SearchMode,
}

impl PoolConfig {
  pub fn new(capacity: usize) -> Self {
    Self {
      capacity,
      ..Self::default()
    }
  }

  pub fn search_mode(
    mut self,
    search_mode: SearchMode,
  ) -> Self {
    self.search_mode = search_mode;
    self
  }
}

impl Default for PoolConfig {
  fn default() -> Self {
    Self {
      capacity: POOL_CONFIG_DEFAULT_CAPACITY,
      search_mode: SearchMode::default(),
    }
  }
}
