use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
  #[error("out of memory: no free run can hold {requested} bytes")]
  OutOfMemory { requested: usize },

  #[error("released pointer was not allocated by this pool or was already freed")]
  InvalidRelease,

  #[error("zero-sized request")]
  ZeroSized,
}

/// A search mode name that is none of `first-fit`, `first`, `best-fit`, `best`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown search mode `{0}`")]
pub struct ParseSearchModeError(pub String);
