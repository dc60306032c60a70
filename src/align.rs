/// Rounds a byte count up to the number of whole blocks needed to hold it.
///
/// # Examples
///
/// ```rust
/// use slpool::{BLOCK_SIZE, blocks};
///
/// assert_eq!(blocks!(1), 1);
/// assert_eq!(blocks!(BLOCK_SIZE), 1);
/// assert_eq!(blocks!(BLOCK_SIZE + 1), 2);
/// ```
#[macro_export]
macro_rules! blocks {
  ($bytes:expr) => {{
    let bytes: usize = $bytes;
    bytes.div_ceil($crate::BLOCK_SIZE)
  }};
}

/// Rounds `value` up to the next multiple of `align`, which must be a power of two.
///
/// Usable in const context.
///
/// ```rust
/// use slpool::align_to;
///
/// assert_eq!(align_to!(13, 16), 16);
/// assert_eq!(align_to!(32, 16), 32);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    (($value) + ($align) - 1) & !(($align) - 1)
  };
}
