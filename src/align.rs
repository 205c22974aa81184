/// Alignment applied to every payload handed out by the allocator.
pub const ALIGNMENT: usize = 8;

/// Rounds the given size up to [`ALIGNMENT`].
///
/// # Examples
///
/// ```rust
/// use umalloc::align;
///
/// assert_eq!(align!(13), 16);
/// assert_eq!(align!(16), 16);
/// assert_eq!(align!(0), 0);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, $crate::align::ALIGNMENT)
  };
}

/// Rounds the given size up to an arbitrary power-of-two boundary.
///
/// ```rust
/// use umalloc::align_to;
///
/// assert_eq!(align_to!(1024, 4096), 4096);
/// assert_eq!(align_to!(4097, 4096), 8192);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}

/// Same as [`align_to!`] but returns `None` instead of overflowing.
pub fn checked_align_to(
  value: usize,
  align: usize,
) -> Option<usize> {
  debug_assert!(align.is_power_of_two());
  Some(value.checked_add(align - 1)? & !(align - 1))
}
