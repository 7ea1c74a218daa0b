use thiserror::Error;

/// Coarse classification of a [`PolicyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Storage for a list, set table or block table could not be allocated.
  OutOfMemory,
  /// An index, capacity or geometry was out of range, or the policy was used
  /// before initialization / after teardown.
  InvalidArgument,
  /// A list failed an explicit integrity check.
  Corrupted,
}

/// Errors returned by the replacement-policy operations.
///
/// "No eligible victim" is not an error: `find_victim` reports it as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
  /// Reserving storage for `count` entries of `what` failed.
  #[error("failed to allocate {what} for {count} entries")]
  OutOfMemory { what: &'static str, count: usize },

  /// `index` is not below `limit`.
  #[error("index {index} is out of range (limit {limit})")]
  IndexOutOfRange { index: usize, limit: usize },

  /// A list capacity of zero, or one too large to be addressed by a link.
  #[error("invalid list capacity {0}")]
  InvalidCapacity(usize),

  /// The associativity / slot count pair cannot describe a set-associative cache.
  #[error("invalid cache geometry: {0}")]
  InvalidGeometry(&'static str),

  /// The named lifecycle stage has not run yet, or the policy was torn down.
  #[error("{0} has not been initialized")]
  NotInitialized(&'static str),

  /// A list walk found a broken link, a cycle, a size mismatch or a key out of order.
  #[error("list integrity violated: {0}")]
  Corrupted(String),
}

impl PolicyError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      PolicyError::OutOfMemory { .. } => ErrorKind::OutOfMemory,
      PolicyError::IndexOutOfRange { .. }
      | PolicyError::InvalidCapacity(_)
      | PolicyError::InvalidGeometry(_)
      | PolicyError::NotInitialized(_) => ErrorKind::InvalidArgument,
      PolicyError::Corrupted(_) => ErrorKind::Corrupted,
    }
  }

  #[inline]
  pub(crate) fn check_index(index: usize, limit: usize) -> Result<(), PolicyError> {
    if index < limit {
      Ok(())
    } else {
      Err(PolicyError::IndexOutOfRange { index, limit })
    }
  }
}

/// Errors that can occur when building a replacement policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
  /// The associativity (slots per set) was never set or is zero.
  #[error("associativity cannot be zero")]
  ZeroAssociativity,
  /// The total number of slots was never set or is zero.
  #[error("total slot count cannot be zero")]
  ZeroSlots,
  /// `total_slots` is not an exact multiple of the associativity.
  #[error("total slots ({total_slots}) is not a multiple of associativity ({associativity})")]
  UnalignedSlots { total_slots: usize, associativity: usize },
  /// One of the initialization stages failed. Nothing was constructed.
  #[error("policy initialization failed: {0}")]
  Init(#[from] PolicyError),
}

/// Reserves room for exactly `count` elements, reporting failure instead of aborting.
pub(crate) fn try_alloc<T>(what: &'static str, count: usize) -> Result<Vec<T>, PolicyError> {
  let mut storage = Vec::new();
  storage
    .try_reserve_exact(count)
    .map_err(|_| PolicyError::OutOfMemory { what, count })?;
  Ok(storage)
}
