use std::ops::Range;

use crate::error::PolicyError;
use crate::policy::NIL;

/// Shape of a set-associative cache: `total_slots` slots split into sets of
/// `associativity` contiguous slots.
///
/// Slot `i` lives in set `i / associativity` at offset `i % associativity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetGeometry {
  associativity: usize,
  total_slots: usize,
}

impl SetGeometry {
  pub fn new(associativity: usize, total_slots: usize) -> Result<Self, PolicyError> {
    if associativity == 0 {
      return Err(PolicyError::InvalidGeometry("associativity is zero"));
    }
    if total_slots == 0 {
      return Err(PolicyError::InvalidGeometry("total slot count is zero"));
    }
    if total_slots % associativity != 0 {
      return Err(PolicyError::InvalidGeometry(
        "total slots is not a multiple of associativity",
      ));
    }
    // Offsets are stored as u32 links with NIL reserved.
    if associativity >= NIL as usize {
      return Err(PolicyError::InvalidGeometry(
        "associativity does not fit in a set-relative link",
      ));
    }
    Ok(Self {
      associativity,
      total_slots,
    })
  }

  #[inline]
  pub fn associativity(&self) -> usize {
    self.associativity
  }

  #[inline]
  pub fn total_slots(&self) -> usize {
    self.total_slots
  }

  #[inline]
  pub fn num_sets(&self) -> usize {
    self.total_slots / self.associativity
  }

  #[inline]
  pub fn set_of(&self, index: usize) -> usize {
    index / self.associativity
  }

  #[inline]
  pub fn offset_of(&self, index: usize) -> usize {
    index % self.associativity
  }

  /// Global index of the first slot of `set`.
  #[inline]
  pub fn set_start(&self, set: usize) -> usize {
    set * self.associativity
  }

  #[inline]
  pub fn global_index(&self, set: usize, offset: usize) -> usize {
    self.set_start(set) + offset
  }

  /// Global indices covered by `set`.
  #[inline]
  pub fn slots_of(&self, set: usize) -> Range<usize> {
    let start = self.set_start(set);
    start..start + self.associativity
  }

  pub(crate) fn check_slot(&self, index: usize) -> Result<(), PolicyError> {
    PolicyError::check_index(index, self.total_slots)
  }

  pub(crate) fn check_set(&self, set: usize) -> Result<(), PolicyError> {
    PolicyError::check_index(set, self.num_sets())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn addressing_arithmetic() {
    let geo = SetGeometry::new(4, 16).unwrap();
    assert_eq!(geo.num_sets(), 4);
    assert_eq!(geo.set_of(9), 2);
    assert_eq!(geo.offset_of(9), 1);
    assert_eq!(geo.set_start(2), 8);
    assert_eq!(geo.global_index(2, 1), 9);
    assert_eq!(geo.slots_of(3), 12..16);
  }

  #[test]
  fn rejects_bad_shapes() {
    assert!(matches!(SetGeometry::new(0, 16), Err(PolicyError::InvalidGeometry(_))));
    assert!(matches!(SetGeometry::new(4, 0), Err(PolicyError::InvalidGeometry(_))));
    assert!(matches!(SetGeometry::new(3, 16), Err(PolicyError::InvalidGeometry(_))));
  }

  #[test]
  fn direct_mapped_is_allowed() {
    let geo = SetGeometry::new(1, 8).unwrap();
    assert_eq!(geo.num_sets(), 8);
    assert_eq!(geo.set_of(5), 5);
    assert_eq!(geo.offset_of(5), 0);
  }

  #[test]
  fn bounds_checks() {
    let geo = SetGeometry::new(2, 4).unwrap();
    assert!(geo.check_slot(3).is_ok());
    assert!(geo.check_slot(4).is_err());
    assert!(geo.check_set(1).is_ok());
    assert!(geo.check_set(2).is_err());
  }
}
