//! Slot state flags and the accessor through which the policy reads and
//! updates them.
//!
//! The flags belong to the cache manager. The policy only reads them to filter
//! eviction candidates and sets [`SlotState::WRITEBACK_IN_PROGRESS`] when a
//! clean pass picks a dirty slot.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::{try_alloc, PolicyError};

bitflags::bitflags! {
  /// Per-slot status bits.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
  pub struct SlotState: u8 {
    /// The slot holds cached data.
    const VALID = 1 << 0;
    /// The cached data is newer than the backing store.
    const DIRTY = 1 << 1;
    /// A read or fill is in flight against the slot.
    const IO_IN_PROGRESS = 1 << 2;
    /// A write-back of the slot to the backing store is in flight.
    const WRITEBACK_IN_PROGRESS = 1 << 3;

    /// Any kind of in-flight I/O.
    const IN_FLIGHT = Self::IO_IN_PROGRESS.bits() | Self::WRITEBACK_IN_PROGRESS.bits();
  }
}

impl SlotState {
  /// A slot may be reclaimed only when it is exactly `VALID`: clean and idle.
  #[inline]
  pub fn is_reclaimable(self) -> bool {
    self == SlotState::VALID
  }

  /// A slot may be queued for write-back when it is dirty and no I/O is in flight.
  #[inline]
  pub fn is_cleanable(self) -> bool {
    self.intersection(SlotState::DIRTY | SlotState::IN_FLIGHT) == SlotState::DIRTY
  }
}

/// Access to the externally owned state of each slot, addressed by global index.
///
/// Implementations use interior mutability: the policy holds only a shared
/// reference while it scans a set.
pub trait SlotStates {
  fn state(&self, index: usize) -> SlotState;

  fn set_flags(&self, index: usize, flags: SlotState);

  fn clear_flags(&self, index: usize, flags: SlotState);
}

/// A flat table of atomic slot states.
///
/// Out-of-range reads return an empty state and out-of-range writes are
/// ignored, so a stray index can never be mistaken for a reclaimable slot.
pub struct SlotStateTable {
  states: Box<[AtomicU8]>,
}

impl fmt::Debug for SlotStateTable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SlotStateTable")
      .field("slots", &self.states.len())
      .finish()
  }
}

impl SlotStateTable {
  /// Creates a table of `total_slots` entries, all with no flags set.
  pub fn new(total_slots: usize) -> Result<Self, PolicyError> {
    let mut states = try_alloc("slot states", total_slots)?;
    states.extend((0..total_slots).map(|_| AtomicU8::new(0)));
    Ok(Self {
      states: states.into_boxed_slice(),
    })
  }

  pub fn len(&self) -> usize {
    self.states.len()
  }

  pub fn is_empty(&self) -> bool {
    self.states.is_empty()
  }

  pub fn get(&self, index: usize) -> SlotState {
    self
      .states
      .get(index)
      .map(|s| SlotState::from_bits_truncate(s.load(Ordering::Acquire)))
      .unwrap_or_default()
  }

  /// Overwrites the whole state of a slot.
  pub fn set(&self, index: usize, state: SlotState) {
    if let Some(s) = self.states.get(index) {
      s.store(state.bits(), Ordering::Release);
    }
  }

  pub fn insert(&self, index: usize, flags: SlotState) {
    if let Some(s) = self.states.get(index) {
      s.fetch_or(flags.bits(), Ordering::AcqRel);
    }
  }

  pub fn remove(&self, index: usize, flags: SlotState) {
    if let Some(s) = self.states.get(index) {
      s.fetch_and(!flags.bits(), Ordering::AcqRel);
    }
  }

  /// Sets every slot to `state`.
  pub fn fill(&self, state: SlotState) {
    for s in self.states.iter() {
      s.store(state.bits(), Ordering::Release);
    }
  }
}

impl SlotStates for SlotStateTable {
  fn state(&self, index: usize) -> SlotState {
    self.get(index)
  }

  fn set_flags(&self, index: usize, flags: SlotState) {
    self.insert(index, flags);
  }

  fn clear_flags(&self, index: usize, flags: SlotState) {
    self.remove(index, flags);
  }
}
