pub mod frequency;
pub mod frequency_list;
pub mod recency;

use std::fmt;
use std::str::FromStr;

use crate::error::PolicyError;
use crate::geometry::SetGeometry;
use crate::metrics::MetricsSnapshot;
use crate::state::SlotStates;

pub use frequency::FrequencyPolicy;
pub use frequency_list::FrequencyList;
pub use recency::RecencyPolicy;

/// Null link. Never a valid offset or index: list capacities and associativity
/// are kept strictly below it.
pub(crate) const NIL: u32 = u32::MAX;

#[inline]
pub(crate) fn link(value: u32) -> Option<usize> {
  if value == NIL {
    None
  } else {
    Some(value as usize)
  }
}

/// Which ordering discipline a policy uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PolicyKind {
  /// Every access moves the slot to the tail; victims come from the head.
  #[default]
  #[cfg_attr(feature = "serde", serde(alias = "lru"))]
  Recency,
  /// Slots are kept ascending by access count; victims come from the head.
  #[cfg_attr(feature = "serde", serde(alias = "lfu"))]
  Frequency,
}

impl PolicyKind {
  pub fn name(&self) -> &'static str {
    match self {
      PolicyKind::Recency => "lru",
      PolicyKind::Frequency => "lfu",
    }
  }

  /// Creates an uninitialized policy of this kind for `geometry`.
  pub(crate) fn instantiate(self, geometry: SetGeometry) -> Box<dyn ReplacementPolicy> {
    match self {
      PolicyKind::Recency => Box::new(RecencyPolicy::new(geometry)),
      PolicyKind::Frequency => Box::new(FrequencyPolicy::new(geometry)),
    }
  }
}

impl fmt::Display for PolicyKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Error returned when parsing an unknown policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown replacement policy {0:?}")]
pub struct UnknownPolicy(pub String);

impl FromStr for PolicyKind {
  type Err = UnknownPolicy;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "lru" | "recency" => Ok(PolicyKind::Recency),
      "lfu" | "frequency" => Ok(PolicyKind::Frequency),
      _ => Err(UnknownPolicy(s.to_string())),
    }
  }
}

/// A per-set block replacement policy.
///
/// Lifecycle: construct, then `sets_init`, `blocks_init` and `bootstrap` once
/// each, then any number of `touch` / `find_victim` / `clean_set` calls, then
/// `exit`. `PolicyBuilder` runs the initialization sequence for you.
///
/// Re-running `sets_init` or `blocks_init` discards the current ordering.
/// Every other operation then fails with `NotInitialized` until `bootstrap`
/// has run again.
///
/// Nothing here is synchronized. The caller must hold whatever lock guards a
/// set (and the state flags of its slots) for the duration of every call that
/// addresses that set.
pub trait ReplacementPolicy: Send + Sync + fmt::Debug {
  fn kind(&self) -> PolicyKind;

  fn geometry(&self) -> &SetGeometry;

  /// Allocates the per-set list headers.
  fn sets_init(&mut self) -> Result<(), PolicyError>;

  /// Allocates the per-slot link storage. Requires `sets_init`.
  fn blocks_init(&mut self) -> Result<(), PolicyError>;

  /// Links every slot into its set's list in increasing index order, discarding
  /// any previous ordering.
  fn bootstrap(&mut self) -> Result<(), PolicyError>;

  /// Records an access to the slot at global `index`.
  fn touch(&mut self, index: usize) -> Result<(), PolicyError>;

  /// Picks a reclaimable slot in the set containing `start_index`.
  ///
  /// The set's list is scanned from the head and the first slot whose state
  /// is exactly `VALID` is chosen. The chosen slot stays linked but is
  /// repositioned as if it had just been accessed, so it is not offered again
  /// while the caller's reclaim is pending. That only holds if the caller
  /// moves the slot out of `VALID` before the next scan of the set.
  ///
  /// Returns `Ok(None)` when no slot in the set is eligible.
  fn find_victim(
    &mut self,
    start_index: usize,
    states: &dyn SlotStates,
  ) -> Result<Option<usize>, PolicyError>;

  /// Marks up to `budget` dirty, idle slots of `set` as write-back in progress,
  /// scanning from the head. Returns how many were marked.
  fn clean_set(
    &mut self,
    set: usize,
    budget: usize,
    states: &dyn SlotStates,
  ) -> Result<usize, PolicyError>;

  /// Releases all list storage. Further calls fail with `NotInitialized`.
  fn exit(&mut self);

  /// Global indices of the set's slots in list order, head first.
  fn set_order(&self, set: usize) -> Result<Vec<usize>, PolicyError>;

  /// Walks every list and verifies its links (and ordering, where the policy
  /// has one).
  fn check_integrity(&self) -> Result<(), PolicyError>;

  fn metrics(&self) -> MetricsSnapshot;
}
