//! Frequency ordering: one [`FrequencyList`] per set, indexed by set-relative
//! offset and keyed by each slot's access count.
//!
//! Lists are never shared between sets, so offsets from different sets cannot
//! collide.

use crate::error::{try_alloc, PolicyError};
use crate::geometry::SetGeometry;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::policy::frequency_list::FrequencyList;
use crate::policy::{PolicyKind, ReplacementPolicy};
use crate::state::{SlotState, SlotStates};

/// Least-frequently-used replacement, scoped to each set.
#[derive(Debug)]
pub struct FrequencyPolicy {
  geometry: SetGeometry,
  lists: Vec<FrequencyList>,
  blocks_ready: bool,
  bootstrapped: bool,
  metrics: Metrics,
}

impl FrequencyPolicy {
  /// Creates the policy without allocating any list storage.
  pub fn new(geometry: SetGeometry) -> Self {
    Self {
      geometry,
      lists: Vec::new(),
      blocks_ready: false,
      bootstrapped: false,
      metrics: Metrics::new(),
    }
  }

  /// Current access count of the slot at global `index`.
  pub fn count(&self, index: usize) -> Result<u64, PolicyError> {
    self.geometry.check_slot(index)?;
    self.ensure_ready()?;
    let set = self.geometry.set_of(index);
    let key = self.lists[set].key(self.geometry.offset_of(index));
    Ok(key.unwrap_or_default())
  }

  fn ensure_storage(&self) -> Result<(), PolicyError> {
    if self.lists.is_empty() {
      return Err(PolicyError::NotInitialized("frequency sets"));
    }
    if !self.blocks_ready {
      return Err(PolicyError::NotInitialized("frequency blocks"));
    }
    Ok(())
  }

  // Init stages empty the lists, so they are only usable after bootstrap.
  fn ensure_ready(&self) -> Result<(), PolicyError> {
    self.ensure_storage()?;
    if !self.bootstrapped {
      return Err(PolicyError::NotInitialized("bootstrap"));
    }
    Ok(())
  }
}

impl ReplacementPolicy for FrequencyPolicy {
  fn kind(&self) -> PolicyKind {
    PolicyKind::Frequency
  }

  fn geometry(&self) -> &SetGeometry {
    &self.geometry
  }

  fn sets_init(&mut self) -> Result<(), PolicyError> {
    let num_sets = self.geometry.num_sets();
    let mut lists = try_alloc("frequency set lists", num_sets)?;
    for _ in 0..num_sets {
      lists.push(FrequencyList::create(self.geometry.associativity())?);
    }
    self.lists = lists;
    self.blocks_ready = false;
    self.bootstrapped = false;
    tracing::info!(policy = "lfu", sets = num_sets, "initialized cache sets");
    Ok(())
  }

  fn blocks_init(&mut self) -> Result<(), PolicyError> {
    if self.lists.is_empty() {
      return Err(PolicyError::NotInitialized("frequency sets"));
    }
    // Per-slot elements live inside the set lists; start them unlinked at zero.
    for list in &mut self.lists {
      list.clear();
    }
    self.blocks_ready = true;
    self.bootstrapped = false;
    tracing::info!(
      policy = "lfu",
      blocks = self.geometry.total_slots(),
      "initialized cache blocks"
    );
    Ok(())
  }

  fn bootstrap(&mut self) -> Result<(), PolicyError> {
    self.ensure_storage()?;
    let assoc = self.geometry.associativity();
    for list in &mut self.lists {
      list.clear();
      for offset in 0..assoc {
        list.insert(offset, 0)?;
      }
    }
    self.bootstrapped = true;
    tracing::debug!(
      policy = "lfu",
      blocks = self.geometry.total_slots(),
      "seeded set lists"
    );
    Ok(())
  }

  fn touch(&mut self, index: usize) -> Result<(), PolicyError> {
    self.geometry.check_slot(index)?;
    self.ensure_ready()?;
    let set = self.geometry.set_of(index);
    self.lists[set].touch(self.geometry.offset_of(index))?;
    self.metrics.record_touch();
    Ok(())
  }

  fn find_victim(
    &mut self,
    start_index: usize,
    states: &dyn SlotStates,
  ) -> Result<Option<usize>, PolicyError> {
    self.geometry.check_slot(start_index)?;
    self.ensure_ready()?;
    let set = self.geometry.set_of(start_index);
    let base = self.geometry.set_start(set);

    let mut scanned = 0;
    let victim = self.lists[set]
      .iter()
      .inspect(|_| scanned += 1)
      .map(|(offset, _)| offset)
      .find(|&offset| states.state(base + offset).is_reclaimable());

    // The reservation bump is never undone: the block loaded into the slot
    // starts from the evicted block's count plus one.
    if let Some(offset) = victim {
      self.lists[set].touch(offset)?;
    }
    self.metrics.record_victim_search(scanned, victim.is_some());
    Ok(victim.map(|offset| base + offset))
  }

  fn clean_set(
    &mut self,
    set: usize,
    budget: usize,
    states: &dyn SlotStates,
  ) -> Result<usize, PolicyError> {
    self.geometry.check_set(set)?;
    self.ensure_ready()?;
    let base = self.geometry.set_start(set);

    let mut marked = 0;
    for (offset, _) in self.lists[set].iter() {
      if marked >= budget {
        break;
      }
      let index = base + offset;
      if states.state(index).is_cleanable() {
        states.set_flags(index, SlotState::WRITEBACK_IN_PROGRESS);
        marked += 1;
      }
    }
    self.metrics.record_clean(marked);
    Ok(marked)
  }

  fn exit(&mut self) {
    self.lists = Vec::new();
    self.blocks_ready = false;
    self.bootstrapped = false;
    tracing::info!(policy = "lfu", "released set lists");
  }

  fn set_order(&self, set: usize) -> Result<Vec<usize>, PolicyError> {
    self.geometry.check_set(set)?;
    self.ensure_ready()?;
    let base = self.geometry.set_start(set);
    Ok(self.lists[set].iter().map(|(offset, _)| base + offset).collect())
  }

  fn check_integrity(&self) -> Result<(), PolicyError> {
    self.ensure_ready()?;
    for (set, list) in self.lists.iter().enumerate() {
      if list.capacity() != self.geometry.associativity() {
        return Err(PolicyError::Corrupted(format!(
          "set {set}: list capacity {} differs from associativity {}",
          list.capacity(),
          self.geometry.associativity()
        )));
      }
      list
        .check_integrity()
        .map_err(|e| PolicyError::Corrupted(format!("set {set}: {e}")))?;
    }
    Ok(())
  }

  fn metrics(&self) -> MetricsSnapshot {
    self.metrics.snapshot()
  }
}
