//! Recency ordering: one doubly-linked list per set, threaded through a
//! per-slot link table.
//!
//! Links are set-relative offsets, so a set's list never refers outside the
//! set. Every access moves the slot to the tail; the head is the least
//! recently used slot and the first eviction candidate.

use crate::error::{try_alloc, PolicyError};
use crate::geometry::SetGeometry;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::policy::{link, PolicyKind, ReplacementPolicy, NIL};
use crate::state::{SlotState, SlotStates};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SetHead {
  head: u32,
  tail: u32,
}

impl SetHead {
  const EMPTY: SetHead = SetHead {
    head: NIL,
    tail: NIL,
  };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockLinks {
  prev: u32,
  next: u32,
}

impl BlockLinks {
  const UNLINKED: BlockLinks = BlockLinks {
    prev: NIL,
    next: NIL,
  };
}

/// Least-recently-used replacement, scoped to each set.
#[derive(Debug)]
pub struct RecencyPolicy {
  geometry: SetGeometry,
  // Empty until sets_init / blocks_init, and again after exit.
  sets: Vec<SetHead>,
  blocks: Vec<BlockLinks>,
  // Cleared by every init stage and exit; the lists are only trusted after bootstrap.
  bootstrapped: bool,
  metrics: Metrics,
}

impl RecencyPolicy {
  /// Creates the policy without allocating any list storage.
  pub fn new(geometry: SetGeometry) -> Self {
    Self {
      geometry,
      sets: Vec::new(),
      blocks: Vec::new(),
      bootstrapped: false,
      metrics: Metrics::new(),
    }
  }

  /// Moves the slot at global `index` to the tail of its set's list, linking
  /// it first if it is not linked yet.
  pub fn move_to_tail(&mut self, index: usize) -> Result<(), PolicyError> {
    self.geometry.check_slot(index)?;
    self.ensure_ready()?;
    self.relink_at_tail(index);
    Ok(())
  }

  fn ensure_storage(&self) -> Result<(), PolicyError> {
    if self.sets.is_empty() {
      return Err(PolicyError::NotInitialized("recency sets"));
    }
    if self.blocks.is_empty() {
      return Err(PolicyError::NotInitialized("recency blocks"));
    }
    Ok(())
  }

  fn ensure_ready(&self) -> Result<(), PolicyError> {
    self.ensure_storage()?;
    if !self.bootstrapped {
      return Err(PolicyError::NotInitialized("bootstrap"));
    }
    Ok(())
  }

  fn is_linked(&self, set: usize, index: usize) -> bool {
    let links = self.blocks[index];
    let offset = self.geometry.offset_of(index) as u32;
    links.prev != NIL || links.next != NIL || self.sets[set].head == offset
  }

  // Caller has validated `index` and checked that storage exists.
  fn relink_at_tail(&mut self, index: usize) {
    let set = self.geometry.set_of(index);
    let base = self.geometry.set_start(set);
    let me = self.geometry.offset_of(index) as u32;

    if self.is_linked(set, index) {
      if self.sets[set].tail == me {
        return;
      }
      let BlockLinks { prev, next } = self.blocks[index];
      match link(prev) {
        Some(p) => self.blocks[base + p].next = next,
        None => self.sets[set].head = next,
      }
      match link(next) {
        Some(n) => self.blocks[base + n].prev = prev,
        None => self.sets[set].tail = prev,
      }
    }

    let tail = self.sets[set].tail;
    self.blocks[index] = BlockLinks { prev: tail, next: NIL };
    match link(tail) {
      Some(t) => self.blocks[base + t].next = me,
      None => self.sets[set].head = me,
    }
    self.sets[set].tail = me;
  }

  /// Walks `set` from the head, calling `visit` with each global index until it
  /// returns `false`. The walk is bounded by the associativity.
  fn walk(&self, set: usize, mut visit: impl FnMut(usize) -> bool) {
    let base = self.geometry.set_start(set);
    let mut cursor = self.sets[set].head;
    for _ in 0..self.geometry.associativity() {
      let Some(offset) = link(cursor) else {
        return;
      };
      let index = base + offset;
      cursor = self.blocks[index].next;
      if !visit(index) {
        return;
      }
    }
  }
}

impl ReplacementPolicy for RecencyPolicy {
  fn kind(&self) -> PolicyKind {
    PolicyKind::Recency
  }

  fn geometry(&self) -> &SetGeometry {
    &self.geometry
  }

  fn sets_init(&mut self) -> Result<(), PolicyError> {
    let num_sets = self.geometry.num_sets();
    let mut sets = try_alloc("recency set headers", num_sets)?;
    sets.resize(num_sets, SetHead::EMPTY);
    self.sets = sets;
    // Old slot links would point into headers that no longer exist.
    self.blocks = Vec::new();
    self.bootstrapped = false;
    tracing::info!(policy = "lru", sets = num_sets, "initialized cache sets");
    Ok(())
  }

  fn blocks_init(&mut self) -> Result<(), PolicyError> {
    let total = self.geometry.total_slots();
    let mut blocks = try_alloc("recency block links", total)?;
    blocks.resize(total, BlockLinks::UNLINKED);
    self.blocks = blocks;
    self.bootstrapped = false;
    tracing::info!(policy = "lru", blocks = total, "initialized cache blocks");
    Ok(())
  }

  fn bootstrap(&mut self) -> Result<(), PolicyError> {
    self.ensure_storage()?;
    self.sets.fill(SetHead::EMPTY);
    for index in 0..self.geometry.total_slots() {
      self.blocks[index] = BlockLinks::UNLINKED;
      self.relink_at_tail(index);
    }
    self.bootstrapped = true;
    tracing::debug!(policy = "lru", blocks = self.blocks.len(), "seeded set lists");
    Ok(())
  }

  fn touch(&mut self, index: usize) -> Result<(), PolicyError> {
    self.move_to_tail(index)?;
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

    let mut scanned = 0;
    let mut victim = None;
    self.walk(set, |index| {
      scanned += 1;
      if states.state(index).is_reclaimable() {
        victim = Some(index);
        return false;
      }
      true
    });

    if let Some(index) = victim {
      self.relink_at_tail(index);
    }
    self.metrics.record_victim_search(scanned, victim.is_some());
    Ok(victim)
  }

  fn clean_set(
    &mut self,
    set: usize,
    budget: usize,
    states: &dyn SlotStates,
  ) -> Result<usize, PolicyError> {
    self.geometry.check_set(set)?;
    self.ensure_ready()?;

    let mut marked = 0;
    if budget > 0 {
      self.walk(set, |index| {
        if states.state(index).is_cleanable() {
          states.set_flags(index, SlotState::WRITEBACK_IN_PROGRESS);
          marked += 1;
        }
        marked < budget
      });
    }
    self.metrics.record_clean(marked);
    Ok(marked)
  }

  fn exit(&mut self) {
    self.sets = Vec::new();
    self.blocks = Vec::new();
    self.bootstrapped = false;
    tracing::info!(policy = "lru", "released set lists");
  }

  fn set_order(&self, set: usize) -> Result<Vec<usize>, PolicyError> {
    self.geometry.check_set(set)?;
    self.ensure_ready()?;
    let mut order = Vec::with_capacity(self.geometry.associativity());
    self.walk(set, |index| {
      order.push(index);
      true
    });
    Ok(order)
  }

  fn check_integrity(&self) -> Result<(), PolicyError> {
    self.ensure_ready()?;
    let assoc = self.geometry.associativity();

    for (set, head) in self.sets.iter().enumerate() {
      if (head.head == NIL) != (head.tail == NIL) {
        return Err(PolicyError::Corrupted(format!(
          "set {set}: head {:?} and tail {:?} disagree",
          link(head.head),
          link(head.tail)
        )));
      }

      let base = self.geometry.set_start(set);
      let mut prev = NIL;
      let mut cursor = head.head;
      let mut walked = 0usize;
      while let Some(offset) = link(cursor) {
        if offset >= assoc {
          return Err(PolicyError::Corrupted(format!(
            "set {set}: offset {offset} outside associativity {assoc}"
          )));
        }
        walked += 1;
        if walked > assoc {
          return Err(PolicyError::Corrupted(format!("set {set}: list cycles")));
        }
        let links = self.blocks[base + offset];
        if links.prev != prev {
          return Err(PolicyError::Corrupted(format!(
            "set {set}: slot {} has prev {:?}, expected {:?}",
            base + offset,
            link(links.prev),
            link(prev)
          )));
        }
        prev = cursor;
        cursor = links.next;
      }

      if prev != head.tail {
        return Err(PolicyError::Corrupted(format!(
          "set {set}: walk ended at {:?} but tail is {:?}",
          link(prev),
          link(head.tail)
        )));
      }
      let linked = self
        .geometry
        .slots_of(set)
        .filter(|&i| self.is_linked(set, i))
        .count();
      if linked != walked {
        return Err(PolicyError::Corrupted(format!(
          "set {set}: {linked} slots carry links but only {walked} are reachable"
        )));
      }
    }
    Ok(())
  }

  fn metrics(&self) -> MetricsSnapshot {
    self.metrics.snapshot()
  }
}
