use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

/// Counters updated by a policy's hot-path operations.
/// All fields are atomic so a snapshot can be taken without the set locks.
#[derive(Debug, Default)]
pub struct Metrics {
  // --- Access tracking ---
  pub(crate) touches: CachePadded<AtomicU64>,

  // --- Victim selection ---
  pub(crate) victim_searches: CachePadded<AtomicU64>,
  pub(crate) victims_found: CachePadded<AtomicU64>,
  pub(crate) victim_misses: CachePadded<AtomicU64>,
  pub(crate) victim_slots_scanned: CachePadded<AtomicU64>,

  // --- Write-back cleaning ---
  pub(crate) clean_passes: CachePadded<AtomicU64>,
  pub(crate) blocks_cleaned: CachePadded<AtomicU64>,
}

impl Metrics {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub(crate) fn record_touch(&self) {
    self.touches.fetch_add(1, Ordering::Relaxed);
  }

  #[inline]
  pub(crate) fn record_victim_search(&self, scanned: usize, found: bool) {
    self.victim_searches.fetch_add(1, Ordering::Relaxed);
    self
      .victim_slots_scanned
      .fetch_add(scanned as u64, Ordering::Relaxed);
    if found {
      self.victims_found.fetch_add(1, Ordering::Relaxed);
    } else {
      self.victim_misses.fetch_add(1, Ordering::Relaxed);
    }
  }

  #[inline]
  pub(crate) fn record_clean(&self, marked: usize) {
    self.clean_passes.fetch_add(1, Ordering::Relaxed);
    self.blocks_cleaned.fetch_add(marked as u64, Ordering::Relaxed);
  }

  pub(crate) fn snapshot(&self) -> MetricsSnapshot {
    let victim_searches = self.victim_searches.load(Ordering::Relaxed);
    let victims_found = self.victims_found.load(Ordering::Relaxed);

    MetricsSnapshot {
      touches: self.touches.load(Ordering::Relaxed),
      victim_searches,
      victims_found,
      victim_misses: self.victim_misses.load(Ordering::Relaxed),
      victim_slots_scanned: self.victim_slots_scanned.load(Ordering::Relaxed),
      victim_hit_ratio: if victim_searches == 0 {
        0.0
      } else {
        victims_found as f64 / victim_searches as f64
      },
      clean_passes: self.clean_passes.load(Ordering::Relaxed),
      blocks_cleaned: self.blocks_cleaned.load(Ordering::Relaxed),
    }
  }
}

/// A point-in-time copy of a policy's counters.
#[derive(Clone, Default)]
pub struct MetricsSnapshot {
  /// Accesses recorded through `touch`.
  pub touches: u64,
  /// Calls to `find_victim`.
  pub victim_searches: u64,
  /// Searches that returned a slot.
  pub victims_found: u64,
  /// Searches that found no eligible slot in the set.
  pub victim_misses: u64,
  /// List entries examined across all searches.
  pub victim_slots_scanned: u64,
  /// victims_found / victim_searches.
  pub victim_hit_ratio: f64,
  /// Calls to `clean_set`.
  pub clean_passes: u64,
  /// Slots marked for write-back across all clean passes.
  pub blocks_cleaned: u64,
}

impl fmt::Debug for MetricsSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MetricsSnapshot")
      .field("touches", &self.touches)
      .field("victim_searches", &self.victim_searches)
      .field("victims_found", &self.victims_found)
      .field("victim_misses", &self.victim_misses)
      .field("victim_slots_scanned", &self.victim_slots_scanned)
      .field(
        "victim_hit_ratio",
        &format!("{:.2}%", self.victim_hit_ratio * 100.0),
      )
      .field("clean_passes", &self.clean_passes)
      .field("blocks_cleaned", &self.blocks_cleaned)
      .finish()
  }
}
