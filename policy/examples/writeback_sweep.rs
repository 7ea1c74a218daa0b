//! Drives a small cache through misses, hits and a write-back sweep, printing
//! what the policy decides along the way.
//!
//! Run with `RUST_LOG=debug cargo run --example writeback_sweep -- lfu`.

use fibre_block_policy::{PolicyBuilder, PolicyKind, SlotState, SlotStateTable};
use tracing_subscriber::EnvFilter;

const ASSOCIATIVITY: usize = 4;
const TOTAL_SLOTS: usize = 16;

fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let kind: PolicyKind = std::env::args()
    .nth(1)
    .unwrap_or_else(|| "lru".to_string())
    .parse()?;

  let mut policy = PolicyBuilder::new()
    .associativity(ASSOCIATIVITY)
    .total_slots(TOTAL_SLOTS)
    .kind(kind)
    .build()?;
  let states = SlotStateTable::new(TOTAL_SLOTS)?;
  states.fill(SlotState::VALID);

  // A few hits in set 1, one of them a write.
  for index in [4, 5, 5, 6] {
    policy.touch(index)?;
  }
  states.insert(5, SlotState::DIRTY);
  println!("set 1 order after hits: {:?}", policy.set_order(1)?);

  // A miss mapping to set 1 needs a slot.
  match policy.find_victim(4, &states)? {
    Some(victim) => {
      println!("reclaiming slot {victim}");
      states.set(victim, SlotState::VALID | SlotState::IO_IN_PROGRESS);
      // ... fill completes ...
      states.set(victim, SlotState::VALID);
      policy.touch(victim)?;
    }
    None => println!("set 1 has no reclaimable slot"),
  }

  let marked = policy.clean_set(1, 2, &states)?;
  println!("queued {marked} slot(s) for write-back");
  for index in 4..8 {
    println!("  slot {index}: {:?}", states.get(index));
  }

  policy.check_integrity()?;
  println!("{:#?}", policy.metrics());
  policy.exit();
  Ok(())
}
