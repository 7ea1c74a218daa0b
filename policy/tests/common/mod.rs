#![allow(dead_code)]

use fibre_block_policy::{PolicyBuilder, PolicyKind, ReplacementPolicy, SlotState, SlotStateTable};

pub const KINDS: [PolicyKind; 2] = [PolicyKind::Recency, PolicyKind::Frequency];

pub fn build_policy(kind: PolicyKind, associativity: usize, total_slots: usize) -> Box<dyn ReplacementPolicy> {
  PolicyBuilder::new()
    .associativity(associativity)
    .total_slots(total_slots)
    .kind(kind)
    .build()
    .unwrap()
}

// Every slot starts with the given state.
pub fn states_filled(total_slots: usize, state: SlotState) -> SlotStateTable {
  let states = SlotStateTable::new(total_slots).unwrap();
  states.fill(state);
  states
}

pub fn dirty_idle() -> SlotState {
  SlotState::VALID | SlotState::DIRTY
}
