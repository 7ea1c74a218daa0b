// policy/tests/scenarios.rs

mod common;

use common::{build_policy, dirty_idle, states_filled, KINDS};
use fibre_block_policy::{FrequencyList, PolicyBuilder, PolicyKind, SlotState, SlotStateTable};
use pretty_assertions::assert_eq;

#[test]
fn recency_bootstrap_touch_and_victim() {
  let mut policy = build_policy(PolicyKind::Recency, 4, 4);
  assert_eq!(policy.set_order(0).unwrap(), vec![0, 1, 2, 3]);

  policy.touch(1).unwrap();
  assert_eq!(policy.set_order(0).unwrap(), vec![0, 2, 3, 1]);

  // Only slot 2 is valid and idle.
  let states = states_filled(4, dirty_idle());
  states.set(2, SlotState::VALID);
  assert_eq!(policy.find_victim(0, &states).unwrap(), Some(2));
  assert_eq!(policy.set_order(0).unwrap(), vec![0, 3, 1, 2]);
  policy.check_integrity().unwrap();
}

#[test]
fn frequency_list_insert_pop_and_touch() {
  const A: usize = 0;
  const B: usize = 1;
  const C: usize = 2;

  let mut list = FrequencyList::create(3).unwrap();
  list.insert(A, 5).unwrap();
  list.insert(B, 2).unwrap();
  list.insert(C, 8).unwrap();
  assert_eq!(list.iter().collect::<Vec<_>>(), vec![(B, 2), (A, 5), (C, 8)]);

  list.touch(A).unwrap();
  assert_eq!(list.iter().collect::<Vec<_>>(), vec![(B, 2), (A, 6), (C, 8)]);

  assert_eq!(list.pop_head(), Some((B, 2)));
  assert_eq!(list.peek_head(), Some((A, 6)));
  list.check_integrity().unwrap();
}

#[test]
fn clean_set_budget_spans_calls() {
  for kind in KINDS {
    let mut policy = build_policy(kind, 4, 8);
    let states = states_filled(8, SlotState::VALID);
    for index in [4, 6, 7] {
      states.set(index, dirty_idle());
    }

    assert_eq!(policy.clean_set(1, 2, &states).unwrap(), 2, "{kind}");
    assert_eq!(policy.clean_set(1, 2, &states).unwrap(), 1, "{kind}");
    assert_eq!(policy.clean_set(1, 2, &states).unwrap(), 0, "{kind}");
    for index in [4, 6, 7] {
      assert!(states.get(index).contains(SlotState::WRITEBACK_IN_PROGRESS));
    }
    assert_eq!(states.get(5), SlotState::VALID, "clean slots are left alone");
    for index in 0..4 {
      assert_eq!(states.get(index), SlotState::VALID, "other sets untouched");
    }
  }
}

#[test]
fn clean_set_skips_slots_under_io() {
  for kind in KINDS {
    let mut policy = build_policy(kind, 4, 4);
    let states = states_filled(4, dirty_idle() | SlotState::IO_IN_PROGRESS);
    states.set(3, dirty_idle());
    assert_eq!(policy.clean_set(0, 4, &states).unwrap(), 1, "{kind}");
    assert!(!states.get(0).contains(SlotState::WRITEBACK_IN_PROGRESS));
  }
}

#[test]
fn victim_never_dirty_or_in_flight() {
  for kind in KINDS {
    let mut policy = build_policy(kind, 4, 4);
    let states = SlotStateTable::new(4).unwrap();
    states.set(0, SlotState::VALID | SlotState::DIRTY);
    states.set(1, SlotState::VALID | SlotState::IO_IN_PROGRESS);
    states.set(2, SlotState::VALID | SlotState::WRITEBACK_IN_PROGRESS);
    states.set(3, SlotState::empty());
    assert_eq!(policy.find_victim(2, &states).unwrap(), None, "{kind}");
    assert_eq!(policy.metrics().victim_misses, 1);
  }
}

// The victim stays linked; only the caller moving it out of VALID keeps it
// from being chosen again.
#[test]
fn victim_reposition_relies_on_caller_state_change() {
  for kind in KINDS {
    let mut policy = build_policy(kind, 2, 2);
    let states = states_filled(2, SlotState::VALID);

    let first = policy.find_victim(0, &states).unwrap().unwrap();
    let second = policy.find_victim(0, &states).unwrap().unwrap();
    assert_ne!(first, second, "{kind}: repositioned victim is deprioritized");

    states.set(first, SlotState::VALID | SlotState::IO_IN_PROGRESS);
    states.set(second, SlotState::VALID | SlotState::IO_IN_PROGRESS);
    assert_eq!(policy.find_victim(0, &states).unwrap(), None, "{kind}");

    // Reclaim of `first` completes without the caller invalidating it: the
    // slot simply re-enters circulation.
    states.set(first, SlotState::VALID);
    assert_eq!(policy.find_victim(1, &states).unwrap(), Some(first), "{kind}");
    policy.check_integrity().unwrap();
  }
}

#[test]
fn sets_are_independent() {
  for kind in KINDS {
    let mut policy = build_policy(kind, 2, 6);
    let states = states_filled(6, SlotState::VALID);
    states.set(2, dirty_idle());
    states.set(3, dirty_idle());

    assert_eq!(policy.find_victim(2, &states).unwrap(), None, "{kind}");
    assert_eq!(policy.find_victim(5, &states).unwrap(), Some(4), "{kind}");
    assert_eq!(policy.set_order(0).unwrap(), vec![0, 1], "{kind}");
  }
}

#[test]
fn teardown_then_rebuild() {
  let mut policy = PolicyBuilder::new()
    .associativity(4)
    .total_slots(8)
    .build()
    .unwrap();
  policy.touch(0).unwrap();
  policy.exit();
  assert!(policy.touch(0).is_err());

  // A fresh init sequence restores index order; no access order survives.
  policy.sets_init().unwrap();
  policy.blocks_init().unwrap();
  policy.bootstrap().unwrap();
  assert_eq!(policy.set_order(0).unwrap(), vec![0, 1, 2, 3]);
}
