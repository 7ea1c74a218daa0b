use fibre_block_policy::{
  BuildError, PolicyBuilder, PolicyConfig, PolicyKind, ReplacementPolicy, SetGeometry,
};

#[test]
fn builder_defaults() {
  let builder = PolicyBuilder::new().associativity(16).total_slots(256);
  assert_eq!(
    builder.geometry().unwrap(),
    SetGeometry::new(16, 256).unwrap()
  );

  let policy = builder.build().unwrap();
  assert_eq!(policy.kind(), PolicyKind::Recency);
  assert_eq!(policy.geometry().num_sets(), 16);
  let snap = policy.metrics();
  assert_eq!(snap.touches, 0);
  assert_eq!(snap.victim_searches, 0);
}

#[test]
fn typed_builds_expose_inherent_operations() {
  let mut lru = PolicyBuilder::new()
    .associativity(4)
    .total_slots(8)
    .build_recency()
    .unwrap();
  lru.move_to_tail(4).unwrap();
  assert_eq!(lru.set_order(1).unwrap(), vec![5, 6, 7, 4]);

  let mut lfu = PolicyBuilder::new()
    .associativity(4)
    .total_slots(8)
    .build_frequency()
    .unwrap();
  lfu.touch(6).unwrap();
  assert_eq!(lfu.count(6).unwrap(), 1);
}

#[test]
fn invalid_shapes_abort_construction() {
  let err = PolicyBuilder::new()
    .associativity(3)
    .total_slots(8)
    .kind(PolicyKind::Frequency)
    .build()
    .unwrap_err();
  assert!(matches!(err, BuildError::UnalignedSlots { .. }));
}

#[cfg(feature = "serde")]
#[test]
fn config_from_json() {
  let config: PolicyConfig =
    serde_json::from_str(r#"{ "associativity": 4, "total_slots": 32, "kind": "lfu" }"#).unwrap();
  assert_eq!(config.kind, PolicyKind::Frequency);
  let policy = config.build().unwrap();
  assert_eq!(policy.geometry().num_sets(), 8);

  let config: PolicyConfig =
    serde_json::from_str(r#"{ "associativity": 4, "total_slots": 32 }"#).unwrap();
  assert_eq!(config.kind, PolicyKind::Recency, "kind defaults to recency");

  let json = serde_json::to_string(&PolicyConfig {
    associativity: 2,
    total_slots: 4,
    kind: PolicyKind::Frequency,
  })
  .unwrap();
  assert_eq!(json, r#"{"associativity":2,"total_slots":4,"kind":"frequency"}"#);
}

#[cfg(feature = "serde")]
#[test]
fn unknown_kind_is_rejected() {
  let result: Result<PolicyConfig, _> =
    serde_json::from_str(r#"{ "associativity": 4, "total_slots": 32, "kind": "mru" }"#);
  assert!(result.is_err());
}
