use crate::error::{BuildError, PolicyError};
use crate::geometry::SetGeometry;
use crate::policy::{FrequencyPolicy, PolicyKind, RecencyPolicy, ReplacementPolicy};

/// A builder for fully initialized replacement policies.
///
/// `build` runs every initialization stage (`sets_init`, `blocks_init`,
/// `bootstrap`). If any stage fails the half-built policy is dropped and the
/// error is returned, so callers never see a partially initialized policy.
#[derive(Debug, Clone, Default)]
pub struct PolicyBuilder {
  associativity: usize,
  total_slots: usize,
  kind: PolicyKind,
}

impl PolicyBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the number of slots per set.
  pub fn associativity(mut self, associativity: usize) -> Self {
    self.associativity = associativity;
    self
  }

  /// Sets the total number of slots. Must be a multiple of the associativity.
  pub fn total_slots(mut self, total_slots: usize) -> Self {
    self.total_slots = total_slots;
    self
  }

  /// Selects the ordering discipline. Defaults to [`PolicyKind::Recency`].
  pub fn kind(mut self, kind: PolicyKind) -> Self {
    self.kind = kind;
    self
  }

  /// Validates the configured shape.
  pub fn geometry(&self) -> Result<SetGeometry, BuildError> {
    if self.associativity == 0 {
      return Err(BuildError::ZeroAssociativity);
    }
    if self.total_slots == 0 {
      return Err(BuildError::ZeroSlots);
    }
    if self.total_slots % self.associativity != 0 {
      return Err(BuildError::UnalignedSlots {
        total_slots: self.total_slots,
        associativity: self.associativity,
      });
    }
    Ok(SetGeometry::new(self.associativity, self.total_slots)?)
  }

  /// Builds the policy selected by [`kind`](Self::kind).
  pub fn build(self) -> Result<Box<dyn ReplacementPolicy>, BuildError> {
    let geometry = self.geometry()?;
    let mut policy = self.kind.instantiate(geometry);
    initialize(policy.as_mut())?;
    Ok(policy)
  }

  /// Builds a recency policy regardless of the configured kind.
  pub fn build_recency(self) -> Result<RecencyPolicy, BuildError> {
    let mut policy = RecencyPolicy::new(self.geometry()?);
    initialize(&mut policy)?;
    Ok(policy)
  }

  /// Builds a frequency policy regardless of the configured kind.
  pub fn build_frequency(self) -> Result<FrequencyPolicy, BuildError> {
    let mut policy = FrequencyPolicy::new(self.geometry()?);
    initialize(&mut policy)?;
    Ok(policy)
  }
}

fn initialize(policy: &mut dyn ReplacementPolicy) -> Result<(), PolicyError> {
  policy.sets_init()?;
  policy.blocks_init()?;
  policy.bootstrap()?;
  tracing::info!(
    policy = policy.kind().name(),
    associativity = policy.geometry().associativity(),
    sets = policy.geometry().num_sets(),
    "replacement policy ready"
  );
  Ok(())
}

/// Plain-data policy configuration, suitable for embedding in a host's config file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolicyConfig {
  pub associativity: usize,
  pub total_slots: usize,
  #[cfg_attr(feature = "serde", serde(default))]
  pub kind: PolicyKind,
}

impl PolicyConfig {
  pub fn build(&self) -> Result<Box<dyn ReplacementPolicy>, BuildError> {
    PolicyBuilder::from(self.clone()).build()
  }
}

impl From<PolicyConfig> for PolicyBuilder {
  fn from(config: PolicyConfig) -> Self {
    PolicyBuilder::new()
      .associativity(config.associativity)
      .total_slots(config.total_slots)
      .kind(config.kind)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_missing_shape() {
    assert_eq!(
      PolicyBuilder::new().total_slots(8).build().unwrap_err(),
      BuildError::ZeroAssociativity
    );
    assert_eq!(
      PolicyBuilder::new().associativity(4).build().unwrap_err(),
      BuildError::ZeroSlots
    );
    assert_eq!(
      PolicyBuilder::new()
        .associativity(4)
        .total_slots(10)
        .build()
        .unwrap_err(),
      BuildError::UnalignedSlots {
        total_slots: 10,
        associativity: 4
      }
    );
  }

  #[test]
  fn associativity_beyond_link_range_is_init_error() {
    let err = PolicyBuilder::new()
      .associativity(u32::MAX as usize)
      .total_slots(u32::MAX as usize)
      .geometry()
      .unwrap_err();
    assert!(matches!(err, BuildError::Init(PolicyError::InvalidGeometry(_))));
  }

  #[test]
  fn builds_selected_kind() {
    let policy = PolicyBuilder::new()
      .associativity(4)
      .total_slots(16)
      .kind(PolicyKind::Frequency)
      .build()
      .unwrap();
    assert_eq!(policy.kind(), PolicyKind::Frequency);
    assert_eq!(policy.geometry().num_sets(), 4);
    policy.check_integrity().unwrap();
  }

  #[test]
  fn default_kind_is_recency() {
    let policy = PolicyBuilder::new()
      .associativity(2)
      .total_slots(4)
      .build()
      .unwrap();
    assert_eq!(policy.kind(), PolicyKind::Recency);
    assert_eq!(policy.set_order(1).unwrap(), vec![2, 3]);
  }

  #[test]
  fn config_round_trips_into_builder() {
    let config = PolicyConfig {
      associativity: 8,
      total_slots: 64,
      kind: PolicyKind::Frequency,
    };
    let policy = config.build().unwrap();
    assert_eq!(policy.kind(), PolicyKind::Frequency);
    assert_eq!(policy.geometry().total_slots(), 64);
  }
}
