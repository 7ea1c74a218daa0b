//! Block replacement core for set-associative, write-back block caches.
//!
//! A fixed pool of cache slots is split into sets of `associativity` slots.
//! For each set this crate keeps an eviction list and answers three questions
//! for the cache manager:
//!
//! - **Which slot should be reclaimed?** `find_victim` scans the set from its
//!   coldest end and returns the first slot that is valid, clean and idle.
//! - **Which dirty slots should be written back?** `clean_set` marks up to a
//!   budget of dirty, idle slots as write-back in progress.
//! - **What was just used?** `touch` records an access.
//!
//! # Policies
//! - [`RecencyPolicy`]: least recently used, one index-linked list per set.
//! - [`FrequencyPolicy`]: least frequently used, one [`FrequencyList`] per set.
//!
//! Both implement [`ReplacementPolicy`] and are normally created through
//! [`PolicyBuilder`].
//!
//! # Concurrency
//! Nothing in this crate locks. Callers serialize all calls that address the
//! same set, and hold that serialization while the policy reads or flips the
//! set's slot state flags.

pub mod builder;
pub mod error;
pub mod geometry;
pub mod metrics;
pub mod policy;
pub mod state;

pub use builder::{PolicyBuilder, PolicyConfig};
pub use error::{BuildError, ErrorKind, PolicyError};
pub use geometry::SetGeometry;
pub use metrics::MetricsSnapshot;
pub use policy::{
  FrequencyList, FrequencyPolicy, PolicyKind, RecencyPolicy, ReplacementPolicy, UnknownPolicy,
};
pub use state::{SlotState, SlotStateTable, SlotStates};
