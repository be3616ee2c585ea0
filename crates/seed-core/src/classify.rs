//! Classification predicates over pairs of change records.
//!
//! A reconciliation loop is expected to consult them in this order:
//!
//! 1. [`service_filter`]: skip the key entirely if it is not discovery
//!    managed.
//! 2. [`service_replace`]: tear down the old watch and start a new one.
//! 3. [`service_update`]: refresh the existing watch in place.
//! 4. Otherwise nothing to do.
//!
//! [`relate`] bundles steps 2–4. All predicates are total and never mutate.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{message::Message, view::ConfView};

/// Whether the record declares both a service name and a discovery type.
pub fn service_filter<V: ConfView>(msg: &Message<V>) -> bool {
  !msg.service_name().is_empty() && !msg.discovery_type().is_empty()
}

/// Whether `next` keeps the discovery identity of `prev` but changes its
/// discovery arguments.
///
/// Absence of arguments on *both* sides is not an update; absence on exactly
/// one side is.
pub fn service_update<V: ConfView>(
  prev: &Message<V>,
  next: &Message<V>,
) -> bool {
  if service_replace(prev, next) {
    return false;
  }

  match (prev.discovery_args(), next.discovery_args()) {
    (None, None) => false,
    (None, Some(_)) | (Some(_), None) => true,
    (Some(a), Some(b)) => {
      a.group_name != b.group_name
        || a.namespace_id != b.namespace_id
        || a.metadata != b.metadata
    }
  }
}

/// Whether `next` targets a different service name or discovery type than
/// `prev`.
pub fn service_replace<V: ConfView>(
  prev: &Message<V>,
  next: &Message<V>,
) -> bool {
  prev.service_name() != next.service_name()
    || prev.discovery_type() != next.discovery_type()
}

// ─── Relation ────────────────────────────────────────────────────────────────

/// How a new record relates to the previously tracked one for the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
  /// Discovery identity changed.
  Replace,
  /// Identity unchanged, discovery arguments changed.
  Update,
  Unchanged,
}

/// Classify `next` against `prev`. Replace wins over update.
pub fn relate<V: ConfView>(
  prev: &Message<V>,
  next: &Message<V>,
) -> Relation {
  let relation = if service_replace(prev, next) {
    Relation::Replace
  } else if service_update(prev, next) {
    Relation::Update
  } else {
    Relation::Unchanged
  };
  trace!(key = %next.key, ?relation, "classified change");
  relation
}
