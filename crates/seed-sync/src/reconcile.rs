//! Per-key tracking of discovery-managed records.

use std::collections::HashMap;

use seed_core::{
  ConfView, Message, Node, Relation, relate, service_filter,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Result;

// ─── Decisions ───────────────────────────────────────────────────────────────

/// The discovery identity a watch is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
  pub service_name:   String,
  pub discovery_type: String,
}

impl Identity {
  pub fn of<V: ConfView>(msg: &Message<V>) -> Self {
    Self {
      service_name:   msg.service_name().to_string(),
      discovery_type: msg.discovery_type().to_string(),
    }
  }
}

/// What the discovery layer should do in response to one change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
  /// The key is not (and was not) discovery managed.
  Ignore,
  /// The change is not newer than the tracked record and was dropped.
  Stale { tracked_version: i64 },
  /// Start watching a newly managed key.
  Watch { identity: Identity },
  /// Tear down the watch for `from` and start one for `to`.
  Replace { from: Identity, to: Identity },
  /// Re-resolve the existing watch with new discovery arguments.
  Refresh { identity: Identity },
  Unchanged,
  /// The key was deleted or is no longer discovery managed.
  Unwatch { identity: Identity },
}

// ─── Reconciler ──────────────────────────────────────────────────────────────

/// Holds at most one record per key and classifies each new record against
/// the tracked one.
///
/// Records are owned here, so all mutation of a record (identity caching,
/// node injection) goes through `&mut self`; callers that share a reconciler
/// across tasks must wrap it in a lock.
#[derive(Debug)]
pub struct Reconciler<V> {
  tracked: HashMap<String, Message<V>>,
}

impl<V> Default for Reconciler<V> {
  fn default() -> Self {
    Self {
      tracked: HashMap::new(),
    }
  }
}

impl<V: ConfView> Reconciler<V> {
  pub fn new() -> Self { Self::default() }

  pub fn get(&self, key: &str) -> Option<&Message<V>> { self.tracked.get(key) }

  pub fn len(&self) -> usize { self.tracked.len() }

  pub fn is_empty(&self) -> bool { self.tracked.is_empty() }

  /// Keys currently tracked, in no particular order.
  pub fn tracked(&self) -> impl Iterator<Item = &str> {
    self.tracked.keys().map(String::as_str)
  }

  /// Classify `next` against the tracked record for its key and update the
  /// table accordingly.
  pub fn apply(&mut self, mut next: Message<V>) -> Decision {
    if let Some(prev) = self.tracked.get(&next.key)
      && prev.version >= next.version
    {
      debug!(
        key = %next.key,
        tracked = prev.version,
        version = next.version,
        "dropping stale change"
      );
      return Decision::Stale {
        tracked_version: prev.version,
      };
    }

    if next.action.is_delete() || !service_filter(&next) {
      return match self.tracked.remove(&next.key) {
        Some(prev) => {
          let identity = Identity::of(&prev);
          info!(
            key = %next.key,
            service = %identity.service_name,
            discovery = %identity.discovery_type,
            "unwatching"
          );
          Decision::Unwatch { identity }
        }
        None => {
          debug!(key = %next.key, "not discovery managed");
          Decision::Ignore
        }
      };
    }

    next.cache_identity();
    let decision = match self.tracked.get(&next.key) {
      None => {
        let identity = Identity::of(&next);
        info!(
          key = %next.key,
          service = %identity.service_name,
          discovery = %identity.discovery_type,
          "watching"
        );
        Decision::Watch { identity }
      }
      Some(prev) => match relate(prev, &next) {
        Relation::Replace => {
          let (from, to) = (Identity::of(prev), Identity::of(&next));
          info!(
            key = %next.key,
            from = %from.service_name,
            to = %to.service_name,
            "replacing watch"
          );
          Decision::Replace { from, to }
        }
        Relation::Update => {
          debug!(key = %next.key, "discovery arguments changed");
          Decision::Refresh {
            identity: Identity::of(&next),
          }
        }
        Relation::Unchanged => Decision::Unchanged,
      },
    };

    self.tracked.insert(next.key.clone(), next);
    decision
  }

  /// Inject resolved nodes into the tracked record for `key` and return its
  /// re-encoded payload.
  ///
  /// Returns `Ok(None)` if the key is not tracked or its configuration shape
  /// has no nodes field.
  pub fn inject(
    &mut self,
    key: &str,
    nodes: Vec<Node>,
  ) -> Result<Option<Vec<u8>>> {
    let Some(msg) = self.tracked.get_mut(key) else {
      return Ok(None);
    };
    if !msg.has_nodes_attr() {
      debug!(key, "no nodes attribute; skipping injection");
      return Ok(None);
    }
    msg.inject_nodes(nodes);
    Ok(Some(msg.marshal()?))
  }
}
