//! Hiding and restoring the discovery identity of an encoded upstream.
//!
//! Once resolved nodes are injected, the gateway must route to those nodes
//! instead of running its own discovery for `service_name`. The identity is
//! therefore written under underscore-prefixed keys, which the gateway
//! ignores, and moved back when the payload is parsed again.

use serde_json::{Map, Value};

const STASHED: [(&str, &str); 2] = [
  ("service_name", "_service_name"),
  ("discovery_type", "_discovery_type"),
];

/// Move the identity to its stashed keys if the upstream carries nodes.
pub(crate) fn stash(upstream: &mut Map<String, Value>) {
  if !upstream.contains_key("nodes") {
    return;
  }
  for (plain, hidden) in STASHED {
    if let Some(value) = upstream.remove(plain) {
      upstream.insert(hidden.to_string(), value);
    }
  }
}

/// Move stashed identity back to the plain keys where those are absent.
pub(crate) fn restore(upstream: &mut Map<String, Value>) {
  for (plain, hidden) in STASHED {
    if upstream.contains_key(plain) {
      continue;
    }
    if let Some(value) = upstream.remove(hidden) {
      upstream.insert(plain.to_string(), value);
    }
  }
}
