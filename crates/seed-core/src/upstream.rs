//! The upstream section of a gateway configuration entity.
//!
//! These types are the contract between the change classifier and the
//! configuration view that decodes payloads. Fields the classifier does not
//! interpret are kept verbatim in [`Upstream::extra`] so that a parsed
//! upstream re-serializes without loss.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Label that caches the resolved discovery service name.
pub const LABEL_SERVICE: &str = "discovery_service";
/// Label that caches the resolved discovery type.
pub const LABEL_DISCOVERY_TYPE: &str = "discovery_type";

/// Arbitrary, recursively comparable discovery metadata.
///
/// `serde_json::Value` is a closed tagged variant over
/// null / bool / number / string / array / object whose `PartialEq` is
/// structural, so two metadata trees compare equal iff they have the same
/// shape and contents.
pub type Metadata = Value;

// ─── Discovery arguments ─────────────────────────────────────────────────────

/// Backend-specific parameters refining a discovery lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryArgs {
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub namespace_id: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub group_name:   String,
  #[serde(default, skip_serializing_if = "Value::is_null")]
  pub metadata:     Metadata,
  /// Backend-specific arguments this core does not compare.
  #[serde(flatten)]
  pub extra:        Map<String, Value>,
}

// ─── Endpoint nodes ──────────────────────────────────────────────────────────

/// One resolved endpoint.
///
/// The gateway only requires `host` and `weight`; a node without a port
/// uses the scheme's default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
  pub host:     String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub port:     Option<u16>,
  #[serde(default)]
  pub weight:   u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub metadata: Option<Metadata>,
  /// Gateway node fields such as `priority`, preserved verbatim.
  #[serde(flatten)]
  pub extra:    Map<String, Value>,
}

impl Node {
  pub fn new(host: impl Into<String>, port: u16, weight: u32) -> Self {
    Self {
      host: host.into(),
      port: Some(port),
      weight,
      metadata: None,
      extra: Map::new(),
    }
  }
}

/// An upstream's endpoint list, in either of the two shapes the gateway
/// accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Nodes {
  /// `[{"host": "10.0.0.1", "port": 80, "weight": 1}, …]`
  List(Vec<Node>),
  /// `{"10.0.0.1:80": 1, …}`
  Map(BTreeMap<String, u32>),
}

impl Nodes {
  pub fn len(&self) -> usize {
    match self {
      Self::List(nodes) => nodes.len(),
      Self::Map(nodes) => nodes.len(),
    }
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

// ─── Upstream ────────────────────────────────────────────────────────────────

/// The discovery-relevant view of an upstream object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Upstream {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub nodes:          Option<Nodes>,
  /// Default service identity; overridden by the `discovery_service` label.
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub service_name:   String,
  /// Default discovery mechanism; overridden by the `discovery_type` label.
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub discovery_type: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub discovery_args: Option<DiscoveryArgs>,
  /// Also serves as the cache for the resolved discovery identity.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub labels:         BTreeMap<String, String>,
  /// Every other field of the upstream object, preserved verbatim.
  #[serde(flatten)]
  pub extra:          Map<String, Value>,
}

impl Upstream {
  /// The service name, preferring the cached label over the default field.
  pub fn resolved_service_name(&self) -> &str {
    self
      .labels
      .get(LABEL_SERVICE)
      .map(String::as_str)
      .unwrap_or(self.service_name.as_str())
  }

  /// The discovery type, preferring the cached label over the default field.
  pub fn resolved_discovery_type(&self) -> &str {
    self
      .labels
      .get(LABEL_DISCOVERY_TYPE)
      .map(String::as_str)
      .unwrap_or(self.discovery_type.as_str())
  }

  /// Write the default identity into the label cache where no label exists
  /// yet. Empty defaults are cached too, so an upstream without discovery
  /// ends up with empty labels. Returns `true` if a label was added.
  pub fn cache_identity(&mut self) -> bool {
    let mut changed = false;
    for (label, default) in [
      (LABEL_SERVICE, &self.service_name),
      (LABEL_DISCOVERY_TYPE, &self.discovery_type),
    ] {
      if self.labels.contains_key(label) {
        continue;
      }
      self.labels.insert(label.to_string(), default.clone());
      changed = true;
    }
    changed
  }
}
