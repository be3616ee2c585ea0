//! JSON configuration views for gateway routes, services, and upstreams.
//!
//! Implements [`seed_core::ConfView`] for the three entity kinds whose
//! upstreams can be discovery managed. Pure synchronous; no I/O.
//!
//! # Quick start
//!
//! ```no_run
//! use seed_conf::{ConfKind, GatewayConf};
//! use seed_core::{Action, Message};
//!
//! let payload = br#"{"uri": "/a", "upstream": {"service_name": "svc", "discovery_type": "nacos"}}"#;
//! let msg: Message<GatewayConf> =
//!   Message::new("/apisix/routes/1", payload, 1, Action::Add, ConfKind::Route).unwrap();
//! assert_eq!(msg.service_name(), "svc");
//! ```

pub mod error;
mod stash;

use std::fmt;

pub use error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use seed_core::{ConfView, Node, Nodes, Upstream};

// ─── Entity kinds ────────────────────────────────────────────────────────────

/// Which entity shape a payload holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfKind {
  Route,
  Service,
  Upstream,
}

impl ConfKind {
  /// Map a key path segment (`routes`, `services`, `upstreams`) to a kind.
  pub fn from_segment(segment: &str) -> Option<Self> {
    match segment {
      "routes" => Some(Self::Route),
      "services" => Some(Self::Service),
      "upstreams" => Some(Self::Upstream),
      _ => None,
    }
  }

  pub fn as_segment(&self) -> &'static str {
    match self {
      Self::Route => "routes",
      Self::Service => "services",
      Self::Upstream => "upstreams",
    }
  }
}

impl fmt::Display for ConfKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Route => "route",
      Self::Service => "service",
      Self::Upstream => "upstream",
    })
  }
}

// ─── Entities ────────────────────────────────────────────────────────────────

/// A route or service: any object that may embed an `upstream`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub upstream: Option<Upstream>,
  /// Every other field, preserved verbatim.
  #[serde(flatten)]
  pub extra:    Map<String, Value>,
}

/// A parsed gateway configuration payload.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayConf {
  Route(Entity),
  Service(Entity),
  Upstream(Upstream),
}

impl GatewayConf {
  pub fn kind(&self) -> ConfKind {
    match self {
      Self::Route(_) => ConfKind::Route,
      Self::Service(_) => ConfKind::Service,
      Self::Upstream(_) => ConfKind::Upstream,
    }
  }

  fn to_value(&self) -> Result<Value> {
    let mut value = match self {
      Self::Route(entity) | Self::Service(entity) => {
        serde_json::to_value(entity)?
      }
      Self::Upstream(upstream) => serde_json::to_value(upstream)?,
    };
    if let Some(upstream) = upstream_object(self.kind(), &mut value) {
      stash::stash(upstream);
    }
    Ok(value)
  }
}

/// The JSON object holding the upstream within an encoded entity.
fn upstream_object(
  kind: ConfKind,
  value: &mut Value,
) -> Option<&mut Map<String, Value>> {
  let upstream = match kind {
    ConfKind::Upstream => value,
    ConfKind::Route | ConfKind::Service => value.get_mut("upstream")?,
  };
  upstream.as_object_mut()
}

impl ConfView for GatewayConf {
  type Error = Error;
  type Kind = ConfKind;

  fn parse(payload: &[u8], kind: ConfKind) -> Result<Self> {
    let mut value: Value = serde_json::from_slice(payload)?;
    if !value.is_object() {
      return Err(Error::NotAnObject(kind));
    }
    if let Some(upstream) = upstream_object(kind, &mut value) {
      stash::restore(upstream);
    }

    Ok(match kind {
      ConfKind::Route => Self::Route(serde_json::from_value(value)?),
      ConfKind::Service => Self::Service(serde_json::from_value(value)?),
      ConfKind::Upstream => Self::Upstream(serde_json::from_value(value)?),
    })
  }

  fn upstream(&self) -> Option<&Upstream> {
    match self {
      Self::Route(entity) | Self::Service(entity) => entity.upstream.as_ref(),
      Self::Upstream(upstream) => Some(upstream),
    }
  }

  fn upstream_mut(&mut self) -> Option<&mut Upstream> {
    match self {
      Self::Route(entity) | Self::Service(entity) => entity.upstream.as_mut(),
      Self::Upstream(upstream) => Some(upstream),
    }
  }

  /// Replaces the upstream's node list. Entities without an inline upstream
  /// are left untouched.
  fn inject_nodes(&mut self, nodes: Vec<Node>) {
    if let Some(upstream) = self.upstream_mut() {
      upstream.nodes = Some(Nodes::List(nodes));
    }
  }

  fn has_nodes_attr(&self) -> bool { self.upstream().is_some() }

  fn marshal(&self) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&self.to_value()?)?)
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
