//! Change records: one observed configuration change per [`Message`].

use serde::{Deserialize, Serialize};

use crate::{
  error::{Error, Result},
  upstream::{DiscoveryArgs, Node, Upstream},
  view::ConfView,
};

// ─── Action ──────────────────────────────────────────────────────────────────

/// What the source of truth did to the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
  /// Create or update.
  Add,
  Delete,
}

impl Action {
  pub fn is_delete(&self) -> bool { matches!(self, Self::Delete) }
}

// ─── Message ─────────────────────────────────────────────────────────────────

/// One observed configuration change.
///
/// The parsed view is present iff the payload was non-empty. Every accessor
/// treats a missing view (or a view without an upstream section) as "no
/// discovery identity" and never fails.
///
/// Accessors are pure. The only mutations are [`Message::cache_identity`] and
/// [`Message::inject_nodes`], both of which take `&mut self`, so a record can
/// only be mutated by its single owner.
#[derive(Debug, Clone)]
pub struct Message<V> {
  pub key:     String,
  /// The raw payload as text, kept for later re-serialization.
  pub value:   String,
  /// Revision supplied by the source of truth; only used for ordering.
  pub version: i64,
  pub action:  Action,
  conf:        Option<V>,
}

impl<V: ConfView> Message<V> {
  /// Build a record, parsing `payload` when it is non-empty.
  ///
  /// An empty payload yields a record without a view regardless of `action`.
  pub fn new(
    key: impl Into<String>,
    payload: &[u8],
    version: i64,
    action: Action,
    kind: V::Kind,
  ) -> Result<Self> {
    let key = key.into();
    let conf = if payload.is_empty() {
      None
    } else {
      let view = V::parse(payload, kind).map_err(|e| {
        Error::MalformedPayload {
          key:    key.clone(),
          source: Box::new(e),
        }
      })?;
      Some(view)
    };

    Ok(Self {
      key,
      value: String::from_utf8_lossy(payload).into_owned(),
      version,
      action,
      conf,
    })
  }

  pub fn has_view(&self) -> bool { self.conf.is_some() }

  /// The upstream section of the parsed view, if any.
  pub fn upstream(&self) -> Option<&Upstream> {
    self.conf.as_ref().and_then(V::upstream)
  }

  /// Cached label first, then the upstream's default field, else `""`.
  pub fn service_name(&self) -> &str {
    self
      .upstream()
      .map(Upstream::resolved_service_name)
      .unwrap_or("")
  }

  /// Cached label first, then the upstream's default field, else `""`.
  pub fn discovery_type(&self) -> &str {
    self
      .upstream()
      .map(Upstream::resolved_discovery_type)
      .unwrap_or("")
  }

  /// Memoize the resolved identity into the upstream's label cache so it
  /// survives re-serialization, even after the default fields are rewritten.
  ///
  /// Existing labels are kept and empty defaults are cached as empty labels.
  /// Calling this repeatedly is a no-op after the first call. Returns `true`
  /// when the label cache changed.
  pub fn cache_identity(&mut self) -> bool {
    self
      .conf
      .as_mut()
      .and_then(V::upstream_mut)
      .is_some_and(Upstream::cache_identity)
  }

  pub fn discovery_args(&self) -> Option<&DiscoveryArgs> {
    self.upstream().and_then(|up| up.discovery_args.as_ref())
  }

  /// Hand resolved endpoints to the view. The identity is cached first.
  /// Without a view this is a no-op.
  pub fn inject_nodes(&mut self, nodes: Vec<Node>) {
    self.cache_identity();
    if let Some(conf) = self.conf.as_mut() {
      conf.inject_nodes(nodes);
    }
  }

  pub fn has_nodes_attr(&self) -> bool {
    self.conf.as_ref().is_some_and(V::has_nodes_attr)
  }

  /// Re-encode the view. A record without a view encodes to an empty
  /// payload.
  pub fn marshal(&self) -> Result<Vec<u8>> {
    let Some(conf) = self.conf.as_ref() else {
      return Ok(Vec::new());
    };
    conf.marshal().map_err(|e| Error::Serialization {
      key:    self.key.clone(),
      source: Box::new(e),
    })
  }
}

// ─── Test support ────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod test_helpers {
  use std::fmt;

  use super::*;

  /// Minimal JSON-backed view: the payload *is* an upstream object, or the
  /// literal `null` for an entity without one.
  #[derive(Debug, Clone)]
  pub(crate) struct JsonView {
    pub(crate) upstream: Option<Upstream>,
    pub(crate) nodes:    bool,
  }

  #[derive(Debug)]
  pub(crate) struct ViewError(pub(crate) String);

  impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(&self.0)
    }
  }

  impl std::error::Error for ViewError {}

  impl ConfView for JsonView {
    type Error = ViewError;
    type Kind = ();

    fn parse(payload: &[u8], _kind: ()) -> Result<Self, ViewError> {
      let upstream: Option<Upstream> = serde_json::from_slice(payload)
        .map_err(|e| ViewError(e.to_string()))?;
      let nodes = upstream.is_some();
      Ok(Self { upstream, nodes })
    }

    fn upstream(&self) -> Option<&Upstream> { self.upstream.as_ref() }

    fn upstream_mut(&mut self) -> Option<&mut Upstream> {
      self.upstream.as_mut()
    }

    fn inject_nodes(&mut self, nodes: Vec<Node>) {
      if let Some(up) = self.upstream.as_mut() {
        up.nodes = Some(crate::Nodes::List(nodes));
      }
    }

    fn has_nodes_attr(&self) -> bool { self.nodes }

    fn marshal(&self) -> Result<Vec<u8>, ViewError> {
      if self.upstream.as_ref().is_some_and(|up| up.service_name == "!") {
        return Err(ViewError("unencodable service name".into()));
      }
      serde_json::to_vec(&self.upstream).map_err(|e| ViewError(e.to_string()))
    }
  }

  pub(crate) fn message(payload: &str) -> Message<JsonView> {
    Message::new("/routes/1", payload.as_bytes(), 1, Action::Add, ())
      .expect("valid test payload")
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::{test_helpers::*, *};
  use crate::upstream::{LABEL_DISCOVERY_TYPE, LABEL_SERVICE};

  #[test]
  fn empty_payload_has_no_identity() {
    let msg: Message<JsonView> =
      Message::new("/routes/1", b"", 7, Action::Delete, ()).unwrap();

    assert!(!msg.has_view());
    assert_eq!(msg.service_name(), "");
    assert_eq!(msg.discovery_type(), "");
    assert!(msg.discovery_args().is_none());
    assert!(!msg.has_nodes_attr());
    assert_eq!(msg.version, 7);
    assert!(msg.action.is_delete());
  }

  #[test]
  fn empty_payload_with_add_action_is_permitted() {
    let mut msg: Message<JsonView> =
      Message::new("/routes/1", b"", 1, Action::Add, ()).unwrap();
    assert!(!msg.cache_identity());
    msg.inject_nodes(vec![Node::new("10.0.0.1", 80, 1)]);
    assert_eq!(msg.marshal().unwrap(), Vec::<u8>::new());
  }

  #[test]
  fn view_without_upstream_has_no_identity() {
    let msg = message("null");
    assert!(msg.has_view());
    assert_eq!(msg.service_name(), "");
    assert!(msg.discovery_args().is_none());
  }

  #[test]
  fn malformed_payload_is_an_error() {
    let err = Message::<JsonView>::new(
      "/routes/9",
      b"{not json",
      1,
      Action::Add,
      (),
    )
    .unwrap_err();
    assert!(matches!(err, Error::MalformedPayload { .. }));
    assert_eq!(err.key(), "/routes/9");
  }

  #[test]
  fn non_utf8_payload_is_an_error() {
    let err =
      Message::<JsonView>::new("/routes/9", b"\xff\xfe", 1, Action::Add, ())
        .unwrap_err();
    assert!(matches!(err, Error::MalformedPayload { .. }));
    assert_eq!(err.key(), "/routes/9");
  }

  #[test]
  fn identity_comes_from_defaults() {
    let msg =
      message(r#"{"service_name": "svc-a", "discovery_type": "nacos"}"#);
    assert_eq!(msg.service_name(), "svc-a");
    assert_eq!(msg.discovery_type(), "nacos");
  }

  #[test]
  fn cache_identity_is_idempotent_and_pins_the_identity() {
    let mut msg =
      message(r#"{"service_name": "svc-a", "discovery_type": "nacos"}"#);

    assert!(msg.cache_identity());
    assert!(!msg.cache_identity());

    let labels = &msg.upstream().unwrap().labels;
    assert_eq!(labels.get(LABEL_SERVICE).unwrap(), "svc-a");
    assert_eq!(labels.get(LABEL_DISCOVERY_TYPE).unwrap(), "nacos");

    // Once cached, the default field is no longer consulted.
    msg.conf.as_mut().unwrap().upstream.as_mut().unwrap().service_name =
      "svc-b".into();
    assert_eq!(msg.service_name(), "svc-a");
    assert_eq!(msg.service_name(), "svc-a");
  }

  #[test]
  fn discovery_args_are_projected() {
    let msg = message(
      r#"{
        "service_name": "svc",
        "discovery_type": "nacos",
        "discovery_args": {
          "namespace_id": "ns1",
          "group_name": "grp",
          "metadata": {"version": "v1"}
        }
      }"#,
    );
    let args = msg.discovery_args().unwrap();
    assert_eq!(args.namespace_id, "ns1");
    assert_eq!(args.group_name, "grp");
    assert_eq!(args.metadata, json!({"version": "v1"}));
  }

  #[test]
  fn inject_then_marshal_keeps_nodes_and_identity() {
    let mut msg =
      message(r#"{"service_name": "svc-a", "discovery_type": "nacos"}"#);
    assert!(msg.has_nodes_attr());

    msg.inject_nodes(vec![Node::new("10.0.0.1", 8080, 10)]);
    let bytes = msg.marshal().unwrap();

    let reparsed: Message<JsonView> =
      Message::new("/routes/1", &bytes, 2, Action::Add, ()).unwrap();
    let up = reparsed.upstream().unwrap();
    assert_eq!(up.nodes.as_ref().map(crate::Nodes::len), Some(1));
    assert_eq!(up.labels.get(LABEL_SERVICE).unwrap(), "svc-a");
    assert_eq!(reparsed.service_name(), "svc-a");
  }

  #[test]
  fn marshal_failure_is_a_serialization_error() {
    let msg = message(r#"{"service_name": "!"}"#);
    let err = msg.marshal().unwrap_err();
    assert!(matches!(err, Error::Serialization { .. }));
  }
}
