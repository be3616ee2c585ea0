//! Change events as produced by a configuration store watcher.

use seed_conf::GatewayConf;
use seed_core::{Action, Message};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Decision, Result, route_key};

/// One raw change, one JSON object per input line.
///
/// ```json
/// {"key": "/apisix/routes/1", "version": 12, "action": "add", "value": {"uri": "/a"}}
/// ```
///
/// `value` may be a JSON object (re-encoded as the payload), a string (taken
/// verbatim), or absent / `null` (empty payload).
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeEvent {
  pub key:     String,
  pub version: i64,
  pub action:  Action,
  #[serde(default)]
  pub value:   Option<Value>,
}

impl ChangeEvent {
  /// The raw payload bytes carried by this event.
  pub fn payload(&self) -> Result<Vec<u8>> {
    Ok(match &self.value {
      None | Some(Value::Null) => Vec::new(),
      Some(Value::String(s)) => s.clone().into_bytes(),
      Some(v) => serde_json::to_vec(v)?,
    })
  }

  /// Build a change record, or `None` if the key does not name a gateway
  /// entity under `prefix`.
  pub fn into_message(self, prefix: &str) -> Result<Option<Message<GatewayConf>>> {
    let Some(kind) = route_key(prefix, &self.key) else {
      return Ok(None);
    };
    let payload = self.payload()?;
    let msg = Message::new(self.key, &payload, self.version, self.action, kind)?;
    Ok(Some(msg))
  }
}

/// One output line: the decision taken for a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
  pub key:      String,
  pub version:  i64,
  #[serde(flatten)]
  pub decision: Decision,
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn event(value: Value) -> ChangeEvent {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn payload_encodings() {
    let object = event(json!({
      "key": "/apisix/routes/1", "version": 1, "action": "add",
      "value": {"uri": "/a"}
    }));
    assert_eq!(object.payload().unwrap(), br#"{"uri":"/a"}"#.to_vec());

    let text = event(json!({
      "key": "/apisix/routes/1", "version": 1, "action": "add",
      "value": "{\"uri\": \"/b\"}"
    }));
    assert_eq!(text.payload().unwrap(), b"{\"uri\": \"/b\"}".to_vec());

    let absent = event(json!({
      "key": "/apisix/routes/1", "version": 2, "action": "delete"
    }));
    assert!(absent.payload().unwrap().is_empty());
  }

  #[test]
  fn unknown_action_is_rejected() {
    let result = serde_json::from_value::<ChangeEvent>(json!({
      "key": "/apisix/routes/1", "version": 1, "action": "patch"
    }));
    assert!(result.is_err());
  }

  #[test]
  fn unrouted_keys_yield_no_message() {
    let ev = event(json!({
      "key": "/apisix/consumers/jack", "version": 1, "action": "add",
      "value": {"username": "jack"}
    }));
    assert!(ev.into_message("/apisix").unwrap().is_none());
  }

  #[test]
  fn malformed_payload_is_an_error() {
    let ev = event(json!({
      "key": "/apisix/routes/1", "version": 1, "action": "add",
      "value": "not json"
    }));
    assert!(matches!(
      ev.into_message("/apisix"),
      Err(crate::Error::Core(seed_core::Error::MalformedPayload { .. }))
    ));
  }

  #[test]
  fn outcome_flattens_the_decision() {
    let outcome = Outcome {
      key:      "/apisix/routes/1".into(),
      version:  3,
      decision: Decision::Unchanged,
    };
    assert_eq!(
      serde_json::to_value(&outcome).unwrap(),
      json!({"key": "/apisix/routes/1", "version": 3, "decision": "unchanged"})
    );
  }
}
