//! Reconciliation pipeline for discovery-managed gateway configuration.
//!
//! Consumes a stream of configuration changes, keeps the latest record per
//! key, and decides for each change whether a discovery watch must be
//! started, replaced, refreshed, or torn down.

mod event;
mod reconcile;
mod replay;

pub mod error;

use std::path::Path;

pub use error::{Error, Result};
pub use event::{ChangeEvent, Outcome};
pub use reconcile::{Decision, Identity, Reconciler};
pub use replay::{ReplayStats, replay};
use seed_conf::ConfKind;
use serde::Deserialize;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Settings for the sync pipeline, loaded from TOML and `SEED_*` variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyncConfig {
  /// Key prefix under which gateway entities are stored.
  #[serde(default = "default_prefix")]
  pub prefix: String,
}

fn default_prefix() -> String { "/apisix".to_string() }

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      prefix: default_prefix(),
    }
  }
}

impl SyncConfig {
  /// Layer the (optional) file at `path` under `SEED_`-prefixed environment
  /// variables.
  pub fn load(path: &Path) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("SEED"))
      .build()?;
    Ok(settings.try_deserialize()?)
  }
}

// ─── Key routing ─────────────────────────────────────────────────────────────

/// Determine the entity kind stored at `key`, e.g.
/// `/apisix/routes/1` → [`ConfKind::Route`]. Keys outside `prefix`, directory
/// keys, nested keys below an entity, and unknown entity types yield `None`.
pub fn route_key(prefix: &str, key: &str) -> Option<ConfKind> {
  let rest = key
    .strip_prefix(prefix.trim_end_matches('/'))?
    .strip_prefix('/')?;
  let (segment, id) = rest.split_once('/')?;
  if id.is_empty() || id.contains('/') {
    return None;
  }
  ConfKind::from_segment(segment)
}
