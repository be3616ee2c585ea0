//! Error types for the seed-conf codec.

use thiserror::Error;

use crate::ConfKind;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0} payload is not a JSON object")]
  NotAnObject(ConfKind),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
