//! Error types for `seed-core`.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// A non-empty payload was rejected by the configuration view parser.
  #[error("malformed payload for {key}: {source}")]
  MalformedPayload {
    key:    String,
    #[source]
    source: BoxError,
  },

  /// The (possibly mutated) configuration view could not be re-encoded.
  #[error("failed to serialize {key}: {source}")]
  Serialization {
    key:    String,
    #[source]
    source: BoxError,
  },
}

impl Error {
  /// The configuration key the failing record belongs to.
  pub fn key(&self) -> &str {
    match self {
      Self::MalformedPayload { key, .. } | Self::Serialization { key, .. } => {
        key
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
