//! The `ConfView` trait: the seam between change classification and the
//! format-specific decoding of configuration payloads.

use std::fmt::Debug;

use crate::upstream::{Node, Upstream};

/// A parsed configuration payload that exposes its upstream section.
///
/// Implemented by format crates. A [`crate::Message`] owns exactly one view
/// and never shares it.
pub trait ConfView: Sized {
  /// Discriminator telling the parser which entity shape to expect.
  type Kind: Copy + Debug;
  type Error: std::error::Error + Send + Sync + 'static;

  /// Decode a non-empty payload.
  fn parse(payload: &[u8], kind: Self::Kind) -> Result<Self, Self::Error>;

  /// The upstream section, or `None` when this entity carries none.
  fn upstream(&self) -> Option<&Upstream>;

  fn upstream_mut(&mut self) -> Option<&mut Upstream>;

  /// Populate the endpoint list with resolved nodes. Merge or replace
  /// semantics are up to the implementation.
  fn inject_nodes(&mut self, nodes: Vec<Node>);

  /// Whether this configuration shape has an endpoint-nodes field at all.
  fn has_nodes_attr(&self) -> bool;

  /// Re-encode the (possibly mutated) view in its original format.
  fn marshal(&self) -> Result<Vec<u8>, Self::Error>;
}
