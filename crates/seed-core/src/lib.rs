//! Core types for the seed configuration-synchronization pipeline.
//!
//! A [`Message`] wraps one observed configuration change together with a
//! parsed [`ConfView`] of its payload. The [`classify`] module decides how a
//! newly observed change relates to the previously observed one for the same
//! key.
//!
//! This crate performs no I/O. Payload decoding lives behind the
//! [`ConfView`] trait, implemented by format crates (e.g. `seed-conf`).

pub mod classify;
pub mod error;
pub mod message;
pub mod upstream;
pub mod view;

pub use classify::{
  Relation, relate, service_filter, service_replace, service_update,
};
pub use error::{Error, Result};
pub use message::{Action, Message};
pub use upstream::{DiscoveryArgs, Metadata, Node, Nodes, Upstream};
pub use view::ConfView;
