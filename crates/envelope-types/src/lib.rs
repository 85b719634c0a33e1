//! Foundation types for digest-tree envelopes.
//!
//! This crate provides the value-level types every other envelope crate builds
//! on. It has no knowledge of the tree structure itself.
//!
//! # Key Types
//!
//! - [`Digest`] — 32-byte BLAKE3 digest identifying a node's content
//! - [`Value`] — Leaf payload carried by an envelope
//! - [`KnownValue`] — Compact integer-coded predicate or value
//! - [`codec`] — Canonical (deterministic) binary encoding of values

pub mod codec;
pub mod digest;
pub mod error;
pub mod known_value;
pub mod value;

pub use digest::Digest;
pub use error::{TypeError, TypeResult};
pub use known_value::KnownValue;
pub use value::Value;
