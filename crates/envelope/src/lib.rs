//! Digest-tree envelopes.
//!
//! An [`Envelope`] is an immutable tree whose every node carries a digest
//! computed only from the digests of its children. Because of that, any
//! subtree can be replaced by an elided, encrypted, or compressed stand-in
//! with the same digest without changing the digest of any ancestor. This
//! crate builds on that property:
//!
//! - [`elide`] — redact by digest set, reveal by digest set, and restore
//! - [`extension::encrypt`] / [`extension::compress`] — reversible,
//!   digest-preserving substitutions
//! - [`proof`] — minimal-disclosure inclusion proofs checked against a
//!   trusted root digest
//! - [`extension::recipient`] — content keys sealed to X25519 public keys
//! - [`extension::signature`], [`extension::salt`],
//!   [`extension::attachment`] — conventions expressed as assertions
//!
//! ```
//! use std::collections::HashSet;
//! use envelope::Envelope;
//!
//! let alice = Envelope::new("Alice")
//!     .add_assertion("knows", "Bob")
//!     .add_assertion("knows", "Carol");
//! let root = alice.elide_revealing_set(&HashSet::new());
//!
//! let bob = Envelope::new_assertion("knows", "Bob");
//! let proof = alice.proof_contains_target(&bob).unwrap();
//! assert!(root.confirm_contains_target(&bob, &proof));
//! ```

pub mod assertion;
pub mod config;
pub mod elide;
pub mod envelope;
pub mod error;
pub mod extension;
pub mod format;
pub mod proof;
pub mod queries;
pub mod walk;
pub mod wire;

pub use assertion::Assertion;
pub use config::EnvelopeConfig;
pub use elide::{digest_set, DigestProvider, ObscureAction};
pub use envelope::{Envelope, EnvelopeCase, EnvelopeEncodable};
pub use error::{EnvelopeError, EnvelopeResult, ErrorKind};
pub use extension::{Attachments, Compressed, MIN_SALT_LEN};
pub use walk::EdgeType;

pub use envelope_crypto::{
    AgreementPrivateKey, AgreementPublicKey, ContentCipher, EncryptedMessage, SealedMessage,
    Signature, SigningKey, SymmetricKey, VerifyingKey,
};
pub use envelope_types::{Digest, KnownValue, Value};
