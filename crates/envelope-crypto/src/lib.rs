//! Cryptographic primitives for digest-tree envelopes.
//!
//! Provides the domain-separated BLAKE3 digest function used to assemble node
//! digests, ChaCha20-Poly1305 content keys behind the [`ContentCipher`]
//! capability, X25519 sealing of content keys to recipients, and Ed25519
//! signing/verification.
//!
//! Every primitive delegates to audited crates: `blake3`, `chacha20poly1305`,
//! `curve25519-dalek` with `hkdf`, and `ed25519-dalek`.

pub mod agreement;
pub mod error;
pub mod hasher;
pub mod signer;
pub mod symmetric;

pub use agreement::{AgreementPrivateKey, AgreementPublicKey, SealedMessage};
pub use error::{CryptoError, CryptoResult};
pub use hasher::ContentHasher;
pub use signer::{Signature, SigningKey, VerifyingKey};
pub use symmetric::{ContentCipher, EncryptedMessage, SymmetricKey};
