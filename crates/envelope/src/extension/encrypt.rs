//! Symmetric encryption of envelope nodes.
//!
//! The plaintext is the node's wire form and the node's digest travels with
//! the ciphertext, so the parent digest is unchanged. Unlike compression,
//! encrypting an encrypted node is an error rather than a no-op.

use tracing::{debug, warn};

use envelope_crypto::ContentCipher;

use crate::envelope::{Envelope, EnvelopeCase};
use crate::error::{EnvelopeError, EnvelopeResult};

impl Envelope {
    /// Replace this node with ciphertext bound to its digest.
    pub fn encrypt<K: ContentCipher + ?Sized>(&self, key: &K) -> EnvelopeResult<Envelope> {
        match self.case() {
            EnvelopeCase::Encrypted(_) => return Err(EnvelopeError::AlreadyEncrypted),
            EnvelopeCase::Elided(_) => return Err(EnvelopeError::AlreadyElided),
            _ => {}
        }
        let plaintext = self.to_bytes()?;
        let message = key.encrypt_with_digest(&plaintext, self.digest())?;
        debug!(
            digest = %self.digest().short_hex(),
            len = message.ciphertext.len(),
            "encrypted envelope"
        );
        Ok(Envelope::new_with_encrypted(message))
    }

    /// Decrypt an encrypted node and check that the result has the stored
    /// digest.
    pub fn decrypt<K: ContentCipher + ?Sized>(&self, key: &K) -> EnvelopeResult<Envelope> {
        let EnvelopeCase::Encrypted(message) = self.case() else {
            return Err(EnvelopeError::NotEncrypted);
        };
        let plaintext = key.decrypt_message(message).map_err(|e| {
            warn!(digest = %message.digest().short_hex(), "envelope decryption failed");
            e
        })?;
        let env = Envelope::from_bytes(&plaintext)?;
        if env.digest() != message.digest() {
            warn!(
                expected = %message.digest().short_hex(),
                actual = %env.digest().short_hex(),
                "decrypted envelope digest mismatch"
            );
            return Err(EnvelopeError::InvalidDigest {
                expected: message.digest(),
                actual: env.digest(),
            });
        }
        Ok(env)
    }

    /// Encrypt only the subject, leaving assertions visible.
    pub fn encrypt_subject<K: ContentCipher + ?Sized>(
        &self,
        key: &K,
    ) -> EnvelopeResult<Envelope> {
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
            } => Ok(Envelope::node_from_parts(
                subject.encrypt(key)?,
                assertions.clone(),
            )),
            _ => self.encrypt(key),
        }
    }

    pub fn decrypt_subject<K: ContentCipher + ?Sized>(
        &self,
        key: &K,
    ) -> EnvelopeResult<Envelope> {
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
            } => Ok(Envelope::node_from_parts(
                subject.decrypt(key)?,
                assertions.clone(),
            )),
            _ => self.decrypt(key),
        }
    }
}
