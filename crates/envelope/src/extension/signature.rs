//! Ed25519 signature assertions.
//!
//! A signature covers the digest of the subject only, so it remains valid
//! when other assertions are added, removed, or elided, and when the subject
//! itself is elided, encrypted, or compressed.

use envelope_crypto::{Signature, SigningKey, VerifyingKey};
use envelope_types::KnownValue;

use crate::envelope::Envelope;
use crate::error::{EnvelopeError, EnvelopeResult};

impl Envelope {
    /// Add a `'signed': <signature>` assertion over the subject digest.
    pub fn add_signature(&self, key: &SigningKey) -> Envelope {
        let signature = key.sign_digest(&self.subject_ref().digest());
        self.add_assertion(KnownValue::SIGNED, signature.to_bytes().to_vec())
    }

    /// Every visible signature on this envelope.
    pub fn signatures(&self) -> EnvelopeResult<Vec<Signature>> {
        self.objects_for_predicate(KnownValue::SIGNED)
            .iter()
            .map(|object| -> EnvelopeResult<Signature> {
                Ok(Signature::from_slice(&object.try_bytes()?)?)
            })
            .collect()
    }

    pub fn has_signature_from(&self, key: &VerifyingKey) -> EnvelopeResult<bool> {
        let digest = self.subject_ref().digest();
        Ok(self
            .signatures()?
            .iter()
            .any(|signature| key.verify_digest(&digest, signature).is_ok()))
    }

    /// Succeeds if one of the signatures was made by `key`.
    pub fn verify_signature_from(&self, key: &VerifyingKey) -> EnvelopeResult<()> {
        if self.has_signature_from(key)? {
            Ok(())
        } else {
            Err(EnvelopeError::InvalidSignature)
        }
    }
}
