//! Public-key encryption to one or more recipients.
//!
//! The subject is encrypted with a fresh content key, and that key is sealed
//! to each recipient's X25519 public key as a `'hasRecipient'` assertion.
//! Any recipient can open their sealed copy and decrypt the subject. Adding
//! or removing recipients never changes the envelope's subject digest.

use tracing::{debug, warn};

use envelope_crypto::{AgreementPrivateKey, AgreementPublicKey, SealedMessage, SymmetricKey};
use envelope_types::KnownValue;

use crate::envelope::Envelope;
use crate::error::{EnvelopeError, EnvelopeResult};

impl Envelope {
    /// Add a `'hasRecipient'` assertion sealing `content_key` to `recipient`.
    pub fn add_recipient(
        &self,
        recipient: &AgreementPublicKey,
        content_key: &SymmetricKey,
    ) -> EnvelopeResult<Envelope> {
        let sealed = SealedMessage::seal(content_key.as_bytes(), recipient)?;
        Ok(self.add_assertion(KnownValue::HAS_RECIPIENT, sealed.to_bytes()))
    }

    /// Every visible sealed content key on this envelope.
    pub fn recipients(&self) -> EnvelopeResult<Vec<SealedMessage>> {
        self.objects_for_predicate(KnownValue::HAS_RECIPIENT)
            .iter()
            .map(|object| -> EnvelopeResult<SealedMessage> {
                Ok(SealedMessage::from_slice(&object.try_bytes()?)?)
            })
            .collect()
    }

    pub fn encrypt_subject_to_recipient(
        &self,
        recipient: &AgreementPublicKey,
    ) -> EnvelopeResult<Envelope> {
        self.encrypt_subject_to_recipients(std::slice::from_ref(recipient))
    }

    /// Encrypt the subject under a fresh content key sealed to every recipient.
    pub fn encrypt_subject_to_recipients(
        &self,
        recipients: &[AgreementPublicKey],
    ) -> EnvelopeResult<Envelope> {
        let content_key = SymmetricKey::generate();
        let mut env = self.encrypt_subject(&content_key)?;
        for recipient in recipients {
            env = env.add_recipient(recipient, &content_key)?;
        }
        debug!(
            digest = %env.digest().short_hex(),
            recipients = recipients.len(),
            "encrypted subject to recipients"
        );
        Ok(env)
    }

    /// Find the sealed content key addressed to `private_key` and decrypt the
    /// subject with it.
    pub fn decrypt_subject_to_recipient(
        &self,
        private_key: &AgreementPrivateKey,
    ) -> EnvelopeResult<Envelope> {
        let content_key = self
            .recipients()?
            .iter()
            .find_map(|sealed| sealed.open(private_key).ok())
            .ok_or_else(|| {
                warn!(
                    digest = %self.digest().short_hex(),
                    "no sealed content key for this recipient"
                );
                EnvelopeError::UnknownRecipient
            })?;
        let content_key = SymmetricKey::from_slice(&content_key)?;
        self.decrypt_subject(&content_key)
    }

    /// Wrap the whole envelope and encrypt it to every recipient.
    pub fn encrypt_to_recipients(
        &self,
        recipients: &[AgreementPublicKey],
    ) -> EnvelopeResult<Envelope> {
        self.wrap().encrypt_subject_to_recipients(recipients)
    }

    /// Inverse of [`encrypt_to_recipients`](Self::encrypt_to_recipients).
    pub fn decrypt_to_recipient(
        &self,
        private_key: &AgreementPrivateKey,
    ) -> EnvelopeResult<Envelope> {
        self.decrypt_subject_to_recipient(private_key)?.try_unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn public_keys(keys: &[&AgreementPrivateKey]) -> Vec<AgreementPublicKey> {
        keys.iter().map(|k| k.public_key()).collect()
    }

    #[test]
    fn single_recipient() {
        let bob = AgreementPrivateKey::generate();
        let message = Envelope::new("Secret message for Bob");
        let encrypted = message.encrypt_subject_to_recipient(&bob.public_key()).unwrap();
        assert!(encrypted.is_subject_encrypted());
        assert_eq!(encrypted.assertions().len(), 1);
        assert_eq!(encrypted.subject().digest(), message.digest());

        let decrypted = encrypted.decrypt_subject_to_recipient(&bob).unwrap();
        assert_eq!(decrypted.subject().try_text().unwrap(), "Secret message for Bob");
    }

    #[test]
    fn wrong_recipient_fails() {
        let alice = AgreementPrivateKey::generate();
        let bob = AgreementPrivateKey::generate();
        let encrypted = Envelope::new("Secret message for Bob")
            .encrypt_subject_to_recipient(&bob.public_key())
            .unwrap();
        let err = encrypted.decrypt_subject_to_recipient(&alice).unwrap_err();
        assert_eq!(err, EnvelopeError::UnknownRecipient);
        assert_eq!(err.kind(), ErrorKind::Integrity);
    }

    #[test]
    fn every_recipient_can_decrypt() {
        let alice = AgreementPrivateKey::generate();
        let bob = AgreementPrivateKey::generate();
        let carol = AgreementPrivateKey::generate();
        let encrypted = Envelope::new("Secret for all")
            .encrypt_subject_to_recipients(&public_keys(&[&alice, &bob, &carol]))
            .unwrap();
        assert_eq!(encrypted.recipients().unwrap().len(), 3);
        assert!(encrypted.is_subject_encrypted());

        for key in [&alice, &bob, &carol] {
            let decrypted = encrypted.decrypt_subject_to_recipient(key).unwrap();
            assert_eq!(decrypted.subject().try_text().unwrap(), "Secret for all");
        }
    }

    #[test]
    fn recipients_added_one_at_a_time() {
        let alice = AgreementPrivateKey::generate();
        let bob = AgreementPrivateKey::generate();
        let dave = AgreementPrivateKey::generate();
        let content_key = SymmetricKey::generate();

        let message = Envelope::new("Secret message");
        let mut encrypted = message.encrypt_subject(&content_key).unwrap();
        for key in [&alice, &bob, &dave] {
            encrypted = encrypted.add_recipient(&key.public_key(), &content_key).unwrap();
        }
        assert_eq!(encrypted.recipients().unwrap().len(), 3);

        for key in [&alice, &dave] {
            let decrypted = encrypted.decrypt_subject_to_recipient(key).unwrap();
            assert_eq!(decrypted.subject().try_text().unwrap(), "Secret message");
        }
    }

    #[test]
    fn whole_envelope_to_recipients() {
        let alice = AgreementPrivateKey::generate();
        let bob = AgreementPrivateKey::generate();
        let document = Envelope::new("Contract terms and conditions").add_assertion("party", "Acme");

        let encrypted = document
            .encrypt_to_recipients(&public_keys(&[&alice, &bob]))
            .unwrap();
        assert_eq!(encrypted.recipients().unwrap().len(), 2);
        assert_eq!(encrypted.subject().digest(), document.wrap().digest());

        for key in [&alice, &bob] {
            let restored = encrypted.decrypt_to_recipient(key).unwrap();
            assert!(restored.is_identical_to(&document));
        }
    }

    #[test]
    fn restored_keys_still_decrypt() {
        let alice = AgreementPrivateKey::generate();
        let private = AgreementPrivateKey::from_hex(&alice.to_hex()).unwrap();
        let public = AgreementPublicKey::from_hex(&alice.public_key().to_hex()).unwrap();

        let encrypted = Envelope::new("Test serialization")
            .encrypt_subject_to_recipient(&public)
            .unwrap();
        let decrypted = encrypted.decrypt_subject_to_recipient(&private).unwrap();
        assert_eq!(decrypted.subject().try_text().unwrap(), "Test serialization");
    }

    #[test]
    fn large_subject() {
        let alice = AgreementPrivateKey::generate();
        let bob = AgreementPrivateKey::generate();
        let large = "X".repeat(10_000);
        let encrypted = Envelope::new(large.as_str())
            .encrypt_subject_to_recipients(&public_keys(&[&alice, &bob]))
            .unwrap();
        let decrypted = encrypted.decrypt_subject_to_recipient(&alice).unwrap();
        assert_eq!(decrypted.subject().try_text().unwrap().len(), large.len());
    }

    #[test]
    fn recipients_survive_wire_roundtrip() {
        let bob = AgreementPrivateKey::generate();
        let encrypted = Envelope::new("over the wire")
            .encrypt_subject_to_recipient(&bob.public_key())
            .unwrap();
        let decoded = Envelope::from_hex(&encrypted.to_hex().unwrap()).unwrap();
        let decrypted = decoded.decrypt_subject_to_recipient(&bob).unwrap();
        assert_eq!(decrypted.subject().try_text().unwrap(), "over the wire");
    }

    #[test]
    fn envelope_without_recipients() {
        let bob = AgreementPrivateKey::generate();
        let plain = Envelope::new("plain");
        assert!(plain.recipients().unwrap().is_empty());
        assert_eq!(
            plain.decrypt_subject_to_recipient(&bob).unwrap_err(),
            EnvelopeError::UnknownRecipient
        );
    }

    #[test]
    fn malformed_recipient_bytes() {
        let e = Envelope::new("x").add_assertion(KnownValue::HAS_RECIPIENT, vec![1u8, 2, 3]);
        assert!(e.recipients().is_err());
    }

    #[test]
    fn has_recipient_predicate() {
        assert_eq!(KnownValue::HAS_RECIPIENT.name(), "hasRecipient");
        assert_eq!(KnownValue::by_name("hasRecipient"), Some(KnownValue::HAS_RECIPIENT));
    }
}
