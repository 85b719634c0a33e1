//! Random salt assertions.
//!
//! A leaf such as `"yes"` has a guessable digest even when elided. Adding a
//! `'salt'` assertion with random bytes makes the containing node's digest
//! unguessable.

use rand::RngCore;

use envelope_types::KnownValue;

use crate::envelope::Envelope;
use crate::error::{EnvelopeError, EnvelopeResult};

/// Shortest salt accepted by [`Envelope::add_salt_with_len`].
pub const MIN_SALT_LEN: usize = 8;

const DEFAULT_SALT_LEN: usize = 16;

impl Envelope {
    /// Add a `'salt'` assertion with 16 random bytes.
    pub fn add_salt(&self) -> Envelope {
        self.add_salt_bytes(random_bytes(DEFAULT_SALT_LEN))
    }

    pub fn add_salt_with_len(&self, len: usize) -> EnvelopeResult<Envelope> {
        if len < MIN_SALT_LEN {
            return Err(EnvelopeError::SaltTooShort {
                min: MIN_SALT_LEN,
                actual: len,
            });
        }
        Ok(self.add_salt_bytes(random_bytes(len)))
    }

    fn add_salt_bytes(&self, salt: Vec<u8>) -> Envelope {
        self.add_assertion(KnownValue::SALT, salt)
    }
}

fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salt_decorrelates_digests() {
        let e = Envelope::new("yes");
        let a = e.add_salt();
        let b = e.add_salt();
        assert_ne!(a.digest(), b.digest());
        assert_ne!(a.digest(), e.digest());
        assert_eq!(a.try_text().unwrap(), "yes");
    }

    #[test]
    fn salt_is_a_known_value_assertion() {
        let salted = Envelope::new("yes").add_salt();
        let salt = salted.object_for_predicate(KnownValue::SALT).unwrap();
        assert_eq!(salt.try_bytes().unwrap().len(), DEFAULT_SALT_LEN);
    }

    #[test]
    fn explicit_length() {
        let salted = Envelope::new("yes").add_salt_with_len(32).unwrap();
        let salt = salted.object_for_predicate(KnownValue::SALT).unwrap();
        assert_eq!(salt.try_bytes().unwrap().len(), 32);
    }

    #[test]
    fn short_salt_is_rejected() {
        assert_eq!(
            Envelope::new("yes").add_salt_with_len(4).unwrap_err(),
            EnvelopeError::SaltTooShort { min: 8, actual: 4 }
        );
    }
}
