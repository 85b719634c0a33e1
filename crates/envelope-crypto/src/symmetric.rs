use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use envelope_types::Digest;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};

/// Length of a ChaCha20-Poly1305 nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Capability to seal and open envelope content.
///
/// The envelope layer treats keys as opaque: anything that can bind a
/// plaintext to a digest and later return that plaintext (or fail) can be
/// used to encrypt nodes. The digest is authenticated, not secret.
pub trait ContentCipher {
    /// Seal `plaintext`, authenticating `digest` as associated data.
    fn encrypt_with_digest(&self, plaintext: &[u8], digest: Digest)
        -> CryptoResult<EncryptedMessage>;

    /// Open a sealed message. Fails on a wrong key, corrupted ciphertext, or
    /// a digest that was altered after sealing.
    fn decrypt_message(&self, message: &EncryptedMessage) -> CryptoResult<Vec<u8>>;
}

/// Ciphertext tagged with the digest of the plaintext it replaces.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncryptedMessage {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_LEN],
    /// Digest of the plaintext node, bound as associated data.
    pub digest: Digest,
}

impl EncryptedMessage {
    pub fn digest(&self) -> Digest {
        self.digest
    }
}

/// 256-bit ChaCha20-Poly1305 content key.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey([u8; 32]);

impl SymmetricKey {
    /// Key length in bytes.
    pub const LEN: usize = 32;

    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut key = [0u8; Self::LEN];
        rand::thread_rng().fill_bytes(&mut key);
        Self(key)
    }

    /// Create from raw key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create from a slice that must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidLength {
            expected: Self::LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidKey)?;
        Self::from_slice(&bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.0))
    }
}

impl ContentCipher for SymmetricKey {
    fn encrypt_with_digest(
        &self,
        plaintext: &[u8],
        digest: Digest,
    ) -> CryptoResult<EncryptedMessage> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher()
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: digest.as_bytes(),
                },
            )
            .map_err(|_| CryptoError::EncryptionFailed)?;

        Ok(EncryptedMessage {
            ciphertext,
            nonce,
            digest,
        })
    }

    fn decrypt_message(&self, message: &EncryptedMessage) -> CryptoResult<Vec<u8>> {
        self.cipher()
            .decrypt(
                Nonce::from_slice(&message.nonce),
                Payload {
                    msg: &message.ciphertext,
                    aad: message.digest.as_bytes(),
                },
            )
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymmetricKey(<redacted>)")
    }
}
