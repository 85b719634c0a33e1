//! X25519 key agreement for sealing content keys to recipients.
//!
//! A sender generates an ephemeral X25519 key, agrees a shared secret with the
//! recipient's public key, derives a one-off ChaCha20-Poly1305 key with
//! HKDF-SHA256, and seals the payload. Only the holder of the matching private
//! key can repeat the agreement and open it.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use curve25519_dalek::montgomery::MontgomeryPoint;
use curve25519_dalek::scalar::Scalar;
use hkdf::Hkdf;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult};
use crate::symmetric::NONCE_LEN;

const SEAL_DOMAIN: &[u8] = b"ENVELOPE_RECIPIENT_SEAL_v1";

const TAG_LEN: usize = 16;

/// X25519 private key.
#[derive(Clone, PartialEq, Eq)]
pub struct AgreementPrivateKey([u8; 32]);

impl AgreementPrivateKey {
    pub const LEN: usize = 32;

    pub fn generate() -> Self {
        let mut bytes = [0u8; Self::LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidKey)?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| CryptoError::InvalidLength {
            expected: Self::LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn public_key(&self) -> AgreementPublicKey {
        AgreementPublicKey(MontgomeryPoint::mul_base(&self.scalar()).to_bytes())
    }

    fn scalar(&self) -> Scalar {
        Scalar::from_bytes_mod_order(self.0)
    }
}

impl std::fmt::Debug for AgreementPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AgreementPrivateKey(<redacted>)")
    }
}

/// X25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgreementPublicKey([u8; 32]);

impl AgreementPublicKey {
    pub const LEN: usize = 32;

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidKey)?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| CryptoError::InvalidLength {
            expected: Self::LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for AgreementPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AgreementPublicKey({})", self.to_hex())
    }
}

/// A payload sealed to one recipient public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedMessage {
    ephemeral: [u8; 32],
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
}

impl SealedMessage {
    /// Smallest valid encoding: ephemeral key, nonce, and an empty payload's tag.
    pub const MIN_LEN: usize = 32 + NONCE_LEN + TAG_LEN;

    /// Seal `plaintext` so only the holder of `recipient`'s private key can open it.
    pub fn seal(plaintext: &[u8], recipient: &AgreementPublicKey) -> CryptoResult<Self> {
        let ephemeral_secret = AgreementPrivateKey::generate();
        let ephemeral = *ephemeral_secret.public_key().as_bytes();
        let shared = ephemeral_secret.scalar() * MontgomeryPoint(recipient.0);
        let key = derive_key(shared.as_bytes(), &ephemeral, &recipient.0)?;

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        let ciphertext = cipher(&key)
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: &ephemeral,
                },
            )
            .map_err(|_| CryptoError::EncryptionFailed)?;

        Ok(Self {
            ephemeral,
            nonce,
            ciphertext,
        })
    }

    /// Open with the recipient's private key. Any other key fails with
    /// [`CryptoError::DecryptionFailed`].
    pub fn open(&self, private_key: &AgreementPrivateKey) -> CryptoResult<Vec<u8>> {
        let shared = private_key.scalar() * MontgomeryPoint(self.ephemeral);
        let key = derive_key(
            shared.as_bytes(),
            &self.ephemeral,
            private_key.public_key().as_bytes(),
        )
        .map_err(|_| CryptoError::DecryptionFailed)?;
        cipher(&key)
            .decrypt(
                Nonce::from_slice(&self.nonce),
                Payload {
                    msg: &self.ciphertext,
                    aad: &self.ephemeral,
                },
            )
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    pub fn ephemeral_key(&self) -> AgreementPublicKey {
        AgreementPublicKey(self.ephemeral)
    }

    /// `ephemeral || nonce || ciphertext`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32 + NONCE_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.ephemeral);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < Self::MIN_LEN {
            return Err(CryptoError::InvalidLength {
                expected: Self::MIN_LEN,
                actual: bytes.len(),
            });
        }
        let (ephemeral, rest) = bytes.split_at(32);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
        Ok(Self {
            ephemeral: ephemeral.try_into().map_err(|_| CryptoError::InvalidKey)?,
            nonce: nonce.try_into().map_err(|_| CryptoError::InvalidKey)?,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

fn derive_key(
    shared_secret: &[u8; 32],
    ephemeral_public: &[u8; 32],
    recipient_public: &[u8; 32],
) -> CryptoResult<[u8; 32]> {
    // Low-order points agree on the identity; nothing derived from it is secret.
    if shared_secret.iter().all(|b| *b == 0) {
        return Err(CryptoError::InvalidKey);
    }
    let mut info = Vec::with_capacity(64);
    info.extend_from_slice(ephemeral_public);
    info.extend_from_slice(recipient_public);

    let hkdf = Hkdf::<Sha256>::new(Some(SEAL_DOMAIN), shared_secret);
    let mut output = [0u8; 32];
    hkdf.expand(&info, &mut output)
        .map_err(|_| CryptoError::EncryptionFailed)?;
    Ok(output)
}

fn cipher(key: &[u8; 32]) -> ChaCha20Poly1305 {
    ChaCha20Poly1305::new(Key::from_slice(key))
}
