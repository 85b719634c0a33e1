use thiserror::Error;

/// Errors from cryptographic operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// AEAD sealing failed.
    #[error("encryption failed")]
    EncryptionFailed,

    /// AEAD opening failed: wrong key, corrupted ciphertext, or a tampered
    /// digest tag.
    #[error("decryption failed: wrong key or corrupted ciphertext")]
    DecryptionFailed,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid key")]
    InvalidKey,

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Result alias for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
