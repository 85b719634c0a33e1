use envelope_crypto::CryptoError;
use envelope_types::{Digest, TypeError};
use thiserror::Error;

/// Errors from envelope operations.
///
/// Absence (a proof target that is not in the tree) is never an error; it is
/// an `Option::None` at the call site.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    // -- integrity --------------------------------------------------------
    /// A recomputed digest does not match the one the data claims.
    #[error("digest mismatch: expected {expected}, found {actual}")]
    InvalidDigest { expected: Digest, actual: Digest },

    /// An elided node has no counterpart in the supplied original.
    #[error("no original subtree for elided digest {0}")]
    MissingOriginal(Digest),

    /// AEAD opening failed: wrong key or corrupted ciphertext.
    #[error("decryption failed: wrong key or corrupted ciphertext")]
    DecryptionFailed,

    #[error("invalid signature")]
    InvalidSignature,

    /// None of the sealed content keys opens with the given private key.
    #[error("no sealed content key opens with this key")]
    UnknownRecipient,

    /// A proof does not disclose a claimed target as a concrete subtree.
    #[error("target {0} is not disclosed by the proof")]
    TargetNotDisclosed(Digest),

    // -- preconditions ----------------------------------------------------
    #[error("envelope is already encrypted")]
    AlreadyEncrypted,

    #[error("envelope is elided")]
    AlreadyElided,

    #[error("envelope is not encrypted")]
    NotEncrypted,

    #[error("envelope is not compressed")]
    NotCompressed,

    #[error("envelope is not wrapped")]
    NotWrapped,

    #[error("envelope is not an assertion")]
    NotAssertion,

    #[error("envelope is not a leaf")]
    NotLeaf,

    #[error("envelope is not a known value")]
    NotKnownValue,

    /// Only assertions (or obscured assertions) may be attached to a subject.
    #[error("invalid assertion")]
    InvalidAssertion,

    #[error("no assertion with the given predicate")]
    NonexistentPredicate,

    #[error("more than one assertion with the given predicate")]
    AmbiguousPredicate,

    #[error("invalid attachment: {0}")]
    InvalidAttachment(String),

    #[error("salt too short: minimum {min} bytes, got {actual}")]
    SaltTooShort { min: usize, actual: usize },

    #[error("configuration error: {0}")]
    Config(String),

    // -- malformed input --------------------------------------------------
    #[error("malformed envelope: {0}")]
    Malformed(String),

    #[error("compression failed: {0}")]
    Compression(String),

    #[error("decompression failed: {0}")]
    Decompression(String),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Crypto(CryptoError),
}

/// The failure classes envelope operations distinguish.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Content does not match its digest, key, or signature. Never transient.
    Integrity,
    /// The operation does not apply to this envelope as it stands.
    Precondition,
    /// Bytes that do not form a valid envelope or value.
    Malformed,
}

impl EnvelopeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDigest { .. }
            | Self::MissingOriginal(_)
            | Self::DecryptionFailed
            | Self::InvalidSignature
            | Self::UnknownRecipient
            | Self::TargetNotDisclosed(_) => ErrorKind::Integrity,

            Self::AlreadyEncrypted
            | Self::AlreadyElided
            | Self::NotEncrypted
            | Self::NotCompressed
            | Self::NotWrapped
            | Self::NotAssertion
            | Self::NotLeaf
            | Self::NotKnownValue
            | Self::InvalidAssertion
            | Self::NonexistentPredicate
            | Self::AmbiguousPredicate
            | Self::InvalidAttachment(_)
            | Self::SaltTooShort { .. }
            | Self::Config(_) => ErrorKind::Precondition,

            Self::Type(TypeError::WrongValueType { .. }) => ErrorKind::Precondition,
            Self::Crypto(CryptoError::InvalidKey | CryptoError::InvalidLength { .. }) => {
                ErrorKind::Precondition
            }
            Self::Crypto(_) => ErrorKind::Integrity,

            Self::Malformed(_)
            | Self::Compression(_)
            | Self::Decompression(_)
            | Self::Type(_) => ErrorKind::Malformed,
        }
    }

    pub fn is_integrity_failure(&self) -> bool {
        self.kind() == ErrorKind::Integrity
    }
}

impl From<CryptoError> for EnvelopeError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::DecryptionFailed => Self::DecryptionFailed,
            CryptoError::InvalidSignature => Self::InvalidSignature,
            other => Self::Crypto(other),
        }
    }
}

/// Result alias for envelope operations.
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decryption_failure_is_integrity() {
        let err = EnvelopeError::from(CryptoError::DecryptionFailed);
        assert_eq!(err, EnvelopeError::DecryptionFailed);
        assert!(err.is_integrity_failure());
    }

    #[test]
    fn unknown_recipient_is_integrity() {
        assert_eq!(EnvelopeError::UnknownRecipient.kind(), ErrorKind::Integrity);
    }

    #[test]
    fn double_encryption_is_precondition() {
        assert_eq!(EnvelopeError::AlreadyEncrypted.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn decoding_errors_are_malformed() {
        let err = EnvelopeError::from(TypeError::Decoding("eof".into()));
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn wrong_value_type_is_precondition() {
        let err = EnvelopeError::from(TypeError::WrongValueType {
            expected: "text",
            found: "int",
        });
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn display_includes_digests() {
        let d = Digest::from_image(b"x");
        let msg = EnvelopeError::MissingOriginal(d).to_string();
        assert!(msg.contains(&d.to_hex()));
    }
}
