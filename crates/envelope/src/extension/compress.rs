//! zstd compression of envelope nodes.
//!
//! Compressing twice is a no-op: a compressed node is returned unchanged.
//! Encrypted and elided nodes cannot be compressed, since there is nothing
//! left to shrink.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use envelope_types::Digest;

use crate::config::EnvelopeConfig;
use crate::envelope::{Envelope, EnvelopeCase};
use crate::error::{EnvelopeError, EnvelopeResult};

/// Compressed wire bytes of a node, tagged with that node's digest.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Compressed {
    data: Vec<u8>,
    original_len: u64,
    digest: Digest,
}

impl Compressed {
    pub fn new(data: Vec<u8>, original_len: u64, digest: Digest) -> Self {
        Self {
            data,
            original_len,
            digest,
        }
    }

    /// The zstd frame.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Length of the uncompressed wire bytes.
    pub fn original_len(&self) -> u64 {
        self.original_len
    }

    pub fn digest(&self) -> Digest {
        self.digest
    }
}

impl Envelope {
    pub fn compress(&self) -> EnvelopeResult<Envelope> {
        self.compress_with(&EnvelopeConfig::default())
    }

    /// Replace this node with its compressed wire form.
    pub fn compress_with(&self, config: &EnvelopeConfig) -> EnvelopeResult<Envelope> {
        match self.case() {
            EnvelopeCase::Compressed(_) => return Ok(self.clone()),
            EnvelopeCase::Encrypted(_) => return Err(EnvelopeError::AlreadyEncrypted),
            EnvelopeCase::Elided(_) => return Err(EnvelopeError::AlreadyElided),
            _ => {}
        }

        let raw = self.to_bytes()?;
        let data = zstd::encode_all(raw.as_slice(), config.compression_level)
            .map_err(|e| EnvelopeError::Compression(e.to_string()))?;

        debug!(
            digest = %self.digest().short_hex(),
            original = raw.len(),
            compressed = data.len(),
            "compressed envelope"
        );
        Ok(Envelope::new_with_compressed(Compressed::new(
            data,
            raw.len() as u64,
            self.digest(),
        )))
    }

    pub fn decompress(&self) -> EnvelopeResult<Envelope> {
        self.decompress_with(&EnvelopeConfig::default())
    }

    /// Restore a compressed node, verifying its size and digest.
    pub fn decompress_with(&self, config: &EnvelopeConfig) -> EnvelopeResult<Envelope> {
        let EnvelopeCase::Compressed(compressed) = self.case() else {
            return Err(EnvelopeError::NotCompressed);
        };

        let expected_len = usize::try_from(compressed.original_len())
            .ok()
            .filter(|len| *len <= config.max_decompressed_len)
            .ok_or_else(|| {
                EnvelopeError::Decompression(format!(
                    "declared size {} exceeds limit {}",
                    compressed.original_len(),
                    config.max_decompressed_len
                ))
            })?;

        let raw = zstd::bulk::decompress(compressed.data(), expected_len)
            .map_err(|e| EnvelopeError::Decompression(e.to_string()))?;
        if raw.len() != expected_len {
            return Err(EnvelopeError::Decompression(format!(
                "size mismatch: expected {expected_len}, got {}",
                raw.len()
            )));
        }

        let env = Envelope::from_bytes_with(&raw, config)?;
        if env.digest() != compressed.digest() {
            warn!(
                expected = %compressed.digest().short_hex(),
                actual = %env.digest().short_hex(),
                "decompressed envelope digest mismatch"
            );
            return Err(EnvelopeError::InvalidDigest {
                expected: compressed.digest(),
                actual: env.digest(),
            });
        }
        Ok(env)
    }

    /// Compress only the subject, leaving assertions visible.
    pub fn compress_subject(&self) -> EnvelopeResult<Envelope> {
        self.compress_subject_with(&EnvelopeConfig::default())
    }

    pub fn compress_subject_with(&self, config: &EnvelopeConfig) -> EnvelopeResult<Envelope> {
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
            } => Ok(Envelope::node_from_parts(
                subject.compress_with(config)?,
                assertions.clone(),
            )),
            _ => self.compress_with(config),
        }
    }

    /// Decompress the subject if it is compressed; otherwise return `self`.
    pub fn decompress_subject(&self) -> EnvelopeResult<Envelope> {
        self.decompress_subject_with(&EnvelopeConfig::default())
    }

    pub fn decompress_subject_with(&self, config: &EnvelopeConfig) -> EnvelopeResult<Envelope> {
        if !self.is_subject_compressed() {
            return Ok(self.clone());
        }
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
            } => Ok(Envelope::node_from_parts(
                subject.decompress_with(config)?,
                assertions.clone(),
            )),
            _ => self.decompress_with(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use envelope_crypto::SymmetricKey;
    use proptest::prelude::*;

    use super::*;
    use crate::error::ErrorKind;

    fn lorem() -> Envelope {
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(20);
        Envelope::new(text.as_str())
            .add_assertion("lang", "la")
            .add_assertion("words", 160i64)
    }

    #[test]
    fn compress_roundtrip() {
        let e = lorem();
        let c = e.compress().unwrap();
        assert!(c.is_compressed());
        assert_eq!(c.digest(), e.digest());
        assert!(c.decompress().unwrap().is_identical_to(&e));
    }

    #[test]
    fn compression_shrinks_repetitive_content() {
        let compressed = lorem().compress().unwrap();
        let EnvelopeCase::Compressed(c) = compressed.case() else {
            panic!("expected compressed node");
        };
        assert!((c.data().len() as u64) < c.original_len());
    }

    #[test]
    fn compressing_twice_is_noop() {
        let c = lorem().compress().unwrap();
        let again = c.compress().unwrap();
        assert!(again.ptr_eq(&c));
    }

    #[test]
    fn compressing_encrypted_or_elided_fails() {
        let key = SymmetricKey::generate();
        let e = lorem();
        assert_eq!(
            e.encrypt(&key).unwrap().compress().unwrap_err(),
            EnvelopeError::AlreadyEncrypted
        );
        assert_eq!(e.elide().compress().unwrap_err(), EnvelopeError::AlreadyElided);
    }

    #[test]
    fn decompress_uncompressed_fails() {
        assert_eq!(lorem().decompress().unwrap_err(), EnvelopeError::NotCompressed);
    }

    #[test]
    fn subject_compression() {
        let e = lorem();
        let c = e.compress_subject().unwrap();
        assert!(c.is_subject_compressed());
        assert_eq!(c.assertions().len(), 2);
        assert_eq!(c.digest(), e.digest());
        assert!(c.decompress_subject().unwrap().is_identical_to(&e));
        assert!(e.decompress_subject().unwrap().ptr_eq(&e));
    }

    #[test]
    fn corrupted_data_fails() {
        let compressed = lorem().compress().unwrap();
        let EnvelopeCase::Compressed(c) = compressed.case() else {
            panic!("expected compressed node");
        };
        let mut data = c.data().to_vec();
        let mid = data.len() / 2;
        data[mid] ^= 0xff;
        let bad = Envelope::new_with_compressed(Compressed::new(data, c.original_len(), c.digest()));
        assert!(bad.decompress().is_err());
    }

    #[test]
    fn wrong_digest_is_integrity_failure() {
        let compressed = lorem().compress().unwrap();
        let EnvelopeCase::Compressed(c) = compressed.case() else {
            panic!("expected compressed node");
        };
        let forged = Envelope::new_with_compressed(Compressed::new(
            c.data().to_vec(),
            c.original_len(),
            Envelope::new("other").digest(),
        ));
        let err = forged.decompress().unwrap_err();
        assert!(matches!(err, EnvelopeError::InvalidDigest { .. }));
        assert_eq!(err.kind(), ErrorKind::Integrity);
    }

    #[test]
    fn declared_size_over_limit_is_rejected() {
        let c = lorem().compress().unwrap();
        let config = EnvelopeConfig {
            max_decompressed_len: 16,
            ..EnvelopeConfig::default()
        };
        assert!(matches!(
            c.decompress_with(&config).unwrap_err(),
            EnvelopeError::Decompression(_)
        ));
    }

    #[test]
    fn understated_size_is_rejected() {
        let compressed = lorem().compress().unwrap();
        let EnvelopeCase::Compressed(c) = compressed.case() else {
            panic!("expected compressed node");
        };
        let lying = Envelope::new_with_compressed(Compressed::new(
            c.data().to_vec(),
            c.original_len() / 2,
            c.digest(),
        ));
        assert!(lying.decompress().is_err());
    }

    #[test]
    fn decompression_honours_depth_limit() {
        let e = Envelope::new("deep").wrap().wrap().wrap();
        let c = e.compress().unwrap();
        let config = EnvelopeConfig {
            max_depth: 2,
            ..EnvelopeConfig::default()
        };
        let err = c.decompress_with(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert!(c.decompress().unwrap().is_identical_to(&e));
    }

    #[test]
    fn configured_level_roundtrips() {
        let config = EnvelopeConfig {
            compression_level: 19,
            ..EnvelopeConfig::default()
        };
        let e = lorem();
        let c = e.compress_with(&config).unwrap();
        assert!(c.decompress_with(&config).unwrap().is_identical_to(&e));
    }

    proptest! {
        #[test]
        fn compress_is_reversible(text in ".{0,200}", n in any::<i64>()) {
            let e = Envelope::new(text.as_str()).add_assertion("n", n);
            let c = e.compress().unwrap();
            prop_assert_eq!(c.digest(), e.digest());
            prop_assert!(c.decompress().unwrap().is_identical_to(&e));
        }
    }
}
