use envelope_types::Digest;

/// Domain-separated BLAKE3 digest function.
///
/// Each hasher carries a domain tag (e.g., `"envelope-leaf-v1"`) that is
/// prepended to every hash computation. The tag is the "small fixed tag"
/// distinguishing node variants: a leaf and an assertion whose images happen
/// to share bytes still produce different digests.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for leaf values (input: canonical value encoding).
    pub const LEAF: Self = Self {
        domain: "envelope-leaf-v1",
    };
    /// Hasher for subject/assertions nodes (input: child digests).
    pub const NODE: Self = Self {
        domain: "envelope-node-v1",
    };
    /// Hasher for predicate/object pairs (input: child digests).
    pub const ASSERTION: Self = Self {
        domain: "envelope-assertion-v1",
    };
    /// Hasher for wrapped envelopes (input: inner digest).
    pub const WRAPPED: Self = Self {
        domain: "envelope-wrapped-v1",
    };
    /// Hasher for known values (input: canonical code encoding).
    pub const KNOWN_VALUE: Self = Self {
        domain: "envelope-known-value-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Digest {
        let mut hasher = self.start();
        hasher.update(data);
        Digest::from_hash(*hasher.finalize().as_bytes())
    }

    /// Hash the concatenation of a sequence of digests.
    pub fn hash_digests<'a, I>(&self, digests: I) -> Digest
    where
        I: IntoIterator<Item = &'a Digest>,
    {
        let mut hasher = self.start();
        for digest in digests {
            hasher.update(digest.as_bytes());
        }
        Digest::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected digest.
    pub fn verify(&self, data: &[u8], expected: &Digest) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }

    fn start(&self) -> blake3::Hasher {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher
    }
}
