//! Predicate/object pairs and the node operations that add, remove, and
//! replace them.

use envelope_crypto::ContentHasher;
use envelope_types::Digest;

use crate::envelope::{Envelope, EnvelopeCase, EnvelopeEncodable};
use crate::error::{EnvelopeError, EnvelopeResult};

/// A predicate/object pair attached to a subject.
///
/// The digest is computed once at construction from the two child digests.
#[derive(Clone, Debug)]
pub struct Assertion {
    predicate: Envelope,
    object: Envelope,
    digest: Digest,
}

impl Assertion {
    pub fn new(predicate: impl EnvelopeEncodable, object: impl EnvelopeEncodable) -> Self {
        let predicate = predicate.into_envelope();
        let object = object.into_envelope();
        let digest = ContentHasher::ASSERTION.hash_digests([&predicate.digest(), &object.digest()]);
        Self {
            predicate,
            object,
            digest,
        }
    }

    pub fn predicate(&self) -> &Envelope {
        &self.predicate
    }

    pub fn object(&self) -> &Envelope {
        &self.object
    }

    pub fn digest(&self) -> Digest {
        self.digest
    }
}

impl PartialEq for Assertion {
    fn eq(&self, other: &Self) -> bool {
        self.predicate.is_identical_to(&other.predicate)
            && self.object.is_identical_to(&other.object)
    }
}

impl Eq for Assertion {}

impl Envelope {
    /// Add a `predicate: object` assertion. Adding one that is already present
    /// returns the envelope unchanged.
    pub fn add_assertion(
        &self,
        predicate: impl EnvelopeEncodable,
        object: impl EnvelopeEncodable,
    ) -> Envelope {
        self.add_valid_assertion(Envelope::new_assertion(predicate, object))
    }

    /// Add an assertion envelope, which must be an assertion or obscured.
    pub fn add_assertion_envelope(
        &self,
        assertion: impl EnvelopeEncodable,
    ) -> EnvelopeResult<Envelope> {
        let assertion = assertion.into_envelope();
        if !assertion.is_valid_assertion() {
            return Err(EnvelopeError::InvalidAssertion);
        }
        Ok(self.add_valid_assertion(assertion))
    }

    pub fn add_assertion_envelopes(&self, assertions: &[Envelope]) -> EnvelopeResult<Envelope> {
        assertions
            .iter()
            .try_fold(self.clone(), |env, a| env.add_assertion_envelope(a))
    }

    /// Add the assertion only when `object` is present.
    pub fn add_optional_assertion<O: EnvelopeEncodable>(
        &self,
        predicate: impl EnvelopeEncodable,
        object: Option<O>,
    ) -> Envelope {
        match object {
            Some(object) => self.add_assertion(predicate, object),
            None => self.clone(),
        }
    }

    /// Remove the assertion with the same digest as `target`. Removing the
    /// last assertion yields the bare subject; an absent target is a no-op.
    pub fn remove_assertion(&self, target: &Envelope) -> Envelope {
        let EnvelopeCase::Node {
            subject,
            assertions,
        } = self.case()
        else {
            return self.clone();
        };
        let digest = target.digest();
        match assertions.binary_search_by_key(&digest, Envelope::digest) {
            Ok(pos) => {
                let mut assertions = assertions.clone();
                assertions.remove(pos);
                Envelope::node_from_parts(subject.clone(), assertions)
            }
            Err(_) => self.clone(),
        }
    }

    pub fn replace_assertion(
        &self,
        old: &Envelope,
        new: impl EnvelopeEncodable,
    ) -> EnvelopeResult<Envelope> {
        self.remove_assertion(old).add_assertion_envelope(new)
    }

    /// Swap the subject, keeping every assertion.
    pub fn replace_subject(&self, subject: impl EnvelopeEncodable) -> Envelope {
        self.assertions()
            .iter()
            .fold(subject.into_envelope(), |env, a| env.add_valid_assertion(a.clone()))
    }
}
