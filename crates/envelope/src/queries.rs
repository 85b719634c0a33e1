//! Accessors for leaf content and predicate lookups.
//!
//! The `try_*` extractors look through a node to its subject, so
//! `"Alice" [ 'isA': "Person" ]` yields `"Alice"` from [`Envelope::try_text`].

use envelope_types::{KnownValue, Value};

use crate::assertion::Assertion;
use crate::envelope::{Envelope, EnvelopeCase, EnvelopeEncodable};
use crate::error::{EnvelopeError, EnvelopeResult};

impl Envelope {
    /// The assertion held directly by this envelope, if any.
    pub fn as_assertion(&self) -> Option<&Assertion> {
        match self.case() {
            EnvelopeCase::Assertion(assertion) => Some(assertion),
            _ => None,
        }
    }

    /// The assertion at the subject position.
    pub fn try_assertion(&self) -> EnvelopeResult<&Assertion> {
        self.subject_ref()
            .as_assertion()
            .ok_or(EnvelopeError::NotAssertion)
    }

    pub fn predicate(&self) -> EnvelopeResult<Envelope> {
        Ok(self.try_assertion()?.predicate().clone())
    }

    pub fn object(&self) -> EnvelopeResult<Envelope> {
        Ok(self.try_assertion()?.object().clone())
    }

    /// The value held directly by this envelope, if it is a leaf.
    pub fn as_leaf(&self) -> Option<&Value> {
        match self.case() {
            EnvelopeCase::Leaf(value) => Some(value),
            _ => None,
        }
    }

    pub fn try_leaf(&self) -> EnvelopeResult<&Value> {
        self.as_leaf().ok_or(EnvelopeError::NotLeaf)
    }

    pub fn as_known_value(&self) -> Option<&KnownValue> {
        match self.case() {
            EnvelopeCase::KnownValue(value) => Some(value),
            _ => None,
        }
    }

    /// The leaf value at the subject position.
    pub fn try_value(&self) -> EnvelopeResult<Value> {
        self.subject_ref().try_leaf().cloned()
    }

    pub fn try_text(&self) -> EnvelopeResult<String> {
        Ok(self.subject_ref().try_leaf()?.as_text()?.to_owned())
    }

    pub fn try_int(&self) -> EnvelopeResult<i64> {
        Ok(self.subject_ref().try_leaf()?.as_int()?)
    }

    pub fn try_bool(&self) -> EnvelopeResult<bool> {
        Ok(self.subject_ref().try_leaf()?.as_bool()?)
    }

    pub fn try_bytes(&self) -> EnvelopeResult<Vec<u8>> {
        Ok(self.subject_ref().try_leaf()?.as_byte_slice()?.to_vec())
    }

    pub fn try_known_value(&self) -> EnvelopeResult<KnownValue> {
        self.subject_ref()
            .as_known_value()
            .cloned()
            .ok_or(EnvelopeError::NotKnownValue)
    }

    /// Whether this is the `null` leaf.
    pub fn is_null(&self) -> bool {
        self.as_leaf().is_some_and(Value::is_null)
    }

    // ---------------------------------------------------------------
    // Predicate lookups
    // ---------------------------------------------------------------

    /// Every visible assertion whose predicate has the digest of `predicate`.
    /// Obscured assertions never match.
    pub fn assertions_with_predicate(&self, predicate: impl EnvelopeEncodable) -> Vec<Envelope> {
        let digest = predicate.into_envelope().digest();
        self.assertions()
            .iter()
            .filter(|a| {
                a.subject_ref()
                    .as_assertion()
                    .is_some_and(|assertion| assertion.predicate().digest() == digest)
            })
            .cloned()
            .collect()
    }

    /// The single assertion with the given predicate.
    pub fn assertion_with_predicate(
        &self,
        predicate: impl EnvelopeEncodable,
    ) -> EnvelopeResult<Envelope> {
        let mut matches = self.assertions_with_predicate(predicate);
        match matches.len() {
            0 => Err(EnvelopeError::NonexistentPredicate),
            1 => Ok(matches.remove(0)),
            _ => Err(EnvelopeError::AmbiguousPredicate),
        }
    }

    /// The object of the single assertion with the given predicate.
    pub fn object_for_predicate(
        &self,
        predicate: impl EnvelopeEncodable,
    ) -> EnvelopeResult<Envelope> {
        self.assertion_with_predicate(predicate)?.object()
    }

    /// Like [`object_for_predicate`](Self::object_for_predicate), but a
    /// missing predicate is `None` rather than an error.
    pub fn optional_object_for_predicate(
        &self,
        predicate: impl EnvelopeEncodable,
    ) -> EnvelopeResult<Option<Envelope>> {
        match self.object_for_predicate(predicate) {
            Ok(object) => Ok(Some(object)),
            Err(EnvelopeError::NonexistentPredicate) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The objects of every assertion with the given predicate.
    pub fn objects_for_predicate(&self, predicate: impl EnvelopeEncodable) -> Vec<Envelope> {
        self.assertions_with_predicate(predicate)
            .iter()
            .filter_map(|a| a.object().ok())
            .collect()
    }
}
