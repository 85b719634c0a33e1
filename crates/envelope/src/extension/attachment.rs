//! Vendor attachments.
//!
//! An attachment is an assertion of the form
//!
//! ```text
//! 'attachment': {
//!     payload
//! } [
//!     'vendor': "com.example"
//!     'conformsTo': "https://example.com/format/v1"
//! ]
//! ```
//!
//! The payload is wrapped so that its own assertions stay distinct from the
//! attachment metadata. `'conformsTo'` is optional.

use std::collections::HashMap;

use envelope_types::{Digest, KnownValue};

use crate::envelope::{Envelope, EnvelopeEncodable};
use crate::error::{EnvelopeError, EnvelopeResult};

impl Envelope {
    /// A new attachment assertion.
    pub fn new_attachment(
        payload: impl EnvelopeEncodable,
        vendor: &str,
        conforms_to: Option<&str>,
    ) -> Envelope {
        let body = payload
            .into_envelope()
            .wrap()
            .add_assertion(KnownValue::VENDOR, vendor)
            .add_optional_assertion(KnownValue::CONFORMS_TO, conforms_to);
        Envelope::new_assertion(KnownValue::ATTACHMENT, body)
    }

    pub fn add_attachment(
        &self,
        payload: impl EnvelopeEncodable,
        vendor: &str,
        conforms_to: Option<&str>,
    ) -> Envelope {
        self.add_valid_assertion(Envelope::new_attachment(payload, vendor, conforms_to))
    }

    /// The payload of an attachment assertion.
    pub fn attachment_payload(&self) -> EnvelopeResult<Envelope> {
        self.object()?.try_unwrap()
    }

    pub fn attachment_vendor(&self) -> EnvelopeResult<String> {
        self.object()?
            .object_for_predicate(KnownValue::VENDOR)?
            .try_text()
    }

    pub fn attachment_conforms_to(&self) -> EnvelopeResult<Option<String>> {
        self.object()?
            .optional_object_for_predicate(KnownValue::CONFORMS_TO)?
            .map(|object| object.try_text())
            .transpose()
    }

    /// Check that this is a well-formed attachment assertion.
    pub fn validate_attachment(&self) -> EnvelopeResult<()> {
        let invalid = |reason: &str| EnvelopeError::InvalidAttachment(reason.to_owned());
        let predicate = self.predicate().map_err(|_| invalid("not an assertion"))?;
        if predicate.try_known_value().ok() != Some(KnownValue::ATTACHMENT) {
            return Err(invalid("predicate is not 'attachment'"));
        }
        let payload = self
            .attachment_payload()
            .map_err(|_| invalid("payload is not wrapped"))?;
        let vendor = self
            .attachment_vendor()
            .map_err(|_| invalid("missing or ambiguous vendor"))?;
        let conforms_to = self
            .attachment_conforms_to()
            .map_err(|_| invalid("malformed conformsTo"))?;
        let rebuilt = Envelope::new_attachment(payload, &vendor, conforms_to.as_deref());
        if !rebuilt.is_equivalent_to(self) {
            return Err(invalid("unexpected assertions"));
        }
        Ok(())
    }

    /// Every attachment on this envelope.
    pub fn attachments(&self) -> EnvelopeResult<Vec<Envelope>> {
        self.attachments_with_vendor_and_conforms_to(None, None)
    }

    /// Attachments matching `vendor` and `conforms_to`; `None` matches any.
    pub fn attachments_with_vendor_and_conforms_to(
        &self,
        vendor: Option<&str>,
        conforms_to: Option<&str>,
    ) -> EnvelopeResult<Vec<Envelope>> {
        let mut result = Vec::new();
        for attachment in self.assertions_with_predicate(KnownValue::ATTACHMENT) {
            attachment.validate_attachment()?;
            if let Some(vendor) = vendor {
                if attachment.attachment_vendor()? != vendor {
                    continue;
                }
            }
            if let Some(conforms_to) = conforms_to {
                if attachment.attachment_conforms_to()?.as_deref() != Some(conforms_to) {
                    continue;
                }
            }
            result.push(attachment);
        }
        Ok(result)
    }

    /// The single attachment matching `vendor` and `conforms_to`.
    pub fn attachment_with_vendor_and_conforms_to(
        &self,
        vendor: Option<&str>,
        conforms_to: Option<&str>,
    ) -> EnvelopeResult<Envelope> {
        let mut matches = self.attachments_with_vendor_and_conforms_to(vendor, conforms_to)?;
        match matches.len() {
            0 => Err(EnvelopeError::NonexistentPredicate),
            1 => Ok(matches.remove(0)),
            _ => Err(EnvelopeError::AmbiguousPredicate),
        }
    }
}

/// A set of attachments keyed by digest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attachments {
    envelopes: HashMap<Digest, Envelope>,
}

impl Attachments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attachment; returns its digest.
    pub fn add(
        &mut self,
        payload: impl EnvelopeEncodable,
        vendor: &str,
        conforms_to: Option<&str>,
    ) -> Digest {
        let attachment = Envelope::new_attachment(payload, vendor, conforms_to);
        let digest = attachment.digest();
        self.envelopes.insert(digest, attachment);
        digest
    }

    pub fn get(&self, digest: &Digest) -> Option<&Envelope> {
        self.envelopes.get(digest)
    }

    pub fn remove(&mut self, digest: &Digest) -> Option<Envelope> {
        self.envelopes.remove(digest)
    }

    pub fn clear(&mut self) {
        self.envelopes.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    /// Add every attachment to `envelope`.
    pub fn add_to_envelope(&self, envelope: &Envelope) -> Envelope {
        self.envelopes
            .values()
            .fold(envelope.clone(), |env, a| env.add_valid_assertion(a.clone()))
    }

    /// Collect the attachments of `envelope`, validating each.
    pub fn from_envelope(envelope: &Envelope) -> EnvelopeResult<Self> {
        let envelopes = envelope
            .attachments()?
            .into_iter()
            .map(|a| (a.digest(), a))
            .collect();
        Ok(Self { envelopes })
    }
}
