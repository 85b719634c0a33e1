//! Inclusion proofs.
//!
//! A proof is the original envelope elided down to the paths that lead to a
//! set of target subtrees. It has the same root digest as the original, so a
//! verifier who trusts only that digest (typically held as a fully elided
//! envelope) can check that the targets really sit beneath it.
//!
//! Construction returns `None` when a target is absent. That is a normal
//! outcome and is distinct from a proof that fails verification.

use std::collections::HashSet;

use envelope_types::Digest;
use tracing::{debug, warn};

use crate::elide::DigestProvider;
use crate::envelope::Envelope;
use crate::error::{EnvelopeError, EnvelopeResult};

impl Envelope {
    /// A minimal-disclosure proof that every digest in `target` names a
    /// visible subtree of this envelope, or `None` if one does not.
    ///
    /// The empty set yields the fully elided root.
    pub fn proof_contains_set(&self, target: &HashSet<Digest>) -> Option<Envelope> {
        let visible = self.concrete_digests();
        if let Some(missing) = target.iter().find(|d| !visible.contains(*d)) {
            debug!(
                root = %self.digest().short_hex(),
                missing = %missing.short_hex(),
                "proof target not present"
            );
            return None;
        }
        Some(self.elide_revealing_set(target))
    }

    pub fn proof_contains_target(&self, target: &impl DigestProvider) -> Option<Envelope> {
        self.proof_contains_set(&HashSet::from([target.digest()]))
    }

    /// Check `proof` against this trusted root, reporting why it fails.
    ///
    /// The proof must have this envelope's digest and must disclose every
    /// target as a visible subtree.
    pub fn check_contains_set(
        &self,
        target: &HashSet<Digest>,
        proof: &Envelope,
    ) -> EnvelopeResult<()> {
        if self.digest() != proof.digest() {
            warn!(
                expected = %self.digest().short_hex(),
                actual = %proof.digest().short_hex(),
                "proof root digest mismatch"
            );
            return Err(EnvelopeError::InvalidDigest {
                expected: self.digest(),
                actual: proof.digest(),
            });
        }
        let disclosed = proof.concrete_digests();
        let mut missing: Vec<&Digest> = target.iter().filter(|d| !disclosed.contains(*d)).collect();
        missing.sort();
        match missing.first() {
            Some(digest) => Err(EnvelopeError::TargetNotDisclosed(**digest)),
            None => Ok(()),
        }
    }

    pub fn confirm_contains_set(&self, target: &HashSet<Digest>, proof: &Envelope) -> bool {
        self.check_contains_set(target, proof).is_ok()
    }

    /// Whether `proof` is pinned to this root and discloses a subtree that is
    /// structurally identical to `target`.
    pub fn confirm_contains_target(&self, target: &Envelope, proof: &Envelope) -> bool {
        if self.digest() != proof.digest() {
            return false;
        }
        let mut found = false;
        proof.walk(|env, _, _| {
            if !found && env.is_identical_to(target) {
                found = true;
            }
            !found
        });
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Envelope {
        Envelope::new("Alice")
            .add_assertion("knows", "Bob")
            .add_assertion("knows", "Carol")
    }

    fn knows(name: &str) -> Envelope {
        Envelope::new_assertion("knows", name)
    }

    #[test]
    fn prove_and_confirm_single_assertion() {
        let e = alice();
        let root = e.elide_revealing_set(&HashSet::new());
        let proof = e.proof_contains_target(&knows("Bob")).unwrap();
        assert_eq!(proof.digest(), e.digest());
        assert!(root.confirm_contains_target(&knows("Bob"), &proof));
        assert!(!root.confirm_contains_target(&knows("Eve"), &proof));
    }

    #[test]
    fn proof_hides_other_assertions() {
        let proof = alice().proof_contains_target(&knows("Bob")).unwrap();
        assert!(proof.find_by_digest(&knows("Carol").digest()).is_none());
        assert!(proof.subject().is_elided());
    }

    #[test]
    fn absent_target_yields_no_proof() {
        assert!(alice().proof_contains_target(&knows("Eve")).is_none());
    }

    #[test]
    fn elided_target_yields_no_proof() {
        let redacted = alice().elide_removing_target(&knows("Bob"));
        assert!(redacted.proof_contains_target(&knows("Bob")).is_none());
    }

    #[test]
    fn empty_set_proof_is_trivial() {
        let e = alice();
        let root = e.elide_revealing_set(&HashSet::new());
        let proof = e.proof_contains_set(&HashSet::new()).unwrap();
        assert!(proof.is_elided());
        assert!(root.confirm_contains_set(&HashSet::new(), &proof));
    }

    #[test]
    fn proof_for_several_targets() {
        let e = alice();
        let root = e.elide();
        let target = HashSet::from([knows("Bob").digest(), knows("Carol").digest()]);
        let proof = e.proof_contains_set(&target).unwrap();
        assert!(root.confirm_contains_set(&target, &proof));
        assert!(root.check_contains_set(&target, &proof).is_ok());
    }

    #[test]
    fn proof_against_different_root_fails() {
        let e = alice();
        let other = Envelope::new("Alice")
            .add_assertion("knows", "Bob")
            .add_assertion("knows", "Dave");
        let proof = e.proof_contains_target(&knows("Bob")).unwrap();
        let other_root = other.elide();
        assert!(!other_root.confirm_contains_target(&knows("Bob"), &proof));

        let target = HashSet::from([knows("Bob").digest()]);
        assert!(!other_root.confirm_contains_set(&target, &proof));
        let err = other_root.check_contains_set(&target, &proof).unwrap_err();
        assert!(err.is_integrity_failure());
    }

    #[test]
    fn undisclosed_target_is_reported() {
        let e = alice();
        let proof = e.proof_contains_target(&knows("Bob")).unwrap();
        let target = HashSet::from([knows("Carol").digest()]);
        assert_eq!(
            e.elide().check_contains_set(&target, &proof).unwrap_err(),
            EnvelopeError::TargetNotDisclosed(knows("Carol").digest())
        );
    }

    #[test]
    fn confirm_requires_structure_not_just_digest() {
        let e = alice();
        let root = e.elide();
        // An elided placeholder shares the target's digest but discloses nothing.
        let proof = e.elide_removing_target(&knows("Bob"));
        assert!(!root.confirm_contains_target(&knows("Bob"), &proof));
    }

    #[test]
    fn nested_target_proof() {
        let e = alice().wrap().add_assertion("note", "wrapped");
        let target = Envelope::new("Carol");
        let proof = e.proof_contains_target(&target).unwrap();
        assert!(e.elide().confirm_contains_target(&target, &proof));
    }
}
