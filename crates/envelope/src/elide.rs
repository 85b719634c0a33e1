//! Elision: redacting subtrees by digest without changing the root digest.
//!
//! Two dual walks over a target set `S`:
//!
//! - *removing*: every node whose digest is in `S` is obscured, everything
//!   else is kept;
//! - *revealing*: every node in `S` is kept whole, every ancestor of such a
//!   node is kept as structure, and everything else is obscured.
//!
//! Obscuring defaults to eliding. [`ObscureAction`] also allows encrypting or
//! compressing the selected nodes instead; all three preserve digests, so the
//! root digest never changes.

use std::collections::{HashMap, HashSet};
use std::convert::Infallible;

use envelope_crypto::ContentCipher;
use envelope_types::Digest;
use tracing::debug;

use crate::assertion::Assertion;
use crate::envelope::{Envelope, EnvelopeCase};
use crate::error::{EnvelopeError, EnvelopeResult};

/// Anything that names a node by digest.
pub trait DigestProvider {
    fn digest(&self) -> Digest;
}

impl DigestProvider for Digest {
    fn digest(&self) -> Digest {
        *self
    }
}

impl DigestProvider for Envelope {
    fn digest(&self) -> Digest {
        Envelope::digest(self)
    }
}

impl DigestProvider for Assertion {
    fn digest(&self) -> Digest {
        Assertion::digest(self)
    }
}

impl<T: DigestProvider + ?Sized> DigestProvider for &T {
    fn digest(&self) -> Digest {
        (**self).digest()
    }
}

/// Collect the digests of a slice of targets.
pub fn digest_set<D: DigestProvider>(targets: &[D]) -> HashSet<Digest> {
    targets.iter().map(DigestProvider::digest).collect()
}

/// What to replace a selected node with.
#[derive(Clone, Copy)]
pub enum ObscureAction<'a> {
    Elide,
    Encrypt(&'a dyn ContentCipher),
    Compress,
}

impl std::fmt::Debug for ObscureAction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Elide => write!(f, "Elide"),
            Self::Encrypt(_) => write!(f, "Encrypt(<key>)"),
            Self::Compress => write!(f, "Compress"),
        }
    }
}

impl Envelope {
    /// Replace the whole envelope with an elided placeholder.
    pub fn elide(&self) -> Envelope {
        match self.case() {
            EnvelopeCase::Elided(_) => self.clone(),
            _ => Envelope::new_elided(self.digest()),
        }
    }

    /// Apply `action` to this node. Already obscured nodes are only ever
    /// elided further; encryption and compression leave them as they are.
    fn obscure(&self, action: ObscureAction<'_>) -> EnvelopeResult<Envelope> {
        match action {
            ObscureAction::Elide => Ok(self.elide()),
            _ if self.is_obscured() => Ok(self.clone()),
            ObscureAction::Encrypt(key) => self.encrypt(key),
            ObscureAction::Compress => self.compress(),
        }
    }

    // ---------------------------------------------------------------
    // Core walk
    // ---------------------------------------------------------------

    /// Rebuild this node with each child replaced by `f(child)`. Children
    /// for which `f` returns the same allocation are shared, and if every
    /// child is unchanged the node itself is returned.
    ///
    /// `f` must preserve digests; node assertion order is kept as is.
    pub(crate) fn try_map_children<E, F>(&self, mut f: F) -> Result<Envelope, E>
    where
        F: FnMut(&Envelope) -> Result<Envelope, E>,
    {
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
            } => {
                let new_subject = f(subject)?;
                let mut changed = !new_subject.ptr_eq(subject);
                let mut new_assertions = Vec::with_capacity(assertions.len());
                for assertion in assertions {
                    let new_assertion = f(assertion)?;
                    changed |= !new_assertion.ptr_eq(assertion);
                    new_assertions.push(new_assertion);
                }
                if !changed {
                    return Ok(self.clone());
                }
                Ok(Envelope::node_from_parts(new_subject, new_assertions))
            }
            EnvelopeCase::Wrapped(inner) => {
                let new_inner = f(inner)?;
                if new_inner.ptr_eq(inner) {
                    return Ok(self.clone());
                }
                Ok(new_inner.wrap())
            }
            EnvelopeCase::Assertion(assertion) => {
                let predicate = f(assertion.predicate())?;
                let object = f(assertion.object())?;
                if predicate.ptr_eq(assertion.predicate()) && object.ptr_eq(assertion.object()) {
                    return Ok(self.clone());
                }
                Ok(Envelope::new_assertion(predicate, object))
            }
            EnvelopeCase::Leaf(_)
            | EnvelopeCase::KnownValue(_)
            | EnvelopeCase::Elided(_)
            | EnvelopeCase::Encrypted(_)
            | EnvelopeCase::Compressed(_) => Ok(self.clone()),
        }
    }

    pub(crate) fn map_children<F>(&self, mut f: F) -> Envelope
    where
        F: FnMut(&Envelope) -> Envelope,
    {
        infallible(self.try_map_children(|child| Ok::<_, Infallible>(f(child))))
    }

    /// Mark every strict ancestor of a target node. Returns whether this
    /// subtree contains a target.
    fn collect_reveal_path(&self, target: &HashSet<Digest>, path: &mut HashSet<Digest>) -> bool {
        if target.contains(&self.digest()) {
            return true;
        }
        let mut found = false;
        for (child, _) in self.child_edges() {
            found |= child.collect_reveal_path(target, path);
        }
        if found {
            path.insert(self.digest());
        }
        found
    }

    fn elide_by<E, F>(
        &self,
        target: &HashSet<Digest>,
        reveal_path: Option<&HashSet<Digest>>,
        obscure: &mut F,
    ) -> Result<Envelope, E>
    where
        F: FnMut(&Envelope) -> Result<Envelope, E>,
    {
        let digest = self.digest();
        let descend = match reveal_path {
            None if target.contains(&digest) => return obscure(self),
            None => true,
            Some(_) if target.contains(&digest) => return Ok(self.clone()),
            Some(path) => path.contains(&digest),
        };
        if descend {
            self.try_map_children(|child| child.elide_by(target, reveal_path, obscure))
        } else {
            obscure(self)
        }
    }

    fn elide_set_by<E, F>(
        &self,
        target: &HashSet<Digest>,
        is_revealing: bool,
        mut obscure: F,
    ) -> Result<Envelope, E>
    where
        F: FnMut(&Envelope) -> Result<Envelope, E>,
    {
        if is_revealing {
            let mut path = HashSet::new();
            if !target.is_empty() {
                self.collect_reveal_path(target, &mut path);
            }
            self.elide_by(target, Some(&path), &mut obscure)
        } else if target.is_empty() {
            Ok(self.clone())
        } else {
            self.elide_by(target, None, &mut obscure)
        }
    }

    // ---------------------------------------------------------------
    // Elision entry points
    // ---------------------------------------------------------------

    /// Elide the targets (`is_revealing == false`) or everything except the
    /// targets and their ancestors (`is_revealing == true`).
    pub fn elide_set(&self, target: &HashSet<Digest>, is_revealing: bool) -> Envelope {
        infallible(self.elide_set_by(target, is_revealing, |env| {
            Ok::<_, Infallible>(env.elide())
        }))
    }

    pub fn elide_set_with_action(
        &self,
        target: &HashSet<Digest>,
        is_revealing: bool,
        action: ObscureAction<'_>,
    ) -> EnvelopeResult<Envelope> {
        self.elide_set_by(target, is_revealing, |env| env.obscure(action))
    }

    /// Elide every node whose digest is in `target`. Unmatched digests are
    /// ignored.
    pub fn elide_removing_set(&self, target: &HashSet<Digest>) -> Envelope {
        self.elide_set(target, false)
    }

    pub fn elide_removing_set_with_action(
        &self,
        target: &HashSet<Digest>,
        action: ObscureAction<'_>,
    ) -> EnvelopeResult<Envelope> {
        self.elide_set_with_action(target, false, action)
    }

    pub fn elide_removing_array<D: DigestProvider>(&self, targets: &[D]) -> Envelope {
        self.elide_removing_set(&digest_set(targets))
    }

    pub fn elide_removing_target(&self, target: &impl DigestProvider) -> Envelope {
        self.elide_removing_set(&HashSet::from([target.digest()]))
    }

    /// Elide everything that is neither in `target` nor on the path from the
    /// root to a target. The empty set elides the whole envelope.
    pub fn elide_revealing_set(&self, target: &HashSet<Digest>) -> Envelope {
        self.elide_set(target, true)
    }

    pub fn elide_revealing_set_with_action(
        &self,
        target: &HashSet<Digest>,
        action: ObscureAction<'_>,
    ) -> EnvelopeResult<Envelope> {
        self.elide_set_with_action(target, true, action)
    }

    pub fn elide_revealing_array<D: DigestProvider>(&self, targets: &[D]) -> Envelope {
        self.elide_revealing_set(&digest_set(targets))
    }

    pub fn elide_revealing_target(&self, target: &impl DigestProvider) -> Envelope {
        self.elide_revealing_set(&HashSet::from([target.digest()]))
    }

    // ---------------------------------------------------------------
    // Unelision
    // ---------------------------------------------------------------

    /// Restore every elided node from `original`.
    ///
    /// Fails if the root digests differ or if an elided node has no visible
    /// counterpart in `original`. Encrypted and compressed nodes are left as
    /// they are.
    pub fn unelide(&self, original: &Envelope) -> EnvelopeResult<Envelope> {
        if self.digest() != original.digest() {
            return Err(EnvelopeError::InvalidDigest {
                expected: self.digest(),
                actual: original.digest(),
            });
        }
        let mut index: HashMap<Digest, Envelope> = HashMap::new();
        original.walk(|env, _, _| {
            if !env.is_obscured() {
                index.entry(env.digest()).or_insert_with(|| env.clone());
            }
            true
        });
        let restored = self.unelide_from(&index)?;
        debug!(digest = %self.digest().short_hex(), "unelided envelope");
        Ok(restored)
    }

    fn unelide_from(&self, index: &HashMap<Digest, Envelope>) -> EnvelopeResult<Envelope> {
        match self.case() {
            EnvelopeCase::Elided(digest) => index
                .get(digest)
                .cloned()
                .ok_or(EnvelopeError::MissingOriginal(*digest)),
            _ => self.try_map_children(|child| child.unelide_from(index)),
        }
    }

    /// Restore the elided nodes that match one of `envelopes` by digest and
    /// leave the rest elided.
    pub fn walk_unelide(&self, envelopes: &[Envelope]) -> Envelope {
        let index: HashMap<Digest, &Envelope> =
            envelopes.iter().map(|env| (env.digest(), env)).collect();
        self.walk_unelide_from(&index)
    }

    fn walk_unelide_from(&self, index: &HashMap<Digest, &Envelope>) -> Envelope {
        match self.case() {
            EnvelopeCase::Elided(digest) => index
                .get(digest)
                .map(|env| (*env).clone())
                .unwrap_or_else(|| self.clone()),
            _ => self.map_children(|child| child.walk_unelide_from(index)),
        }
    }
}

fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}
