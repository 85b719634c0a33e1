//! Depth-first traversal and digest queries.

use std::collections::HashSet;

use envelope_types::Digest;

use crate::envelope::{Envelope, EnvelopeCase};

/// How a visited node was reached from its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeType {
    /// The root of the walk.
    None,
    Subject,
    Assertion,
    Predicate,
    Object,
    /// The inner envelope of a wrapped node.
    Content,
}

impl EdgeType {
    /// Short label shown beside a node in tree output.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Subject => Some("subj"),
            Self::Assertion => None,
            Self::Predicate => Some("pred"),
            Self::Object => Some("obj"),
            Self::Content => Some("cont"),
        }
    }
}

impl Envelope {
    /// Immediate children with the edge through which each is reached.
    pub(crate) fn child_edges(&self) -> Vec<(&Envelope, EdgeType)> {
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
            } => std::iter::once((subject, EdgeType::Subject))
                .chain(assertions.iter().map(|a| (a, EdgeType::Assertion)))
                .collect(),
            EnvelopeCase::Wrapped(inner) => vec![(inner, EdgeType::Content)],
            EnvelopeCase::Assertion(assertion) => vec![
                (assertion.predicate(), EdgeType::Predicate),
                (assertion.object(), EdgeType::Object),
            ],
            EnvelopeCase::Leaf(_)
            | EnvelopeCase::KnownValue(_)
            | EnvelopeCase::Elided(_)
            | EnvelopeCase::Encrypted(_)
            | EnvelopeCase::Compressed(_) => Vec::new(),
        }
    }

    /// Visit every node depth-first, parents before children.
    ///
    /// The visitor receives the node, its depth (the root is 0), and the edge
    /// it was reached by. Returning `false` skips that node's children.
    pub fn walk<F>(&self, mut visit: F)
    where
        F: FnMut(&Envelope, usize, EdgeType) -> bool,
    {
        self.walk_inner(0, EdgeType::None, &mut visit);
    }

    fn walk_inner<F>(&self, depth: usize, edge: EdgeType, visit: &mut F)
    where
        F: FnMut(&Envelope, usize, EdgeType) -> bool,
    {
        if !visit(self, depth, edge) {
            return;
        }
        for (child, edge) in self.child_edges() {
            child.walk_inner(depth + 1, edge, visit);
        }
    }

    /// Digests of every node shallower than `level_limit`. A limit of zero
    /// yields the empty set.
    pub fn digests(&self, level_limit: usize) -> HashSet<Digest> {
        let mut result = HashSet::new();
        self.walk(|env, depth, _| {
            if depth >= level_limit {
                return false;
            }
            result.insert(env.digest());
            true
        });
        result
    }

    /// Digests of every node in the tree.
    pub fn deep_digests(&self) -> HashSet<Digest> {
        self.digests(usize::MAX)
    }

    /// Digests of the root and its immediate children.
    pub fn shallow_digests(&self) -> HashSet<Digest> {
        self.digests(2)
    }

    /// Whether any node in the tree, obscured or not, has this digest.
    pub fn contains_digest(&self, digest: &Digest) -> bool {
        let mut found = false;
        self.walk(|env, _, _| {
            if env.digest() == *digest {
                found = true;
            }
            !found
        });
        found
    }

    /// Digests of every node whose content is visible: not elided, encrypted,
    /// or compressed.
    pub fn concrete_digests(&self) -> HashSet<Digest> {
        let mut result = HashSet::new();
        self.walk(|env, _, _| {
            if !env.is_obscured() {
                result.insert(env.digest());
            }
            true
        });
        result
    }

    /// The first visible subtree with this digest, in walk order.
    pub fn find_by_digest(&self, digest: &Digest) -> Option<Envelope> {
        let mut found = None;
        self.walk(|env, _, _| {
            if found.is_some() {
                return false;
            }
            if env.digest() == *digest && !env.is_obscured() {
                found = Some(env.clone());
                return false;
            }
            true
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

    #[test]
    fn walk_visits_every_node() {
        let mut visited = Vec::new();
        alice().walk(|env, depth, edge| {
            visited.push((env.digest(), depth, edge));
            true
        });
        // node, subject, 2 assertions, 2 predicates, 2 objects
        assert_eq!(visited.len(), 8);
        assert_eq!(visited[0], (alice().digest(), 0, EdgeType::None));
        assert_eq!(visited[1].2, EdgeType::Subject);
        assert_eq!(visited.iter().filter(|v| v.2 == EdgeType::Predicate).count(), 2);
        assert_eq!(visited.iter().map(|v| v.1).max(), Some(2));
    }

    #[test]
    fn walk_can_skip_children() {
        let mut count = 0;
        alice().walk(|_, depth, _| {
            count += 1;
            depth < 1
        });
        assert_eq!(count, 4);
    }

    #[test]
    fn walk_enters_wrapped_content() {
        let mut edges = Vec::new();
        Envelope::new("x").wrap().walk(|_, _, edge| {
            edges.push(edge);
            true
        });
        assert_eq!(edges, [EdgeType::None, EdgeType::Content]);
    }

    #[test]
    fn digest_sets() {
        let e = alice();
        // "knows" appears twice as a predicate; the sets deduplicate it.
        assert_eq!(e.deep_digests().len(), 7);
        assert_eq!(e.shallow_digests().len(), 4);
        assert!(e.digests(0).is_empty());
        assert_eq!(e.digests(1), HashSet::from([e.digest()]));
    }

    #[test]
    fn contains_digest_includes_obscured() {
        let e = alice();
        let bob = Envelope::new_assertion("knows", "Bob");
        let redacted = e.elide_removing_target(&bob);
        assert!(redacted.contains_digest(&bob.digest()));
        assert!(redacted.find_by_digest(&bob.digest()).is_none());
        assert!(!redacted.concrete_digests().contains(&bob.digest()));
    }

    #[test]
    fn find_by_digest_returns_subtree() {
        let e = alice();
        let carol = Envelope::new_assertion("knows", "Carol");
        let found = e.find_by_digest(&carol.digest()).unwrap();
        assert_eq!(found, carol);
        assert!(e.find_by_digest(&Envelope::new("Eve").digest()).is_none());
    }

    #[test]
    fn edge_labels() {
        assert_eq!(EdgeType::Subject.label(), Some("subj"));
        assert_eq!(EdgeType::Assertion.label(), None);
    }
}
