//! Envelope notation.
//!
//! [`Envelope::format`] renders the indented multi-line form:
//!
//! ```text
//! "Alice" [
//!     "knows": "Bob"
//!     "knows": "Carol"
//! ]
//! ```
//!
//! `Display` renders the same structure on one line. Assertions are listed
//! in the order of their rendered text, which is stable across runs.

use std::fmt;

use crate::envelope::{Envelope, EnvelopeCase};

const INDENT: &str = "    ";

impl Envelope {
    /// Multi-line envelope notation.
    pub fn format(&self) -> String {
        let mut out = String::new();
        self.format_item(0, &mut out);
        out
    }

    fn format_item(&self, level: usize, out: &mut String) {
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
            } => {
                subject.format_item(level, out);
                out.push_str(" [\n");
                let mut rendered: Vec<String> = assertions
                    .iter()
                    .map(|a| {
                        let mut s = String::new();
                        a.format_item(level + 1, &mut s);
                        s
                    })
                    .collect();
                rendered.sort();
                for item in rendered {
                    push_indent(level + 1, out);
                    out.push_str(&item);
                    out.push('\n');
                }
                push_indent(level, out);
                out.push(']');
            }
            EnvelopeCase::Wrapped(inner) => {
                out.push_str("{\n");
                push_indent(level + 1, out);
                inner.format_item(level + 1, out);
                out.push('\n');
                push_indent(level, out);
                out.push('}');
            }
            EnvelopeCase::Assertion(assertion) => {
                assertion.predicate().format_item(level, out);
                out.push_str(": ");
                assertion.object().format_item(level, out);
            }
            _ => out.push_str(&self.summary()),
        }
    }

    /// One-word rendering of a node with no visible children.
    fn summary(&self) -> String {
        match self.case() {
            EnvelopeCase::Leaf(value) => value.to_string(),
            EnvelopeCase::KnownValue(value) => value.to_string(),
            EnvelopeCase::Elided(_) => "ELIDED".to_owned(),
            EnvelopeCase::Encrypted(_) => "ENCRYPTED".to_owned(),
            EnvelopeCase::Compressed(_) => "COMPRESSED".to_owned(),
            EnvelopeCase::Node { .. } => "NODE".to_owned(),
            EnvelopeCase::Wrapped(_) => "WRAPPED".to_owned(),
            EnvelopeCase::Assertion(_) => "ASSERTION".to_owned(),
        }
    }

    /// One line per node: short digest, edge label, and a summary.
    ///
    /// ```text
    /// 8f7c2a1e NODE
    ///     4b1e09d3 subj "Alice"
    ///     9a03c6f2 ASSERTION
    ///         ...
    /// ```
    pub fn tree_format(&self) -> String {
        let mut lines = Vec::new();
        self.walk(|env, depth, edge| {
            let mut line = INDENT.repeat(depth);
            line.push_str(&env.digest().short_hex());
            if let Some(label) = edge.label() {
                line.push(' ');
                line.push_str(label);
            }
            line.push(' ');
            line.push_str(&env.summary());
            lines.push(line);
            true
        });
        lines.join("\n")
    }
}

fn push_indent(level: usize, out: &mut String) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
            } => {
                let mut rendered: Vec<String> = assertions.iter().map(|a| a.to_string()).collect();
                rendered.sort();
                write!(f, "{subject} [ {} ]", rendered.join(", "))
            }
            EnvelopeCase::Wrapped(inner) => write!(f, "{{ {inner} }}"),
            EnvelopeCase::Assertion(assertion) => {
                write!(f, "{}: {}", assertion.predicate(), assertion.object())
            }
            _ => f.write_str(&self.summary()),
        }
    }
}

#[cfg(test)]
mod tests {
    use envelope_crypto::SymmetricKey;
    use envelope_types::KnownValue;

    use super::*;

    fn alice() -> Envelope {
        Envelope::new("Alice")
            .add_assertion("knows", "Bob")
            .add_assertion("knows", "Carol")
    }

    #[test]
    fn leaf_notation() {
        assert_eq!(Envelope::new("Alice").format(), "\"Alice\"");
        assert_eq!(Envelope::new(42i64).format(), "42");
        assert_eq!(Envelope::new(KnownValue::IS_A).format(), "'isA'");
    }

    #[test]
    fn node_notation() {
        let expected = "\"Alice\" [\n    \"knows\": \"Bob\"\n    \"knows\": \"Carol\"\n]";
        assert_eq!(alice().format(), expected);
    }

    #[test]
    fn wrapped_notation() {
        let e = alice().wrap().add_assertion(KnownValue::NOTE, "wrapped");
        let expected = "{\n    \"Alice\" [\n        \"knows\": \"Bob\"\n        \"knows\": \"Carol\"\n    ]\n} [\n    'note': \"wrapped\"\n]";
        assert_eq!(e.format(), expected);
    }

    #[test]
    fn nested_object_notation() {
        let e = Envelope::new("Alice").add_assertion("knows", Envelope::new("Bob").add_assertion("age", 30i64));
        let expected = "\"Alice\" [\n    \"knows\": \"Bob\" [\n        \"age\": 30\n    ]\n]";
        assert_eq!(e.format(), expected);
    }

    #[test]
    fn obscured_notation() {
        let key = SymmetricKey::generate();
        let e = alice()
            .elide_removing_target(&Envelope::new_assertion("knows", "Bob"))
            .encrypt_subject(&key)
            .unwrap();
        assert_eq!(e.format(), "ENCRYPTED [\n    \"knows\": \"Carol\"\n    ELIDED\n]");
        assert_eq!(alice().compress().unwrap().format(), "COMPRESSED");
    }

    #[test]
    fn flat_display() {
        assert_eq!(alice().to_string(), "\"Alice\" [ \"knows\": \"Bob\", \"knows\": \"Carol\" ]");
        assert_eq!(Envelope::new("x").wrap().to_string(), "{ \"x\" }");
    }

    #[test]
    fn tree_lists_every_node() {
        let tree = alice().tree_format();
        assert_eq!(tree.lines().count(), 8);
        assert!(tree.lines().next().unwrap().ends_with("NODE"));
        assert!(tree.contains("subj \"Alice\""));
        assert!(tree.contains("pred \"knows\""));
        assert!(tree.contains("obj \"Carol\""));
    }
}
