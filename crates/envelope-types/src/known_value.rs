use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A compact, integer-coded value.
///
/// Known values stand in for frequently used predicates (`'isA'`, `'note'`,
/// `'signed'`) so that envelopes do not have to carry the same strings over
/// and over. Identity is the code alone; the name is a display convenience
/// and is never encoded or digested.
#[derive(Clone)]
pub struct KnownValue {
    code: u64,
    name: Option<Cow<'static, str>>,
}

static REGISTRY: [KnownValue; 11] = [
    KnownValue::IS_A,
    KnownValue::ID,
    KnownValue::SIGNED,
    KnownValue::NOTE,
    KnownValue::HAS_RECIPIENT,
    KnownValue::NAME,
    KnownValue::SALT,
    KnownValue::DATE,
    KnownValue::ATTACHMENT,
    KnownValue::VENDOR,
    KnownValue::CONFORMS_TO,
];

impl KnownValue {
    pub const IS_A: Self = Self::new_static(1, "isA");
    pub const ID: Self = Self::new_static(2, "id");
    pub const SIGNED: Self = Self::new_static(3, "signed");
    pub const NOTE: Self = Self::new_static(4, "note");
    pub const HAS_RECIPIENT: Self = Self::new_static(5, "hasRecipient");
    pub const NAME: Self = Self::new_static(11, "name");
    pub const SALT: Self = Self::new_static(15, "salt");
    pub const DATE: Self = Self::new_static(16, "date");
    pub const ATTACHMENT: Self = Self::new_static(50, "attachment");
    pub const VENDOR: Self = Self::new_static(51, "vendor");
    pub const CONFORMS_TO: Self = Self::new_static(52, "conformsTo");

    /// Every registered known value.
    pub fn registry() -> &'static [KnownValue] {
        &REGISTRY
    }

    /// A known value with no assigned name.
    pub const fn new(code: u64) -> Self {
        Self { code, name: None }
    }

    /// A known value with an explicit name.
    pub fn with_name(code: u64, name: impl Into<String>) -> Self {
        Self {
            code,
            name: Some(Cow::Owned(name.into())),
        }
    }

    const fn new_static(code: u64, name: &'static str) -> Self {
        Self {
            code,
            name: Some(Cow::Borrowed(name)),
        }
    }

    /// Resolve a code against the registry, falling back to an unnamed value.
    pub fn named(code: u64) -> Self {
        REGISTRY
            .iter()
            .find(|kv| kv.code == code)
            .cloned()
            .unwrap_or_else(|| Self::new(code))
    }

    /// Look up a registered known value by name.
    pub fn by_name(name: &str) -> Option<Self> {
        REGISTRY
            .iter()
            .find(|kv| kv.name.as_deref() == Some(name))
            .cloned()
    }

    pub fn code(&self) -> u64 {
        self.code
    }

    /// The assigned name, or the decimal code when unnamed.
    pub fn name(&self) -> String {
        match &self.name {
            Some(name) => name.to_string(),
            None => self.code.to_string(),
        }
    }

    pub fn assigned_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl PartialEq for KnownValue {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for KnownValue {}

impl Hash for KnownValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl fmt::Debug for KnownValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KnownValue({}, {})", self.code, self.name())
    }
}

impl fmt::Display for KnownValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.name())
    }
}

impl From<u64> for KnownValue {
    fn from(code: u64) -> Self {
        Self::named(code)
    }
}

impl Serialize for KnownValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.code)
    }
}

impl<'de> Deserialize<'de> for KnownValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u64::deserialize(deserializer)?;
        Ok(Self::named(code))
    }
}
