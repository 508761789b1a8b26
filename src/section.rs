use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    entries: HashMap<String, Value>,
}

impl Section {
    #[must_use]
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            entries: HashMap::with_capacity(16),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Key names in arbitrary order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entry(&mut self, key: String) -> Entry<'_, String, Value> {
        self.entries.entry(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(String),
    Sequence(Vec<String>),
}

impl Value {
    #[must_use]
    pub fn shape(&self) -> Shape {
        match self {
            Self::Scalar(..) => Shape::Scalar,
            Self::Sequence(..) => Shape::Sequence,
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Scalar(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Value::Sequence(value)
    }
}

/// Whether a key was written as `key = value` or accumulated from `key[] = value` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    Sequence,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Scalar => "scalar".fmt(f),
            Self::Sequence => "array".fmt(f),
        }
    }
}
