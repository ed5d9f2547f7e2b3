//! Captured path parameters.
//!
//! A `ParamSet` is an insertion-ordered map from a parameter key to its
//! decoded value. Keys are either names (`:id`) or positions (anonymous
//! groups, raw regular expressions without named groups).

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Key of a captured parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Index(usize),
    Name(String),
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Index(i) => write!(f, "{}", i),
            ParamKey::Name(name) => f.write_str(name),
        }
    }
}

impl From<usize> for ParamKey {
    fn from(index: usize) -> Self {
        ParamKey::Index(index)
    }
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        ParamKey::Name(name.to_string())
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        ParamKey::Name(name)
    }
}

/// Ordered set of captured parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSet {
    entries: Vec<(ParamKey, String)>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value under the same key.
    /// A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<ParamKey>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a named parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.iter().find_map(|(k, v)| match k {
            ParamKey::Name(n) if n == name => Some(v.as_str()),
            _ => None,
        })
    }

    /// Look up a positional parameter.
    pub fn get_index(&self, index: usize) -> Option<&str> {
        self.get_key(&ParamKey::Index(index))
    }

    pub fn get_key(&self, key: &ParamKey) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, key: &ParamKey) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// Right-biased merge: every key of `prev`, then every key of `next`,
    /// with `next` winning on collision.
    pub fn merge(prev: &ParamSet, next: &ParamSet) -> ParamSet {
        let mut merged = prev.clone();
        for (key, value) in &next.entries {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

impl<K: Into<ParamKey>, V: Into<String>> FromIterator<(K, V)> for ParamSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ParamSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

impl Serialize for ParamSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(&key.to_string(), value)?;
        }
        map.end()
    }
}
