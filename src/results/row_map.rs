use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::RowValues;

/// How column names are stored when a row is projected into a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum KeyCase {
    /// Keep the name exactly as the driver reports it.
    #[default]
    Preserve,
    /// Store names lower-cased.
    Lower,
    /// Store names upper-cased.
    Upper,
}

impl KeyCase {
    #[must_use]
    pub fn apply(self, name: &str) -> String {
        match self {
            KeyCase::Preserve => name.to_string(),
            KeyCase::Lower => name.to_lowercase(),
            KeyCase::Upper => name.to_uppercase(),
        }
    }
}

fn fold(key: &str) -> String {
    key.to_lowercase()
}

/// A column-keyed row where lookups ignore letter case.
///
/// Keys keep the casing they were inserted with and entries keep insertion order.
/// Databases disagree on how they case column names, so `get("ID")` and `get("id")`
/// resolve to the same entry. At most one entry exists per case-folded key.
///
/// ```rust
/// use sql_pager::prelude::*;
///
/// let mut row = CaseInsensitiveRow::new();
/// row.insert("Name", RowValues::Int(1));
/// let old = row.insert("name", RowValues::Int(2));
/// assert_eq!(old, Some(RowValues::Int(1)));
/// assert_eq!(row.len(), 1);
/// assert_eq!(row.get("NAME"), Some(&RowValues::Int(2)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CaseInsensitiveRow<V = RowValues> {
    entries: Vec<(String, V)>,
    // folded key -> position in `entries`
    index: HashMap<String, usize>,
}

impl<V> Default for CaseInsensitiveRow<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> CaseInsensitiveRow<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a value, replacing any entry whose key folds to the same name.
    ///
    /// The replaced entry's position is reused and its key takes the new casing.
    /// Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        let folded = fold(&key);
        if let Some(&pos) = self.index.get(&folded) {
            let (_, old) = std::mem::replace(&mut self.entries[pos], (key, value));
            return Some(old);
        }
        self.index.insert(folded, self.entries.len());
        self.entries.push((key, value));
        None
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.position(key).map(|pos| &self.entries[pos].1)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(&fold(key))
    }

    /// The key as it was stored, for a lookup in any casing.
    #[must_use]
    pub fn stored_key(&self, key: &str) -> Option<&str> {
        self.position(key).map(|pos| self.entries[pos].0.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        let pos = self.index.remove(&fold(key))?;
        let (_, value) = self.entries.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.index.get(&fold(key)).copied()
    }
}

impl<K: Into<String>, V> Extend<(K, V)> for CaseInsensitiveRow<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for CaseInsensitiveRow<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Self::new();
        row.extend(iter);
        row
    }
}

impl<V> IntoIterator for CaseInsensitiveRow<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<V: Serialize> Serialize for CaseInsensitiveRow<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
