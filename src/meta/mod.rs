// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The metadata container that headers are normalised into.
//!
//! A [`MetaDict`] is an ordered mapping from keys to FITS-legal scalar values.
//! Keys are case-insensitive; the spelling used when a key was first inserted
//! is kept so that diagnostics can quote it back to the caller.

#[cfg(test)]
mod tests;

use std::fmt::Display;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A scalar value that can be stored in a FITS header card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),

    /// A value card whose value field is empty.
    Undefined,
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetaValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers are widened; strings are not parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Integer(i) => Some(*i as f64),
            MetaValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, MetaValue::Float(f) if f.is_nan())
    }
}

impl Display for MetaValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetaValue::Bool(b) => write!(f, "{b}"),
            MetaValue::Integer(i) => write!(f, "{i}"),
            MetaValue::Float(v) => write!(f, "{v}"),
            MetaValue::String(s) => write!(f, "{s}"),
            MetaValue::Undefined => Ok(()),
        }
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        MetaValue::Bool(b)
    }
}

impl From<i64> for MetaValue {
    fn from(i: i64) -> Self {
        MetaValue::Integer(i)
    }
}

impl From<i32> for MetaValue {
    fn from(i: i32) -> Self {
        MetaValue::Integer(i64::from(i))
    }
}

impl From<u32> for MetaValue {
    fn from(i: u32) -> Self {
        MetaValue::Integer(i64::from(i))
    }
}

impl From<f64> for MetaValue {
    fn from(f: f64) -> Self {
        MetaValue::Float(f)
    }
}

impl From<f32> for MetaValue {
    fn from(f: f32) -> Self {
        MetaValue::Float(f64::from(f))
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::String(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::String(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct MetaEntry {
    /// The key as the caller first spelled it.
    key: String,
    value: MetaValue,
}

/// An ordered, case-insensitive mapping of header metadata.
///
/// Alongside the values, a `MetaDict` keeps a "key comments" sidecar which
/// associates free text with any key (the comment field of a FITS card).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "RawMetaDict", from = "RawMetaDict")]
pub struct MetaDict {
    /// Keyed by the upper-cased key.
    entries: IndexMap<String, MetaEntry>,

    /// Keyed by the upper-cased key.
    key_comments: IndexMap<String, String>,
}

fn canonical(key: &str) -> String {
    key.to_ascii_uppercase()
}

impl MetaDict {
    pub fn new() -> MetaDict {
        MetaDict::default()
    }

    /// Insert a value, returning the previous one if the key (compared
    /// case-insensitively) was already present. An existing key keeps its
    /// position and original spelling.
    pub fn insert<K: AsRef<str>, V: Into<MetaValue>>(
        &mut self,
        key: K,
        value: V,
    ) -> Option<MetaValue> {
        let key = key.as_ref();
        let value = value.into();
        match self.entries.get_mut(&canonical(key)) {
            Some(entry) => Some(std::mem::replace(&mut entry.value, value)),
            None => {
                self.entries.insert(
                    canonical(key),
                    MetaEntry {
                        key: key.to_string(),
                        value,
                    },
                );
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.get(&canonical(key)).map(|e| &e.value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut MetaValue> {
        self.entries.get_mut(&canonical(key)).map(|e| &mut e.value)
    }

    /// Remove a key and its comment, preserving the order of the remaining
    /// entries.
    pub fn remove(&mut self, key: &str) -> Option<MetaValue> {
        let key = canonical(key);
        self.key_comments.shift_remove(&key);
        self.entries.shift_remove(&key).map(|e| e.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&canonical(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over keys (as first spelled) and values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.values().map(|e| (e.key.as_str(), &e.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|e| e.key.as_str())
    }

    pub fn key_comment(&self, key: &str) -> Option<&str> {
        self.key_comments.get(&canonical(key)).map(|s| s.as_str())
    }

    /// Associate a comment with a key. The key doesn't need to be present;
    /// comments for absent keys are simply never written out.
    pub fn set_key_comment<K: AsRef<str>, C: Into<String>>(&mut self, key: K, comment: C) {
        self.key_comments
            .insert(canonical(key.as_ref()), comment.into());
    }

    /// Iterate over upper-cased keys and their comments.
    pub fn key_comments(&self) -> impl Iterator<Item = (&str, &str)> {
        self.key_comments
            .iter()
            .map(|(k, c)| (k.as_str(), c.as_str()))
    }
}

impl<K: AsRef<str>, V: Into<MetaValue>> FromIterator<(K, V)> for MetaDict {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut meta = MetaDict::new();
        meta.extend(iter);
        meta
    }
}

impl<K: AsRef<str>, V: Into<MetaValue>> Extend<(K, V)> for MetaDict {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// The serialised form of a [`MetaDict`].
#[derive(Serialize, Deserialize)]
struct RawMetaDict {
    meta: IndexMap<String, MetaValue>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    key_comments: IndexMap<String, String>,
}

impl From<MetaDict> for RawMetaDict {
    fn from(meta: MetaDict) -> Self {
        RawMetaDict {
            meta: meta
                .entries
                .into_iter()
                .map(|(_, e)| (e.key, e.value))
                .collect(),
            key_comments: meta.key_comments,
        }
    }
}

impl From<RawMetaDict> for MetaDict {
    fn from(raw: RawMetaDict) -> Self {
        let mut meta: MetaDict = raw.meta.into_iter().collect();
        for (k, c) in raw.key_comments {
            meta.set_key_comment(k, c);
        }
        meta
    }
}
