use serde::{Serialize, Serializer};
use serde::ser::SerializeMap;
use std::path::PathBuf;

/// Separator between `key=value` pairs in a metadata string.
const PAIR_SEPARATOR: char = ';';
/// Separator between a key and its value.
const KEY_VALUE_SEPARATOR: char = '=';

/// An ordered set of metadata entries to write into a file.
///
/// Keys are unique. Inserting a key that already exists replaces its value
/// but keeps the entry where it was first inserted, so iteration order is the
/// order in which keys first appeared.
///
/// # Example
///
/// ```rust
/// use meta_tool::metadata::parse_metadata_string;
///
/// let meta = parse_metadata_string("/Title=My PDF;/Author=Max");
/// assert_eq!(meta.get("/Title"), Some("My PDF"));
/// assert_eq!(meta.get("/Author"), Some("Max"));
/// assert_eq!(meta.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataMap {
    entries: Vec<(String, String)>,
}

impl MetadataMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value. Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MetadataMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for MetadataMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// A key that was not written, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedKey {
    pub key: String,
    pub reason: String,
}

/// Result of writing (or clearing) metadata into a copy of a file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WriteResult {
    /// Where the modified copy was saved.
    pub output_path: PathBuf,
    /// `true` if the metadata block was cleared rather than updated.
    pub cleared: bool,
    /// Keys written, in the order they were applied.
    pub written: Vec<String>,
    /// Keys that were ignored, with the reason.
    pub skipped: Vec<SkippedKey>,
}

impl WriteResult {
    pub(crate) fn skip(&mut self, key: &str, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("Skipping {key:?}: {reason}");
        self.skipped.push(SkippedKey {
            key: key.to_string(),
            reason,
        });
    }
}

/// Parse a semicolon-separated `key=value` string into a [`MetadataMap`].
///
/// Pairs are split on the first `=`, so values may themselves contain `=`.
/// Keys and values are trimmed. Pairs with no `=` or with an empty key are
/// dropped. When a key repeats, the last value wins.
pub fn parse_metadata_string(input: &str) -> MetadataMap {
    let mut map = MetadataMap::new();

    for pair in input.split(PAIR_SEPARATOR) {
        let Some((key, value)) = pair.split_once(KEY_VALUE_SEPARATOR) else {
            if !pair.trim().is_empty() {
                log::debug!("Ignoring metadata pair without '=': {pair:?}");
            }
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            log::debug!("Ignoring metadata pair with empty key: {pair:?}");
            continue;
        }

        if let Some(previous) = map.insert(key, value.trim()) {
            log::debug!("Duplicate metadata key {key:?}, replacing {previous:?}");
        }
    }

    map
}
