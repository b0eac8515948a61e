//! Learned mapping from cleaned venue phrases to abbreviations.
//!
//! The cache is built once from a serialized JSON object and only grows
//! afterwards: successful extractions insert, nothing is evicted. It is never
//! written back on its own; callers that want to keep learned entries call
//! [`AbbreviationCache::write_json`].

use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{NormalizeError, Result};

/// Entries present in every cache, applied after the supplied mapping.
pub const SEEDED_ABBREVIATIONS: &[(&str, &str)] =
    &[("meeting of the association for computational linguistics", "acl")];

/// Phrase → abbreviation map, safe to share across threads.
#[derive(Debug)]
pub struct AbbreviationCache {
    entries: DashMap<String, String>,
}

impl AbbreviationCache {
    /// A cache holding only the seeded entries.
    pub fn new() -> Self {
        Self::from_mapping(std::iter::empty())
    }

    pub fn from_mapping<I>(mapping: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let entries: DashMap<String, String> = mapping.into_iter().collect();
        for (phrase, abbreviation) in SEEDED_ABBREVIATIONS {
            entries.insert((*phrase).to_string(), (*abbreviation).to_string());
        }
        Self { entries }
    }

    /// Read a JSON object of `phrase -> abbreviation`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mapping: HashMap<String, String> = serde_json::from_reader(reader)?;
        Ok(Self::from_mapping(mapping))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| NormalizeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cache = Self::from_reader(BufReader::new(file))?;
        tracing::debug!(path = %path.display(), entries = cache.len(), "loaded abbreviation cache");
        Ok(cache)
    }

    pub fn get(&self, phrase: &str) -> Option<String> {
        self.entries.get(phrase).map(|v| v.value().clone())
    }

    pub fn contains(&self, phrase: &str) -> bool {
        self.entries.contains_key(phrase)
    }

    /// Insert unless the phrase is already cached; returns the value that
    /// ends up in the cache (the earlier one wins).
    pub fn insert_if_absent(&self, phrase: String, abbreviation: String) -> String {
        self.entries.entry(phrase).or_insert(abbreviation).value().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the current entries, ordered by phrase.
    pub fn to_sorted_map(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// Write the current entries as a JSON object with sorted keys.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let io_err = |source| NormalizeError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.to_sorted_map())?;
        writer.flush().map_err(io_err)?;
        Ok(())
    }
}

impl Default for AbbreviationCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_entry_is_always_present() {
        let cache = AbbreviationCache::new();
        assert_eq!(
            cache
                .get("meeting of the association for computational linguistics")
                .as_deref(),
            Some("acl")
        );
    }

    #[test]
    fn seeded_entry_overrides_supplied_mapping() {
        let cache = AbbreviationCache::from_mapping([(
            "meeting of the association for computational linguistics".to_string(),
            "macl".to_string(),
        )]);
        assert_eq!(
            cache
                .get("meeting of the association for computational linguistics")
                .as_deref(),
            Some("acl")
        );
    }

    #[test]
    fn first_insert_wins() {
        let cache = AbbreviationCache::new();
        assert_eq!(cache.insert_if_absent("a b c".into(), "abc".into()), "abc");
        assert_eq!(cache.insert_if_absent("a b c".into(), "xyz".into()), "abc");
        assert_eq!(cache.get("a b c").as_deref(), Some("abc"));
    }

    #[test]
    fn reader_rejects_non_string_values() {
        let err = AbbreviationCache::from_reader(r#"{"a": 1}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, NormalizeError::Json(_)));
    }

    #[test]
    fn write_then_read_keeps_learned_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abbrev.json");

        let cache = AbbreviationCache::new();
        cache.insert_if_absent("very large data bases".into(), "vldb".into());
        cache.write_json(&path).unwrap();

        let restored = AbbreviationCache::from_path(&path).unwrap();
        assert_eq!(restored.get("very large data bases").as_deref(), Some("vldb"));
        assert_eq!(restored.len(), cache.len());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AbbreviationCache::from_path(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, NormalizeError::Io { .. }));
    }
}
