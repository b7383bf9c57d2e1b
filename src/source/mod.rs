//! Localization sources: owned flat tables of raw translations.
//!
//! A source holds the persistable key→value table for one locale. The
//! resolved, read-optimized side lives in [`crate::localization`]; a
//! [`Localization`](crate::Localization) pulls from a source on load and
//! pushes into one on save, going only through the [`LocalizationSource`]
//! trait.

mod json_file;

use std::hash::{
    Hash,
    Hasher,
};
use std::path::PathBuf;
use std::{
    fmt,
    io,
};

pub use json_file::JsonFileSource;
use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

/// Errors produced by localization sources.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Lookup of a key the source does not contain.
    #[error("no translation entry for key '{0}'")]
    KeyNotFound(String),

    /// The backing file of an asynchronous load does not exist.
    #[error("localization file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The persisted document is not valid JSON.
    #[error("malformed localization document: {0}")]
    MalformedDocument(#[from] serde_json::Error),

    /// File system failure, surfaced unmodified. No retry is attempted;
    /// retry policy belongs to the caller.
    #[error("failed to access localization file: {0}")]
    Io(#[from] io::Error),
}

/// A raw translation entry: localization key plus translated value.
///
/// Identity is the key alone: two entries with equal keys compare equal
/// regardless of value, matching the key-unique storage of a source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLocalizedString {
    /// Localization key, separator-joined when the source is hierarchical.
    key: String,
    /// Translated value.
    value: String,
}

impl RawLocalizedString {
    /// Create an entry from a key and its translated value.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }

    /// The localization key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The translated value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Split the entry into its key and value.
    #[must_use]
    pub fn into_parts(self) -> (String, String) {
        (self.key, self.value)
    }
}

impl PartialEq for RawLocalizedString {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for RawLocalizedString {}

impl Hash for RawLocalizedString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for RawLocalizedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// A store of raw translations for one locale.
///
/// Mutation is intended for one logical owner at a time; concurrent
/// mutation must be serialized by the caller.
pub trait LocalizationSource {
    /// All entries, in table order.
    fn entries(&self) -> Box<dyn Iterator<Item = RawLocalizedString> + '_>;

    /// Look up the entry for `key`.
    ///
    /// # Errors
    /// [`SourceError::KeyNotFound`] when the key is absent.
    fn get(&self, key: &str) -> Result<RawLocalizedString, SourceError>;

    /// Insert or overwrite the entry for `key`.
    fn set(&mut self, key: &str, value: &str);

    /// Remove the entry for `key`. Removing an absent key is a no-op.
    fn remove(&mut self, key: &str);

    /// Remove every entry.
    fn clear(&mut self);
}
