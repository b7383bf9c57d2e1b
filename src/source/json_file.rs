//! JSON-file-backed localization source.

use std::io;
use std::path::{
    Path,
    PathBuf,
};

use serde_json::Value;

use super::{
    LocalizationSource,
    RawLocalizedString,
    SourceError,
};
use crate::codec::{
    self,
    FlatTable,
};

/// A localization source persisted as a nested JSON document.
///
/// Hierarchical keys are encoded with a caller-chosen separator: the
/// document `{"common": {"hello": "Hello"}}` loads as the flat entry
/// `"common.hello" -> "Hello"` when the separator is `"."`. Saving rebuilds
/// the nested document from the table via [`codec::unflatten`], so regions
/// that were arrays on disk come back as objects keyed by stringified
/// indices after a load→save round trip.
///
/// Writes are not atomic: a crash mid-write can leave a corrupt file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    /// Path of the backing document.
    file_path: PathBuf,
    /// Separator joining nested field names into flat keys. Must not occur
    /// inside any field name.
    separator: String,
    /// Pretty-print the document on save.
    pretty: bool,
    /// Current in-memory table, in document order after a load.
    entries: FlatTable,
}

impl JsonFileSource {
    /// Create a source backed by `file_path`, with an empty table.
    ///
    /// Nothing is read until [`load`](Self::load) or
    /// [`load_async`](Self::load_async) is called. Saved documents are
    /// pretty-printed unless [`compact`](Self::compact) is applied.
    #[must_use]
    pub fn new(file_path: impl Into<PathBuf>, separator: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            separator: separator.into(),
            pretty: true,
            entries: FlatTable::new(),
        }
    }

    /// Serialize without indentation on save.
    #[must_use]
    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    /// Path of the backing document.
    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// The configured key separator.
    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Read the backing file and replace the table with its flattened
    /// entries.
    ///
    /// A missing file is treated as an empty locale: the table is cleared
    /// and the call succeeds. This deliberately differs from
    /// [`load_async`](Self::load_async), which fails with
    /// [`SourceError::SourceNotFound`] on a missing file.
    ///
    /// # Errors
    /// - [`SourceError::MalformedDocument`] when the file is not valid JSON
    /// - [`SourceError::Io`] on read failure
    pub fn load(&mut self) -> Result<(), SourceError> {
        if !self.file_path.exists() {
            tracing::debug!(
                path = %self.file_path.display(),
                "localization file missing, treating as empty locale"
            );
            self.entries.clear();
            return Ok(());
        }

        let text = std::fs::read_to_string(&self.file_path)?;
        self.replace_from_text(&text)
    }

    /// Asynchronous variant of [`load`](Self::load).
    ///
    /// Unlike the synchronous variant, a missing file fails with
    /// [`SourceError::SourceNotFound`]. Dropping the returned future before
    /// the read completes leaves the table unchanged.
    ///
    /// # Errors
    /// - [`SourceError::SourceNotFound`] when the file does not exist
    /// - [`SourceError::MalformedDocument`] when the file is not valid JSON
    /// - [`SourceError::Io`] on read failure
    pub async fn load_async(&mut self) -> Result<(), SourceError> {
        let text = match tokio::fs::read_to_string(&self.file_path).await {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(SourceError::SourceNotFound(self.file_path.clone()));
            }
            Err(error) => return Err(error.into()),
        };
        self.replace_from_text(&text)
    }

    /// Serialize the table as a nested document and write it to the
    /// backing file, creating missing parent directories first.
    ///
    /// # Errors
    /// [`SourceError::Io`] on directory creation or write failure; write
    /// errors are surfaced unmodified.
    pub fn save(&self) -> Result<(), SourceError> {
        let text = self.render()?;
        if let Some(directory) = parent_directory(&self.file_path) {
            std::fs::create_dir_all(directory)?;
        }
        std::fs::write(&self.file_path, text)?;
        tracing::debug!(path = %self.file_path.display(), "saved localization file");
        Ok(())
    }

    /// Asynchronous variant of [`save`](Self::save).
    ///
    /// # Errors
    /// [`SourceError::Io`] on directory creation or write failure.
    pub async fn save_async(&self) -> Result<(), SourceError> {
        let text = self.render()?;
        if let Some(directory) = parent_directory(&self.file_path) {
            tokio::fs::create_dir_all(directory).await?;
        }
        tokio::fs::write(&self.file_path, text).await?;
        tracing::debug!(path = %self.file_path.display(), "saved localization file");
        Ok(())
    }

    /// Parse `text` and replace the whole table with its flattened entries.
    fn replace_from_text(&mut self, text: &str) -> Result<(), SourceError> {
        let document: Value = serde_json::from_str(text)?;
        self.entries = codec::flatten(&document, &self.separator);
        tracing::debug!(
            path = %self.file_path.display(),
            entries = self.entries.len(),
            "loaded localization file"
        );
        Ok(())
    }

    /// Rebuild the nested document and serialize it.
    fn render(&self) -> Result<String, SourceError> {
        let document = codec::unflatten(&self.entries, &self.separator);
        let text = if self.pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };
        Ok(text)
    }
}

/// The directory that must exist before the file can be written, if any.
fn parent_directory(path: &Path) -> Option<&Path> {
    path.parent().filter(|directory| !directory.as_os_str().is_empty())
}

impl LocalizationSource for JsonFileSource {
    fn entries(&self) -> Box<dyn Iterator<Item = RawLocalizedString> + '_> {
        Box::new(
            self.entries
                .iter()
                .map(|(key, value)| RawLocalizedString::new(key.clone(), value.clone())),
        )
    }

    fn get(&self, key: &str) -> Result<RawLocalizedString, SourceError> {
        self.entries
            .get(key)
            .map(|value| RawLocalizedString::new(key, value.clone()))
            .ok_or_else(|| SourceError::KeyNotFound(key.to_string()))
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.shift_remove(key);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}
