//! Resolved per-locale string tables.

use std::collections::HashMap;
use std::fmt;
use std::sync::{
    PoisonError,
    RwLock,
};

use crate::event::Signal;
use crate::source::LocalizationSource;

/// A named locale with a resolved, read-optimized key→string table.
///
/// The table is filled from a [`LocalizationSource`] and is entirely
/// replaced, never merged, on every load. Lookup misses are not errors:
/// [`resolve`](Self::resolve) falls back to the key itself, so a missing
/// translation degrades to a visible key instead of a failure.
pub struct Localization {
    /// Locale name, unique within a [`Localizer`](crate::Localizer).
    name: String,
    /// Resolved key→string table.
    values: RwLock<HashMap<String, String>>,
    /// Emitted after a load replaced the table.
    on_loaded: Signal,
    /// Emitted after the table was written into a source.
    on_saved: Signal,
}

impl Localization {
    /// Create an empty locale named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: RwLock::new(HashMap::new()),
            on_loaded: Signal::new(),
            on_saved: Signal::new(),
        }
    }

    /// The locale name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve `key` to its translated string, or to `key` itself when no
    /// translation is stored. Never fails.
    #[must_use]
    pub fn resolve(&self, key: &str) -> String {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        values.get(key).cloned().unwrap_or_else(|| key.to_string())
    }

    /// Number of resolved entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the locale has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the entire table with the source's current entries, then
    /// notify `on_loaded` observers.
    ///
    /// The replacement is a single swap: an observer (or a concurrent
    /// reader) never sees a partially replaced table.
    pub fn load_from(&self, source: &dyn LocalizationSource) {
        let mut replacement = HashMap::new();
        for entry in source.entries() {
            let (key, value) = entry.into_parts();
            replacement.insert(key, value);
        }
        let entries = replacement.len();

        {
            let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
            *values = replacement;
        }

        tracing::debug!(locale = %self.name, entries, "loaded localization");
        self.on_loaded.emit(&());
    }

    /// Write every entry of the table into the source, then notify
    /// `on_saved` observers.
    ///
    /// Keys already present in the source but absent from this table are
    /// left untouched; saving never deletes.
    pub fn save_to(&self, source: &mut dyn LocalizationSource) {
        let snapshot: Vec<(String, String)> = {
            let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
            values.iter().map(|(key, value)| (key.clone(), value.clone())).collect()
        };

        for (key, value) in &snapshot {
            source.set(key, value);
        }

        tracing::debug!(locale = %self.name, entries = snapshot.len(), "saved localization");
        self.on_saved.emit(&());
    }

    /// Subscribe to load notifications.
    pub fn on_loaded(&self, observer: impl Fn() + Send + Sync + 'static) {
        self.on_loaded.subscribe(move |(): &()| observer());
    }

    /// Subscribe to save notifications.
    pub fn on_saved(&self, observer: impl Fn() + Send + Sync + 'static) {
        self.on_saved.subscribe(move |(): &()| observer());
    }
}

impl fmt::Debug for Localization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Localization")
            .field("name", &self.name)
            .field("entries", &self.len())
            .finish()
    }
}
