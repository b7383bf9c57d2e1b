//! Locale directory, current-locale selection, and token minting.

use std::collections::HashMap;
use std::fmt;
use std::sync::{
    Arc,
    PoisonError,
    RwLock,
    Weak,
};

use thiserror::Error;

use crate::event::Signal;
use crate::localization::Localization;
use crate::localized_string::LocalizedString;

/// Errors produced by the locale registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocalizerError {
    /// Lookup of a locale name that is not registered.
    #[error("localization '{0}' is not registered")]
    NotFound(String),

    /// Registration conflicts with an already registered locale name.
    #[error("localization '{0}' is already registered")]
    DuplicateName(String),
}

/// Mutable registry state, guarded by one lock.
struct LocalizerState {
    /// Registered locales by name.
    localizations: HashMap<String, Arc<Localization>>,
    /// Name of the current selection; may name a locale that was never
    /// registered (selection is then unset but the name is remembered for
    /// change deduplication).
    current_name: Option<String>,
    /// The currently selected locale, resolved at selection time.
    current: Option<Arc<Localization>>,
    /// Minted tokens, one per key for the registry's lifetime.
    strings: HashMap<String, LocalizedString>,
}

/// State shared between a [`Localizer`] and the tokens it minted.
///
/// Tokens hold this behind a [`Weak`], so they never extend the registry's
/// lifetime.
pub(crate) struct LocalizerShared {
    /// Registry state.
    state: RwLock<LocalizerState>,
    /// Emitted when the current selection changes, carrying the new name.
    on_changed: Signal<Option<String>>,
}

impl LocalizerShared {
    /// The currently selected locale, if any.
    pub(crate) fn current(&self) -> Option<Arc<Localization>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.current.clone()
    }
}

/// Directory of named locales plus the "current locale" selection.
///
/// Cloning is cheap and clones share the same registry. Lookups through
/// [`resolve`](Self::resolve) and minted [`LocalizedString`] tokens always
/// read the selection current at call time, so switching locales is
/// observed by every holder on its next resolution with no re-registration.
///
/// # Examples
/// ```
/// # fn main() -> Result<(), lazy_i18n::LocalizerError> {
/// use std::sync::Arc;
///
/// use lazy_i18n::{
///     JsonFileSource,
///     Localization,
///     LocalizationSource,
///     Localizer,
/// };
///
/// let mut source = JsonFileSource::new("locales/en.json", ".");
/// source.set("greeting", "hello");
///
/// let english = Arc::new(Localization::new("en"));
/// english.load_from(&source);
///
/// let localizer = Localizer::new();
/// localizer.add(english)?;
/// localizer.set_current(Some("en"));
///
/// let greeting = localizer.localized("greeting");
/// assert_eq!(greeting.resolve(), "hello");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Localizer {
    /// Shared registry state; tokens hold it weakly.
    shared: Arc<LocalizerShared>,
}

impl Localizer {
    /// Create a registry with no locales and no selection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(LocalizerShared {
                state: RwLock::new(LocalizerState {
                    localizations: HashMap::new(),
                    current_name: None,
                    current: None,
                    strings: HashMap::new(),
                }),
                on_changed: Signal::new(),
            }),
        }
    }

    /// Register a locale under its own name.
    ///
    /// The registry is unchanged when registration fails.
    ///
    /// # Errors
    /// [`LocalizerError::DuplicateName`] when a locale with the same name
    /// is already registered.
    pub fn add(&self, localization: Arc<Localization>) -> Result<(), LocalizerError> {
        let mut state = self.shared.state.write().unwrap_or_else(PoisonError::into_inner);
        let name = localization.name();
        if state.localizations.contains_key(name) {
            return Err(LocalizerError::DuplicateName(name.to_string()));
        }
        state.localizations.insert(name.to_string(), localization);
        Ok(())
    }

    /// Unregister the locale named `name`. Removing an unknown name is a
    /// no-op. When the removed locale was current, the selection becomes
    /// unset (tokens then resolve to their keys); no change notification
    /// is emitted.
    pub fn remove(&self, name: &str) {
        let mut state = self.shared.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.localizations.remove(name).is_none() {
            return;
        }
        if state.current_name.as_deref() == Some(name) {
            state.current_name = None;
            state.current = None;
            tracing::debug!(locale = name, "removed the current localization, selection unset");
        }
    }

    /// Whether a locale named `name` is registered.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        let state = self.shared.state.read().unwrap_or_else(PoisonError::into_inner);
        state.localizations.contains_key(name)
    }

    /// The locale registered under `name`.
    ///
    /// # Errors
    /// [`LocalizerError::NotFound`] when no locale has that name.
    pub fn get(&self, name: &str) -> Result<Arc<Localization>, LocalizerError> {
        let state = self.shared.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .localizations
            .get(name)
            .cloned()
            .ok_or_else(|| LocalizerError::NotFound(name.to_string()))
    }

    /// Snapshot of every registered locale.
    #[must_use]
    pub fn localizations(&self) -> Vec<Arc<Localization>> {
        let state = self.shared.state.read().unwrap_or_else(PoisonError::into_inner);
        state.localizations.values().cloned().collect()
    }

    /// Select the current locale by name.
    ///
    /// Setting the already-current name is a no-op and emits nothing.
    /// An unknown name is not an error: it clears the selection (tokens
    /// fall back to their keys) while still emitting the change. Observers
    /// are notified after the selection is switched, with the new name.
    pub fn set_current(&self, name: Option<&str>) {
        {
            let mut state = self.shared.state.write().unwrap_or_else(PoisonError::into_inner);
            if state.current_name.as_deref() == name {
                return;
            }
            state.current_name = name.map(str::to_string);
            state.current = name.and_then(|n| state.localizations.get(n).cloned());
            tracing::debug!(locale = name, selected = state.current.is_some(), "locale changed");
        }
        // Emit outside the lock so observers can resolve through the
        // registry they are observing.
        self.shared.on_changed.emit(&name.map(str::to_string));
    }

    /// Name passed to the most recent effective [`set_current`](Self::set_current).
    #[must_use]
    pub fn current_name(&self) -> Option<String> {
        let state = self.shared.state.read().unwrap_or_else(PoisonError::into_inner);
        state.current_name.clone()
    }

    /// The currently selected locale, if any.
    #[must_use]
    pub fn current(&self) -> Option<Arc<Localization>> {
        self.shared.current()
    }

    /// Resolve `key` against the current locale, falling back to `key`
    /// itself when no locale is selected or the locale has no entry.
    #[must_use]
    pub fn resolve(&self, key: &str) -> String {
        self.shared
            .current()
            .map_or_else(|| key.to_string(), |localization| localization.resolve(key))
    }

    /// A lazily resolving token for `key`.
    ///
    /// Tokens are cached by key: asking twice for the same key returns the
    /// same token. A token re-resolves against whichever locale is current
    /// at each [`LocalizedString::resolve`] call and holds the registry
    /// weakly, so caching tokens indefinitely does not leak the registry.
    #[must_use]
    pub fn localized(&self, key: &str) -> LocalizedString {
        let mut state = self.shared.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = state.strings.get(key) {
            return existing.clone();
        }
        let token = LocalizedString::new(key, Arc::downgrade(&self.shared));
        state.strings.insert(key.to_string(), token.clone());
        token
    }

    /// Subscribe to selection changes. The observer receives the newly
    /// selected name, or `None` when the selection was cleared.
    pub fn on_changed(&self, observer: impl Fn(Option<&str>) + Send + Sync + 'static) {
        self.shared.on_changed.subscribe(move |name: &Option<String>| observer(name.as_deref()));
    }
}

impl Default for Localizer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Localizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Localizer")
            .field("localizations", &state.localizations.len())
            .field("current", &state.current_name)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{
        AtomicUsize,
        Ordering,
    };

    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    /// A locale with one resolved entry, for selection tests.
    fn locale_with(name: &str, key: &str, value: &str) -> Arc<Localization> {
        use crate::source::{
            JsonFileSource,
            LocalizationSource,
        };

        let mut source = JsonFileSource::new("unused.json", ".");
        source.set(key, value);
        let localization = Arc::new(Localization::new(name));
        localization.load_from(&source);
        localization
    }

    #[googletest::test]
    fn test_add_rejects_duplicate_names() {
        let localizer = Localizer::new();
        localizer.add(locale_with("en", "greeting", "hello")).unwrap();
        localizer.add(locale_with("fr", "greeting", "bonjour")).unwrap();

        let result = localizer.add(Arc::new(Localization::new("en")));

        expect_that!(&result, eq(&Err(LocalizerError::DuplicateName("en".to_string()))));
        // Registry unchanged after the failed call.
        expect_that!(localizer.localizations().len(), eq(2));
        expect_that!(localizer.get("en").unwrap().resolve("greeting"), eq("hello"));
    }

    #[googletest::test]
    fn test_get_unknown_name_is_not_found() {
        let localizer = Localizer::new();

        let result = localizer.get("missing");

        expect_that!(&result.unwrap_err(), eq(&LocalizerError::NotFound("missing".to_string())));
    }

    #[googletest::test]
    fn test_has_and_remove() {
        let localizer = Localizer::new();
        localizer.add(locale_with("en", "greeting", "hello")).unwrap();

        expect_that!(localizer.has("en"), eq(true));

        localizer.remove("en");
        localizer.remove("en");

        expect_that!(localizer.has("en"), eq(false));
    }

    #[googletest::test]
    fn test_set_current_switches_resolution() {
        let localizer = Localizer::new();
        localizer.add(locale_with("en", "greeting", "hello")).unwrap();
        localizer.add(locale_with("fr", "greeting", "bonjour")).unwrap();

        localizer.set_current(Some("en"));
        expect_that!(localizer.resolve("greeting"), eq("hello"));

        localizer.set_current(Some("fr"));
        expect_that!(localizer.resolve("greeting"), eq("bonjour"));
    }

    #[googletest::test]
    fn test_set_current_unknown_name_clears_selection() {
        let localizer = Localizer::new();
        localizer.add(locale_with("en", "greeting", "hello")).unwrap();
        localizer.set_current(Some("en"));

        localizer.set_current(Some("zz"));

        expect_that!(localizer.current(), none());
        expect_that!(localizer.current_name(), some(eq("zz")));
        expect_that!(localizer.resolve("greeting"), eq("greeting"));
    }

    #[rstest]
    fn test_set_current_same_name_notifies_once() {
        let localizer = Localizer::new();
        localizer.add(locale_with("en", "greeting", "hello")).unwrap();
        let notified = Arc::new(AtomicUsize::new(0));
        {
            let notified = Arc::clone(&notified);
            localizer.on_changed(move |_| {
                notified.fetch_add(1, Ordering::SeqCst);
            });
        }

        localizer.set_current(Some("en"));
        localizer.set_current(Some("en"));

        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    fn test_on_changed_carries_the_new_name() {
        let localizer = Localizer::new();
        localizer.add(locale_with("en", "greeting", "hello")).unwrap();
        let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            localizer.on_changed(move |name| {
                seen.lock().unwrap().push(name.map(str::to_string));
            });
        }

        localizer.set_current(Some("en"));
        localizer.set_current(None);

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![Some("en".to_string()), None]);
    }

    #[rstest]
    fn test_observer_can_resolve_through_the_registry() {
        let localizer = Localizer::new();
        localizer.add(locale_with("en", "greeting", "hello")).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            let inner = localizer.clone();
            localizer.on_changed(move |_| {
                seen.lock().unwrap().push(inner.resolve("greeting"));
            });
        }

        localizer.set_current(Some("en"));

        assert_eq!(*seen.lock().unwrap(), vec!["hello".to_string()]);
    }

    #[googletest::test]
    fn test_remove_current_locale_unsets_selection() {
        let localizer = Localizer::new();
        localizer.add(locale_with("en", "greeting", "hello")).unwrap();
        localizer.set_current(Some("en"));

        localizer.remove("en");

        expect_that!(localizer.current(), none());
        expect_that!(localizer.resolve("greeting"), eq("greeting"));
    }

    #[googletest::test]
    fn test_localized_returns_the_cached_token() {
        let localizer = Localizer::new();

        let first = localizer.localized("greeting");
        let second = localizer.localized("greeting");

        expect_that!(first.key(), eq(second.key()));
        // Same backing allocation, not merely equal text.
        expect_that!(
            std::ptr::eq(first.key().as_ptr(), second.key().as_ptr()),
            eq(true)
        );
    }

    #[googletest::test]
    fn test_clones_share_the_registry() {
        let localizer = Localizer::new();
        localizer.add(locale_with("en", "greeting", "hello")).unwrap();

        let clone = localizer.clone();
        clone.set_current(Some("en"));

        expect_that!(localizer.resolve("greeting"), eq("hello"));
    }
}
