//! Lazily resolving localized-string tokens.

use std::fmt;
use std::sync::{
    Arc,
    Weak,
};

use crate::localizer::LocalizerShared;

/// A deferred-resolution handle bound to a key, not to a specific locale.
///
/// Minted by [`Localizer::localized`](crate::Localizer::localized). Each
/// [`resolve`](Self::resolve) call reads whichever locale is current at
/// that moment, so a locale switch is observed on the next call with no
/// coordination and no re-registration. Resolved values are never cached.
///
/// The token holds its registry weakly: it can be stored indefinitely (in
/// a UI widget, say) without keeping the registry alive, and it stays a
/// valid object after the registry is dropped, resolving to its own key.
#[derive(Debug, Clone)]
pub struct LocalizedString {
    /// The localization key; shared with every clone of this token.
    key: Arc<str>,
    /// Non-owning reference to the minting registry.
    localizer: Weak<LocalizerShared>,
}

impl LocalizedString {
    /// Mint a token for `key` backed by `localizer`.
    pub(crate) fn new(key: &str, localizer: Weak<LocalizerShared>) -> Self {
        Self { key: Arc::from(key), localizer }
    }

    /// The key this token resolves.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Resolve against the registry's current locale.
    ///
    /// Falls back to the key itself when the registry has been dropped,
    /// when no locale is selected, or when the locale has no entry for the
    /// key. Never fails.
    #[must_use]
    pub fn resolve(&self) -> String {
        self.localizer
            .upgrade()
            .and_then(|shared| shared.current())
            .map_or_else(|| self.key.to_string(), |localization| localization.resolve(&self.key))
    }
}

impl fmt::Display for LocalizedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.resolve())
    }
}
