//! lazy-i18n
//!
//! String localization with lazily resolved handles and JSON-backed locale
//! storage. Locales are flat key→string tables loaded from nested JSON
//! documents (hierarchy encoded with a configurable key separator); the
//! [`Localizer`] registry tracks the current locale and mints
//! [`LocalizedString`] tokens that re-resolve on every call.

pub mod codec;
pub mod event;
pub mod localization;
pub mod localized_string;
pub mod localizer;
pub mod source;

pub use localization::Localization;
pub use localized_string::LocalizedString;
pub use localizer::{
    Localizer,
    LocalizerError,
};
pub use source::{
    JsonFileSource,
    LocalizationSource,
    RawLocalizedString,
    SourceError,
};
