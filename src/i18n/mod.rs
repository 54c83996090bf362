//! Internationalization (i18n): languages, fallback resolution and UI strings.
//!
//! # Architecture
//!
//! - `language`: Language records and their create/update payloads
//! - `registry`: Validated snapshot of languages, default lookup and negotiation
//! - `resolver`: The fallback chain (requested → default → raw key / not found)
//! - `strings`: UI string catalog built on the resolver
//! - `validator`: Translation completeness and the publish gate
//! - `metrics`: Counters for resolution outcomes
//!
//! # Example
//!
//! ```rust,ignore
//! use atelier_cms::i18n::{FallbackResolver, LanguageRegistry};
//!
//! let registry = LanguageRegistry::new(store.list_languages().await?)?;
//! let language = registry.negotiate(query.lang.as_deref(), accept_language);
//! let resolver = FallbackResolver::new(&language.code, registry.default_code());
//! let translation = resolver.resolve(&page.translations);
//! ```

mod language;
mod metrics;
mod registry;
mod resolver;
mod strings;
mod validator;

pub use language::{primary_subtag, Language, LanguageUpdate, NewLanguage};
pub use metrics::{MetricsReport, ResolutionMetrics};
pub use registry::{parse_accept_language, LanguageRegistry};
pub use resolver::{Blank, FallbackResolver, Localized, ResolutionSource, Resolved, ResolvedString};
pub use strings::{NewUiString, StringCatalog, UiString};
pub use validator::{TranslationValidator, ValidationReport};
