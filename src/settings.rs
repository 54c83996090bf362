//! Site settings and their ZIP export / import.
//!
//! An export holds four JSON files: `manifest.json`, `settings.json`,
//! `languages.json` and `strings.json`. Importing one upserts settings and
//! UI strings and creates any language the site does not have yet as
//! inactive. Into an empty site the languages are restored as exported.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{Cursor, Read, Write};
use thiserror::Error;
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::i18n::{Language, NewLanguage, NewUiString, UiString};
use crate::models::Setting;
use crate::store::{ContentStore, StoreError};
use crate::validation::{validate_setting_key, ValidationError};

pub const ARCHIVE_FORMAT: &str = "atelier-cms-settings";
pub const ARCHIVE_VERSION: u32 = 1;

const MANIFEST_FILE: &str = "manifest.json";
const SETTINGS_FILE: &str = "settings.json";
const LANGUAGES_FILE: &str = "languages.json";
const STRINGS_FILE: &str = "strings.json";

/// Largest single file accepted from an uploaded archive.
const MAX_ENTRY_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("invalid archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("invalid archive: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid archive contents: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid archive: {0}")]
    Invalid(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format: String,
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub settings: usize,
    pub languages: usize,
    pub strings: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingEntry {
    pub key: String,
    pub value: serde_json::Value,
}

/// Everything an archive carries.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsBundle {
    pub manifest: Manifest,
    pub settings: Vec<SettingEntry>,
    pub languages: Vec<Language>,
    pub strings: Vec<UiString>,
}

impl SettingsBundle {
    pub fn new(settings: Vec<Setting>, languages: Vec<Language>, strings: Vec<UiString>) -> Self {
        let settings: Vec<SettingEntry> = settings
            .into_iter()
            .map(|s| SettingEntry {
                key: s.key,
                value: s.value,
            })
            .collect();

        Self {
            manifest: Manifest {
                format: ARCHIVE_FORMAT.to_string(),
                version: ARCHIVE_VERSION,
                exported_at: Utc::now(),
                settings: settings.len(),
                languages: languages.len(),
                strings: strings.len(),
            },
            settings,
            languages,
            strings,
        }
    }
}

/// What an import changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub settings: usize,
    pub languages_created: Vec<String>,
    pub strings: usize,
}

// ==================== Settings CRUD ====================

pub async fn put_setting(
    store: &dyn ContentStore,
    key: &str,
    value: serde_json::Value,
) -> Result<Setting, StoreError> {
    validate_setting_key(key)?;
    store.put_setting(key, value).await
}

// ==================== Archive ====================

fn write_json<T: Serialize>(
    writer: &mut ZipWriter<Cursor<Vec<u8>>>,
    name: &str,
    value: &T,
) -> Result<(), SettingsError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    writer.start_file(name, options)?;
    writer.write_all(&serde_json::to_vec_pretty(value)?)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<T, SettingsError> {
    let file = archive.by_name(name).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => {
            SettingsError::Invalid(format!("missing {}", name))
        }
        other => SettingsError::Archive(other),
    })?;
    if file.size() > MAX_ENTRY_BYTES {
        return Err(SettingsError::Invalid(format!("{} is too large", name)));
    }

    let mut contents = Vec::new();
    file.take(MAX_ENTRY_BYTES).read_to_end(&mut contents)?;
    Ok(serde_json::from_slice(&contents)?)
}

/// Serialize a bundle into ZIP bytes.
pub fn write_archive(bundle: &SettingsBundle) -> Result<Vec<u8>, SettingsError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    write_json(&mut writer, MANIFEST_FILE, &bundle.manifest)?;
    write_json(&mut writer, SETTINGS_FILE, &bundle.settings)?;
    write_json(&mut writer, LANGUAGES_FILE, &bundle.languages)?;
    write_json(&mut writer, STRINGS_FILE, &bundle.strings)?;
    Ok(writer.finish()?.into_inner())
}

/// Parse and check an uploaded archive.
pub fn read_archive(bytes: &[u8]) -> Result<SettingsBundle, SettingsError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let manifest: Manifest = read_json(&mut archive, MANIFEST_FILE)?;
    if manifest.format != ARCHIVE_FORMAT {
        return Err(SettingsError::Invalid(format!(
            "unexpected format '{}'",
            manifest.format
        )));
    }
    if manifest.version > ARCHIVE_VERSION {
        return Err(SettingsError::Invalid(format!(
            "archive version {} is newer than supported version {}",
            manifest.version, ARCHIVE_VERSION
        )));
    }

    Ok(SettingsBundle {
        settings: read_json(&mut archive, SETTINGS_FILE)?,
        languages: read_json(&mut archive, LANGUAGES_FILE)?,
        strings: read_json(&mut archive, STRINGS_FILE)?,
        manifest,
    })
}

/// Export settings, languages and UI strings as a ZIP archive.
pub async fn export_archive(store: &dyn ContentStore) -> Result<Vec<u8>, SettingsError> {
    let bundle = SettingsBundle::new(
        store.list_settings().await?,
        store.list_languages().await?,
        store.list_strings().await?,
    );
    let bytes = write_archive(&bundle)?;
    info!(
        "Exported {} settings, {} languages, {} strings ({} bytes)",
        bundle.manifest.settings,
        bundle.manifest.languages,
        bundle.manifest.strings,
        bytes.len()
    );
    Ok(bytes)
}

/// Language rows an import may create without breaking the single default.
///
/// An empty site takes its default from the archive, so the archive must name
/// exactly one. A populated site keeps its own, but the archive may still
/// name at most one.
fn check_archive_languages(languages: &[(NewLanguage, bool)], restore_flags: bool) -> Result<(), SettingsError> {
    let mut codes = HashSet::new();
    for (language, _) in languages {
        if !codes.insert(language.code.as_str()) {
            return Err(SettingsError::Invalid(format!(
                "language '{}' appears more than once",
                language.code
            )));
        }
    }

    let defaults: Vec<&str> = languages
        .iter()
        .filter(|(_, is_default)| *is_default)
        .map(|(language, _)| language.code.as_str())
        .collect();
    if defaults.len() > 1 {
        return Err(SettingsError::Invalid(format!(
            "more than one default language: {}",
            defaults.join(", ")
        )));
    }
    if restore_flags && !languages.is_empty() && defaults.is_empty() {
        return Err(SettingsError::Invalid(
            "no default language in the archive and none on this site".to_string(),
        ));
    }
    Ok(())
}

/// Apply an uploaded archive.
///
/// The archive is read and checked against the current languages before
/// anything is written; a rejected archive leaves the site untouched.
pub async fn import_archive(store: &dyn ContentStore, bytes: &[u8]) -> Result<ImportReport, SettingsError> {
    let bundle = read_archive(bytes)?;

    for entry in &bundle.settings {
        validate_setting_key(&entry.key).map_err(StoreError::from)?;
    }
    let languages = bundle
        .languages
        .iter()
        .map(|language| {
            let validated = NewLanguage {
                code: language.code.clone(),
                name: language.name.clone(),
                native_name: language.native_name.clone(),
                is_active: language.is_active,
                sort_order: language.sort_order,
            }
            .validated()?;
            Ok((validated, language.is_default))
        })
        .collect::<Result<Vec<_>, ValidationError>>()
        .map_err(StoreError::from)?;
    let strings = bundle
        .strings
        .iter()
        .map(|string| {
            NewUiString {
                key: string.key.clone(),
                description: string.description.clone(),
                values: string.values.clone(),
            }
            .validated()
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(StoreError::from)?;

    let existing: Vec<String> = store
        .list_languages()
        .await?
        .into_iter()
        .map(|language| language.code)
        .collect();
    // An empty site takes the archive's languages as they were exported.
    let restore_flags = existing.is_empty();
    check_archive_languages(&languages, restore_flags)?;

    let mut report = ImportReport::default();
    let mut known = existing;
    for (language, is_default) in languages {
        if known.contains(&language.code) {
            continue;
        }
        let created = store
            .create_language(Language {
                code: language.code,
                name: language.name,
                native_name: language.native_name,
                is_default: restore_flags && is_default,
                is_active: restore_flags && (language.is_active || is_default),
                sort_order: language.sort_order,
            })
            .await?;
        known.push(created.code.clone());
        report.languages_created.push(created.code);
    }

    for entry in bundle.settings {
        store.put_setting(&entry.key, entry.value).await?;
        report.settings += 1;
    }

    for string in strings {
        // Values in languages neither on the site nor in the archive are dropped.
        let values = string
            .values
            .into_iter()
            .filter(|(code, _)| known.contains(code))
            .collect();
        store
            .upsert_string(UiString {
                key: string.key,
                description: string.description,
                values,
            })
            .await?;
        report.strings += 1;
    }

    info!(
        "Imported {} settings, {} strings, {} new languages",
        report.settings,
        report.strings,
        report.languages_created.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn language(code: &str, is_default: bool) -> Language {
        Language {
            code: code.to_string(),
            name: code.to_uppercase(),
            native_name: None,
            is_default,
            is_active: true,
            sort_order: 0,
        }
    }

    fn string(key: &str, values: &[(&str, &str)]) -> UiString {
        UiString {
            key: key.to_string(),
            description: None,
            values: values
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn bundle() -> SettingsBundle {
        let setting = Setting {
            key: "site.title".to_string(),
            value: json!("Atelier Hout"),
            updated_at: Utc::now(),
        };
        SettingsBundle::new(
            vec![setting],
            vec![language("nl", true), language("de", false)],
            vec![string("nav.home", &[("nl", "Home"), ("de", "Startseite")])],
        )
    }

    #[test]
    fn test_archive_contains_four_files() {
        let bytes = write_archive(&bundle()).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(
            names,
            vec!["languages.json", "manifest.json", "settings.json", "strings.json"]
        );
    }

    #[test]
    fn test_read_archive_back() {
        let original = bundle();
        let bytes = write_archive(&original).unwrap();
        assert_eq!(read_archive(&bytes).unwrap(), original);
    }

    #[test]
    fn test_read_rejects_garbage() {
        assert!(matches!(
            read_archive(b"not a zip"),
            Err(SettingsError::Archive(_))
        ));
    }

    #[test]
    fn test_read_rejects_foreign_format() {
        let mut foreign = bundle();
        foreign.manifest.format = "something-else".to_string();
        let bytes = write_archive(&foreign).unwrap();
        assert!(matches!(read_archive(&bytes), Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn test_read_rejects_missing_file() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        write_json(&mut writer, MANIFEST_FILE, &bundle().manifest).unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        assert!(matches!(read_archive(&bytes), Err(SettingsError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_put_setting_validates_key() {
        let store = MemoryStore::new();
        assert!(put_setting(&store, "Site Title", json!("x")).await.is_err());
        let setting = put_setting(&store, "site.title", json!("x")).await.unwrap();
        assert_eq!(setting.key, "site.title");
    }

    #[tokio::test]
    async fn test_import_creates_missing_languages_inactive() {
        let store = MemoryStore::new();
        store.create_language(language("nl", true)).await.unwrap();

        let bytes = write_archive(&bundle()).unwrap();
        let report = import_archive(&store, &bytes).await.unwrap();

        assert_eq!(report.settings, 1);
        assert_eq!(report.strings, 1);
        assert_eq!(report.languages_created, vec!["de"]);

        let languages = store.list_languages().await.unwrap();
        let de = languages.iter().find(|l| l.code == "de").unwrap();
        assert!(!de.is_active);
        assert!(!de.is_default);
        let nl = languages.iter().find(|l| l.code == "nl").unwrap();
        assert!(nl.is_default);

        let strings = store.list_strings().await.unwrap();
        assert_eq!(strings[0].values.get("de").map(String::as_str), Some("Startseite"));
    }

    #[tokio::test]
    async fn test_import_into_empty_site_restores_default() {
        let store = MemoryStore::new();
        let bytes = write_archive(&bundle()).unwrap();
        import_archive(&store, &bytes).await.unwrap();

        let languages = store.list_languages().await.unwrap();
        assert_eq!(languages.len(), 2);
        let nl = languages.iter().find(|l| l.code == "nl").unwrap();
        assert!(nl.is_default && nl.is_active);
    }

    #[tokio::test]
    async fn test_import_upserts_existing() {
        let store = MemoryStore::new();
        store.create_language(language("nl", true)).await.unwrap();
        store.put_setting("site.title", json!("Oud")).await.unwrap();
        store
            .create_string(string("nav.home", &[("nl", "Start")]))
            .await
            .unwrap();

        let bytes = write_archive(&bundle()).unwrap();
        import_archive(&store, &bytes).await.unwrap();
        import_archive(&store, &bytes).await.unwrap();

        let settings = store.list_settings().await.unwrap();
        assert_eq!(settings.len(), 1);
        assert_eq!(settings[0].value, json!("Atelier Hout"));

        let strings = store.list_strings().await.unwrap();
        assert_eq!(strings.len(), 1);
        assert_eq!(strings[0].values["nl"], "Home");
    }

    #[tokio::test]
    async fn test_import_validates_before_writing() {
        let store = MemoryStore::new();
        store.create_language(language("nl", true)).await.unwrap();

        let mut bad = bundle();
        bad.settings.push(SettingEntry {
            key: "Not Valid".to_string(),
            value: json!(1),
        });
        let bytes = write_archive(&bad).unwrap();

        assert!(import_archive(&store, &bytes).await.is_err());
        assert!(store.list_settings().await.unwrap().is_empty());
        assert_eq!(store.list_languages().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_import_rejects_two_defaults() {
        let store = MemoryStore::new();
        let mut bad = bundle();
        bad.languages = vec![language("nl", true), language("fr", true)];
        let bytes = write_archive(&bad).unwrap();

        let Err(SettingsError::Invalid(message)) = import_archive(&store, &bytes).await else {
            panic!("archive with two default languages was accepted");
        };
        assert!(message.contains("nl, fr"));
        assert!(store.list_languages().await.unwrap().is_empty());
        assert!(store.list_settings().await.unwrap().is_empty());
        assert!(store.list_strings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_into_empty_site_requires_default() {
        let store = MemoryStore::new();
        let mut bad = bundle();
        bad.languages = vec![language("nl", false), language("de", false)];
        let bytes = write_archive(&bad).unwrap();

        assert!(matches!(
            import_archive(&store, &bytes).await,
            Err(SettingsError::Invalid(_))
        ));
        assert!(store.list_languages().await.unwrap().is_empty());
        assert!(store.list_settings().await.unwrap().is_empty());

        // A populated site keeps its own default, so the same archive applies
        store.create_language(language("nl", true)).await.unwrap();
        let report = import_archive(&store, &bytes).await.unwrap();
        assert_eq!(report.languages_created, vec!["de"]);
    }

    #[tokio::test]
    async fn test_import_rejects_repeated_language() {
        let store = MemoryStore::new();
        let mut bad = bundle();
        bad.languages = vec![language("nl", true), language("NL", false)];
        let bytes = write_archive(&bad).unwrap();

        assert!(matches!(
            import_archive(&store, &bytes).await,
            Err(SettingsError::Invalid(_))
        ));
        assert!(store.list_languages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_from_store() {
        let store = MemoryStore::new();
        store.create_language(language("nl", true)).await.unwrap();
        store.put_setting("contact.email", json!("info@example.com")).await.unwrap();

        let bytes = export_archive(&store).await.unwrap();
        let bundle = read_archive(&bytes).unwrap();
        assert_eq!(bundle.manifest.settings, 1);
        assert_eq!(bundle.manifest.languages, 1);
        assert_eq!(bundle.settings[0].key, "contact.email");
    }
}
