//! Write side: the rules every admin change goes through before it reaches
//! the store.
//!
//! - slugs, keys and language codes are validated and normalized
//! - translations must be in a known language, one row per language
//! - publishing requires a default-language translation
//! - the default-language translation of a published entity stays put
//! - the default language can be neither deleted nor deactivated

use std::collections::HashSet;
use tracing::info;

use crate::i18n::{
    Language, LanguageRegistry, LanguageUpdate, Localized, NewLanguage, NewUiString,
    StringCatalog, TranslationValidator, UiString, ValidationReport,
};
use crate::models::{
    checked_slug, ContentPage, NewPage, NewProject, PageTranslationInput, PageUpdate, Project,
    ProjectTranslationInput, ProjectUpdate,
};
use crate::pagebuilder::ComponentDescriptor;
use crate::store::{ContentStore, StoreError};
use crate::validation::{normalize_language_code, require_text, ValidationError};

/// Current languages as a registry.
///
/// Fails when the stored languages do not have exactly one active default.
pub async fn load_registry(store: &dyn ContentStore) -> Result<LanguageRegistry, StoreError> {
    let languages = store.list_languages().await?;
    LanguageRegistry::new(languages).map_err(|e| StoreError::Inconsistent(e.0))
}

/// All UI strings, resolved against the current default language.
pub async fn load_catalog(store: &dyn ContentStore) -> Result<(LanguageRegistry, StringCatalog), StoreError> {
    let registry = load_registry(store).await?;
    let strings = store.list_strings().await?;
    let catalog = StringCatalog::new(strings, registry.default_code());
    Ok((registry, catalog))
}

fn known_language(registry: &LanguageRegistry, code: &str) -> Result<String, ValidationError> {
    let code = normalize_language_code(code)?;
    if registry.get(&code).is_none() {
        return Err(ValidationError::new(format!("unknown language '{}'", code)));
    }
    Ok(code)
}

fn check_translations<T: Localized>(label: &str, rows: &[T], registry: &LanguageRegistry) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for row in rows {
        let code = row.language_code();
        if registry.get(code).is_none() {
            return Err(ValidationError::new(format!("unknown language '{}'", code)));
        }
        if !seen.insert(code) {
            return Err(ValidationError::new(format!(
                "{} has more than one '{}' translation",
                label, code
            )));
        }
    }
    Ok(())
}

fn check_publishable<T: Localized>(label: &str, rows: &[T], registry: &LanguageRegistry) -> Result<(), ValidationError> {
    if TranslationValidator::has_default_translation(rows, registry) {
        return Ok(());
    }
    Err(ValidationError::new(format!(
        "cannot publish {}: it has no translation in the default language '{}'",
        label,
        registry.default_code()
    )))
}

fn check_components(components: &[ComponentDescriptor]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for component in components {
        require_text("component id", &component.id)?;
        require_text("component type", &component.kind)?;
        if !seen.insert(component.id.as_str()) {
            return Err(ValidationError::new(format!(
                "duplicate component id '{}'",
                component.id
            )));
        }
    }
    Ok(())
}

// ==================== Languages ====================

/// Add a language. The first language ever created becomes the default.
pub async fn create_language(store: &dyn ContentStore, input: NewLanguage) -> Result<Language, StoreError> {
    let input = input.validated()?;
    let is_first = store.list_languages().await?.is_empty();

    let language = Language {
        code: input.code,
        name: input.name,
        native_name: input.native_name,
        is_default: is_first,
        is_active: input.is_active || is_first,
        sort_order: input.sort_order,
    };
    let created = store.create_language(language).await?;
    info!("Added language {} ({})", created.code, created.name);
    Ok(created)
}

pub async fn update_language(
    store: &dyn ContentStore,
    code: &str,
    update: LanguageUpdate,
) -> Result<Language, StoreError> {
    let code = normalize_language_code(code)?;
    let mut language = store
        .list_languages()
        .await?
        .into_iter()
        .find(|language| language.code == code)
        .ok_or_else(|| StoreError::not_found(format!("language '{}'", code)))?;

    if let Some(name) = &update.name {
        require_text("name", name)?;
    }
    update.apply_to(&mut language);

    if language.is_default && !language.is_active {
        return Err(StoreError::invalid("the default language cannot be deactivated"));
    }

    store.update_language(language).await
}

/// Labels of published pages and projects with no translation in `code`.
async fn published_without_translation(
    store: &dyn ContentStore,
    code: &str,
) -> Result<Vec<String>, StoreError> {
    fn lacks<T: Localized>(rows: &[T], code: &str) -> bool {
        !rows.iter().any(|row| row.language_code() == code)
    }

    let pages = store.list_pages().await?;
    let projects = store.list_projects().await?;

    let mut stranded: Vec<String> = pages
        .iter()
        .filter(|page| page.published && lacks(&page.translations, code))
        .map(|page| format!("page '{}'", page.slug))
        .collect();
    stranded.extend(
        projects
            .iter()
            .filter(|project| project.published && lacks(&project.translations, code))
            .map(|project| format!("project '{}'", project.slug)),
    );
    Ok(stranded)
}

/// Make `code` the default language. It must be active and every published
/// page and project must already have a translation in it.
pub async fn set_default_language(store: &dyn ContentStore, code: &str) -> Result<Language, StoreError> {
    let registry = load_registry(store).await?;
    let code = normalize_language_code(code)?;
    let language = registry
        .get(&code)
        .ok_or_else(|| StoreError::not_found(format!("language '{}'", code)))?;

    if !language.is_active {
        return Err(StoreError::invalid(format!(
            "language '{}' is inactive and cannot be the default",
            code
        )));
    }

    let stranded = published_without_translation(store, &code).await?;
    if !stranded.is_empty() {
        return Err(StoreError::invalid(format!(
            "cannot make '{}' the default: published content has no '{}' translation: {}",
            code,
            code,
            stranded.join(", ")
        )));
    }

    let language = store.set_default_language(&code).await?;
    info!("Default language is now {}", language.code);
    Ok(language)
}

/// Delete a language and every translation in it.
pub async fn delete_language(store: &dyn ContentStore, code: &str) -> Result<(), StoreError> {
    let code = normalize_language_code(code)?;
    let languages = store.list_languages().await?;
    let language = languages
        .iter()
        .find(|language| language.code == code)
        .ok_or_else(|| StoreError::not_found(format!("language '{}'", code)))?;

    if language.is_default {
        return Err(StoreError::invalid("the default language cannot be deleted"));
    }

    store.delete_language(&code).await?;
    info!("Deleted language {} and its translations", code);
    Ok(())
}

/// Create the configured languages on an empty store. Returns how many were
/// created; an already populated store is left alone.
pub async fn seed_languages(store: &dyn ContentStore, seeds: &[NewLanguage]) -> Result<usize, StoreError> {
    if !store.list_languages().await?.is_empty() {
        return Ok(0);
    }

    for (index, seed) in seeds.iter().enumerate() {
        let mut seed = seed.clone();
        seed.sort_order = index as i32;
        create_language(store, seed).await?;
    }
    Ok(seeds.len())
}

// ==================== UI Strings ====================

pub async fn create_string(store: &dyn ContentStore, input: NewUiString) -> Result<UiString, StoreError> {
    let input = input.validated()?;
    let registry = load_registry(store).await?;
    for code in input.values.keys() {
        known_language(&registry, code)?;
    }

    store
        .create_string(UiString {
            key: input.key,
            description: input.description,
            values: input.values,
        })
        .await
}

pub async fn set_string_value(
    store: &dyn ContentStore,
    key: &str,
    language_code: &str,
    value: &str,
) -> Result<UiString, StoreError> {
    let registry = load_registry(store).await?;
    let code = known_language(&registry, language_code)?;
    store.set_string_value(key, &code, value).await
}

/// Keys with no value in `language_code`.
pub async fn missing_strings(store: &dyn ContentStore, language_code: &str) -> Result<Vec<String>, StoreError> {
    let (registry, catalog) = load_catalog(store).await?;
    let code = known_language(&registry, language_code)?;
    Ok(catalog.missing(&code).into_iter().map(str::to_string).collect())
}

// ==================== Pages ====================

async fn require_page(store: &dyn ContentStore, id: i64) -> Result<ContentPage, StoreError> {
    store
        .get_page(id)
        .await?
        .ok_or_else(|| StoreError::not_found(format!("page {}", id)))
}

pub async fn create_page(store: &dyn ContentStore, mut input: NewPage) -> Result<ContentPage, StoreError> {
    let registry = load_registry(store).await?;
    input.slug = checked_slug(&input.slug)?;
    check_components(&input.components)?;

    for translation in &mut input.translations {
        translation.language_code = normalize_language_code(&translation.language_code)?;
        require_text("title", &translation.title)?;
    }
    let label = format!("page '{}'", input.slug);
    check_translations(&label, &input.translations, &registry)?;
    if input.published {
        check_publishable(&label, &input.translations, &registry)?;
    }

    let page = store.create_page(input).await?;
    info!("Created page {} ({})", page.id, page.slug);
    Ok(page)
}

pub async fn update_page(store: &dyn ContentStore, id: i64, mut update: PageUpdate) -> Result<ContentPage, StoreError> {
    let registry = load_registry(store).await?;
    let page = require_page(store, id).await?;

    if let Some(slug) = &update.slug {
        update.slug = Some(checked_slug(slug)?);
    }
    if let Some(components) = &update.components {
        check_components(components)?;
    }
    if update.published == Some(true) {
        check_publishable(&format!("page '{}'", page.slug), &page.translations, &registry)?;
    }

    store.update_page(id, update).await
}

pub async fn put_page_translation(
    store: &dyn ContentStore,
    id: i64,
    language_code: &str,
    input: PageTranslationInput,
) -> Result<ContentPage, StoreError> {
    let registry = load_registry(store).await?;
    let code = known_language(&registry, language_code)?;
    require_page(store, id).await?;

    let translation = input.into_translation(&code)?;
    store.put_page_translation(id, translation).await
}

pub async fn delete_page_translation(
    store: &dyn ContentStore,
    id: i64,
    language_code: &str,
) -> Result<ContentPage, StoreError> {
    let registry = load_registry(store).await?;
    let code = normalize_language_code(language_code)?;
    let page = require_page(store, id).await?;

    if page.published && code == registry.default_code() {
        return Err(StoreError::invalid(format!(
            "cannot remove the default-language translation of published page '{}'",
            page.slug
        )));
    }

    store.delete_page_translation(id, &code).await
}

pub async fn page_completeness(store: &dyn ContentStore, id: i64) -> Result<ValidationReport, StoreError> {
    let registry = load_registry(store).await?;
    let page = require_page(store, id).await?;
    Ok(TranslationValidator::validate(
        &format!("page '{}'", page.slug),
        &page.translations,
        &registry,
    ))
}

// ==================== Projects ====================

async fn require_project(store: &dyn ContentStore, id: i64) -> Result<Project, StoreError> {
    store
        .get_project(id)
        .await?
        .ok_or_else(|| StoreError::not_found(format!("project {}", id)))
}

pub async fn create_project(store: &dyn ContentStore, mut input: NewProject) -> Result<Project, StoreError> {
    let registry = load_registry(store).await?;
    input.slug = checked_slug(&input.slug)?;
    input.category = input
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    for image in &input.images {
        require_text("image url", &image.url)?;
    }

    for translation in &mut input.translations {
        translation.language_code = normalize_language_code(&translation.language_code)?;
        require_text("title", &translation.title)?;
    }
    let label = format!("project '{}'", input.slug);
    check_translations(&label, &input.translations, &registry)?;
    if input.published {
        check_publishable(&label, &input.translations, &registry)?;
    }

    let project = store.create_project(input).await?;
    info!("Created project {} ({})", project.id, project.slug);
    Ok(project)
}

pub async fn update_project(
    store: &dyn ContentStore,
    id: i64,
    mut update: ProjectUpdate,
) -> Result<Project, StoreError> {
    let registry = load_registry(store).await?;
    let project = require_project(store, id).await?;

    if let Some(slug) = &update.slug {
        update.slug = Some(checked_slug(slug)?);
    }
    if let Some(category) = &update.category {
        update.category = Some(category.trim().to_string());
    }
    if let Some(images) = &update.images {
        for image in images {
            require_text("image url", &image.url)?;
        }
    }
    if update.published == Some(true) {
        check_publishable(
            &format!("project '{}'", project.slug),
            &project.translations,
            &registry,
        )?;
    }

    store.update_project(id, update).await
}

pub async fn put_project_translation(
    store: &dyn ContentStore,
    id: i64,
    language_code: &str,
    input: ProjectTranslationInput,
) -> Result<Project, StoreError> {
    let registry = load_registry(store).await?;
    let code = known_language(&registry, language_code)?;
    require_project(store, id).await?;

    let translation = input.into_translation(&code)?;
    store.put_project_translation(id, translation).await
}

pub async fn delete_project_translation(
    store: &dyn ContentStore,
    id: i64,
    language_code: &str,
) -> Result<Project, StoreError> {
    let registry = load_registry(store).await?;
    let code = normalize_language_code(language_code)?;
    let project = require_project(store, id).await?;

    if project.published && code == registry.default_code() {
        return Err(StoreError::invalid(format!(
            "cannot remove the default-language translation of published project '{}'",
            project.slug
        )));
    }

    store.delete_project_translation(id, &code).await
}

pub async fn project_completeness(store: &dyn ContentStore, id: i64) -> Result<ValidationReport, StoreError> {
    let registry = load_registry(store).await?;
    let project = require_project(store, id).await?;
    Ok(TranslationValidator::validate(
        &format!("project '{}'", project.slug),
        &project.translations,
        &registry,
    ))
}
