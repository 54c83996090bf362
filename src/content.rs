//! Read side: published pages and projects resolved for one visitor language.
//!
//! Resolution never serves a translation outside the requested → default
//! chain. Every outcome is counted in the process-wide resolution metrics.

use crate::i18n::{FallbackResolver, Localized, ResolutionMetrics, Resolved};
use crate::models::{ContentPage, Project, ProjectImage};
use crate::pagebuilder::{render_components, RenderContext};
use crate::richtext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const META_DESCRIPTION_CHARS: usize = 160;

/// A page as served to visitors.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPage {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub body_html: String,
    pub meta_description: Option<String>,
    pub components_html: String,
    pub requested_language: String,
    pub language: String,
    pub is_fallback: bool,
    pub available_languages: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// A project as served to visitors.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedProject {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    pub description_html: String,
    pub category: Option<String>,
    pub year: Option<i32>,
    pub featured: bool,
    pub images: Vec<ProjectImage>,
    pub requested_language: String,
    pub language: String,
    pub is_fallback: bool,
    pub available_languages: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// The gallery entry for a project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectCard {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    pub category: Option<String>,
    pub year: Option<i32>,
    pub featured: bool,
    pub cover_image: Option<ProjectImage>,
    pub language: String,
    pub is_fallback: bool,
}

/// Gallery filters from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectFilter {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
}

impl ProjectFilter {
    pub fn matches(&self, project: &Project) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .map_or(true, |category| project.category.as_deref() == Some(category));
        let featured_ok = self.featured.map_or(true, |featured| project.featured == featured);
        category_ok && featured_ok
    }
}

fn record<T>(resolved: &Option<Resolved<T>>) {
    let metrics = ResolutionMetrics::global();
    match resolved {
        Some(resolved) => metrics.record(resolved.source),
        None => metrics.record_not_found(),
    }
}

fn languages_of<T: Localized>(rows: &[T]) -> Vec<String> {
    let mut codes: Vec<String> = rows.iter().map(|row| row.language_code().to_string()).collect();
    codes.sort();
    codes
}

/// Resolve a published page, rendering its body and components.
///
/// Returns `None` for unpublished pages and for pages with neither a
/// requested- nor a default-language translation.
pub fn resolve_page(
    page: &ContentPage,
    resolver: &FallbackResolver<'_>,
    projects: &[ProjectCard],
) -> Option<ResolvedPage> {
    if !page.published {
        return None;
    }

    let resolved = resolver.resolve(&page.translations);
    record(&resolved);
    let resolved = resolved?;
    let translation = resolved.value;

    let meta_description = translation.meta_description.clone().or_else(|| {
        let text = translation.body.to_plain_text();
        (!text.is_empty()).then(|| richtext::excerpt(&text, META_DESCRIPTION_CHARS))
    });

    let ctx = RenderContext {
        resolver: *resolver,
        projects,
    };
    let components = render_components(&page.components, &ctx);

    Some(ResolvedPage {
        id: page.id,
        slug: page.slug.clone(),
        title: translation.title.clone(),
        body_html: translation.body.to_html(),
        meta_description,
        components_html: components.html,
        requested_language: resolved.requested_language.clone(),
        language: resolved.used_language.clone(),
        is_fallback: resolved.is_fallback(),
        available_languages: languages_of(&page.translations),
        updated_at: page.updated_at,
    })
}

/// Resolve a published project for its detail view.
pub fn resolve_project(project: &Project, resolver: &FallbackResolver<'_>) -> Option<ResolvedProject> {
    if !project.published {
        return None;
    }

    let resolved = resolver.resolve(&project.translations);
    record(&resolved);
    let resolved = resolved?;
    let translation = resolved.value;

    Some(ResolvedProject {
        id: project.id,
        slug: project.slug.clone(),
        title: translation.title.clone(),
        summary: translation.summary.clone(),
        description_html: translation.description.to_html(),
        category: project.category.clone(),
        year: project.year,
        featured: project.featured,
        images: project.images.clone(),
        requested_language: resolved.requested_language.clone(),
        language: resolved.used_language.clone(),
        is_fallback: resolved.is_fallback(),
        available_languages: languages_of(&project.translations),
        updated_at: project.updated_at,
    })
}

/// Gallery cards for every published, resolvable project matching `filter`,
/// in display order.
pub fn project_cards(
    projects: &[Project],
    resolver: &FallbackResolver<'_>,
    filter: &ProjectFilter,
) -> Vec<ProjectCard> {
    let mut visible: Vec<&Project> = projects
        .iter()
        .filter(|project| project.published && filter.matches(project))
        .collect();
    visible.sort_by_key(|project| (project.sort_order, project.id));

    visible
        .into_iter()
        .filter_map(|project| {
            let resolved = resolver.resolve(&project.translations);
            record(&resolved);
            let resolved = resolved?;
            let translation = resolved.value;

            Some(ProjectCard {
                id: project.id,
                slug: project.slug.clone(),
                title: translation.title.clone(),
                summary: translation.summary.clone().or_else(|| {
                    let text = translation.description.to_plain_text();
                    (!text.is_empty()).then(|| richtext::excerpt(&text, META_DESCRIPTION_CHARS))
                }),
                category: project.category.clone(),
                year: project.year,
                featured: project.featured,
                cover_image: project.images.first().cloned(),
                is_fallback: resolved.is_fallback(),
                language: resolved.used_language,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PageTranslation, ProjectTranslation, TranslationValue};
    use crate::pagebuilder::ComponentDescriptor;
    use serde_json::json;

    fn page(translations: Vec<PageTranslation>) -> ContentPage {
        ContentPage {
            id: 1,
            slug: "about".to_string(),
            published: true,
            components: vec![],
            translations,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn page_translation(lang: &str, title: &str) -> PageTranslation {
        PageTranslation {
            language_code: lang.to_string(),
            title: title.to_string(),
            body: TranslationValue::Text(format!("{} body", title)),
            meta_description: None,
        }
    }

    fn project(id: i64, slug: &str, sort_order: i32, langs: &[&str]) -> Project {
        Project {
            id,
            slug: slug.to_string(),
            category: Some("tables".to_string()),
            year: Some(2023),
            featured: id % 2 == 0,
            published: true,
            sort_order,
            images: vec![ProjectImage {
                url: format!("/media/{}.jpg", slug),
                alt: None,
            }],
            translations: langs
                .iter()
                .map(|lang| ProjectTranslation {
                    language_code: lang.to_string(),
                    title: format!("{} ({})", slug, lang),
                    summary: None,
                    description: TranslationValue::Text("Massief eiken blad".to_string()),
                })
                .collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    // ==================== Page Resolution Tests ====================

    #[test]
    fn test_page_falls_back_to_default() {
        let page = page(vec![page_translation("nl", "Over Ons")]);

        let fr = resolve_page(&page, &FallbackResolver::new("fr", "nl"), &[]).unwrap();
        assert_eq!(fr.title, "Over Ons");
        assert_eq!(fr.language, "nl");
        assert_eq!(fr.requested_language, "fr");
        assert!(fr.is_fallback);

        let nl = resolve_page(&page, &FallbackResolver::new("nl", "nl"), &[]).unwrap();
        assert_eq!(nl.title, "Over Ons");
        assert!(!nl.is_fallback);
    }

    #[test]
    fn test_page_without_translations_not_found() {
        let page = page(vec![]);
        assert!(resolve_page(&page, &FallbackResolver::new("fr", "nl"), &[]).is_none());
    }

    #[test]
    fn test_page_with_only_other_language_not_found() {
        let page = page(vec![page_translation("en", "About")]);
        assert!(resolve_page(&page, &FallbackResolver::new("fr", "nl"), &[]).is_none());
    }

    #[test]
    fn test_unpublished_page_hidden() {
        let mut page = page(vec![page_translation("nl", "Over Ons")]);
        page.published = false;
        assert!(resolve_page(&page, &FallbackResolver::new("nl", "nl"), &[]).is_none());
    }

    #[test]
    fn test_meta_description_from_body() {
        let page = page(vec![page_translation("nl", "Over Ons")]);
        let resolved = resolve_page(&page, &FallbackResolver::new("nl", "nl"), &[]).unwrap();
        assert_eq!(resolved.meta_description.as_deref(), Some("Over Ons body"));
        assert_eq!(resolved.body_html, "<p>Over Ons body</p>");
    }

    #[test]
    fn test_page_components_rendered() {
        let mut page = page(vec![page_translation("nl", "Home")]);
        page.components = vec![ComponentDescriptor {
            id: "q".to_string(),
            kind: "quote".to_string(),
            order: 0,
            data: json!({"text": {"nl": "Hout leeft", "fr": "Le bois vit"}}),
        }];

        let resolved = resolve_page(&page, &FallbackResolver::new("fr", "nl"), &[]).unwrap();
        assert!(resolved.components_html.contains("Le bois vit"));
    }

    #[test]
    fn test_available_languages_sorted() {
        let page = page(vec![page_translation("nl", "a"), page_translation("en", "b")]);
        let resolved = resolve_page(&page, &FallbackResolver::new("nl", "nl"), &[]).unwrap();
        assert_eq!(resolved.available_languages, vec!["en", "nl"]);
    }

    #[test]
    fn test_not_found_is_counted() {
        let before = ResolutionMetrics::global().not_found();
        let page = page(vec![]);
        resolve_page(&page, &FallbackResolver::new("fr", "nl"), &[]);
        assert!(ResolutionMetrics::global().not_found() > before);
    }

    // ==================== Project Tests ====================

    #[test]
    fn test_resolve_project() {
        let project = project(1, "tafel", 0, &["nl", "fr"]);
        let resolved = resolve_project(&project, &FallbackResolver::new("fr", "nl")).unwrap();
        assert_eq!(resolved.title, "tafel (fr)");
        assert!(!resolved.is_fallback);
        assert_eq!(resolved.description_html, "<p>Massief eiken blad</p>");
    }

    #[test]
    fn test_project_cards_order_and_skip() {
        let projects = vec![
            project(1, "kast", 2, &["nl"]),
            project(2, "tafel", 1, &["nl", "fr"]),
            project(3, "bank", 1, &["en"]),
        ];
        let cards = project_cards(
            &projects,
            &FallbackResolver::new("fr", "nl"),
            &ProjectFilter::default(),
        );

        let slugs: Vec<&str> = cards.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["tafel", "kast"]);
        assert!(!cards[0].is_fallback);
        assert!(cards[1].is_fallback);
        assert_eq!(cards[1].language, "nl");
        assert_eq!(cards[0].summary.as_deref(), Some("Massief eiken blad"));
        assert_eq!(cards[0].cover_image.as_ref().unwrap().url, "/media/tafel.jpg");
    }

    #[test]
    fn test_project_filter() {
        let mut chair = project(1, "stoel", 0, &["nl"]);
        chair.category = Some("chairs".to_string());
        let table = project(2, "tafel", 0, &["nl"]);
        let projects = vec![chair, table];
        let resolver = FallbackResolver::new("nl", "nl");

        let chairs = ProjectFilter {
            category: Some("chairs".to_string()),
            featured: None,
        };
        assert_eq!(project_cards(&projects, &resolver, &chairs).len(), 1);

        let featured = ProjectFilter {
            category: None,
            featured: Some(true),
        };
        let cards = project_cards(&projects, &resolver, &featured);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].slug, "tafel");
    }

    #[test]
    fn test_unpublished_projects_hidden() {
        let mut hidden = project(1, "prototype", 0, &["nl"]);
        hidden.published = false;
        let cards = project_cards(&[hidden], &FallbackResolver::new("nl", "nl"), &ProjectFilter::default());
        assert!(cards.is_empty());
    }
}
