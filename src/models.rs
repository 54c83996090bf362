//! Stored entities and the payloads the admin API accepts for them.

use crate::i18n::Localized;
use crate::pagebuilder::ComponentDescriptor;
use crate::richtext::{self, RichTextNode};
use crate::validation::{require_text, validate_slug, ValidationError};
use chrono::{DateTime, Utc};
use maud::html;
use serde::{Deserialize, Serialize};

// ==================== Translation Values ====================

/// A translated body: either plain text or a rich-text document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranslationValue {
    Text(String),
    RichText(RichTextNode),
}

impl Default for TranslationValue {
    fn default() -> Self {
        TranslationValue::Text(String::new())
    }
}

impl TranslationValue {
    /// HTML for display. Plain text becomes one paragraph per blank-line
    /// separated block, with single newlines as `<br>`.
    pub fn to_html(&self) -> String {
        match self {
            TranslationValue::RichText(doc) => richtext::to_html(doc),
            TranslationValue::Text(text) => {
                let paragraphs: Vec<Vec<&str>> = text
                    .split("\n\n")
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(|p| p.lines().collect())
                    .collect();

                html! {
                    @for lines in &paragraphs {
                        p {
                            @for (index, line) in lines.iter().enumerate() {
                                @if index > 0 { br; }
                                (line)
                            }
                        }
                    }
                }
                .into_string()
            }
        }
    }

    pub fn to_plain_text(&self) -> String {
        match self {
            TranslationValue::Text(text) => text.trim().to_string(),
            TranslationValue::RichText(doc) => richtext::to_plain_text(doc),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            TranslationValue::Text(text) => text.trim().is_empty(),
            TranslationValue::RichText(doc) => doc.is_empty(),
        }
    }
}

// ==================== Content Pages ====================

/// A page's content in one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTranslation {
    pub language_code: String,
    pub title: String,
    #[serde(default)]
    pub body: TranslationValue,
    #[serde(default)]
    pub meta_description: Option<String>,
}

impl Localized for PageTranslation {
    fn language_code(&self) -> &str {
        &self.language_code
    }
}

/// A content page built from page-builder components plus translated text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPage {
    pub id: i64,
    pub slug: String,
    pub published: bool,
    pub components: Vec<ComponentDescriptor>,
    pub translations: Vec<PageTranslation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewPage {
    pub slug: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub components: Vec<ComponentDescriptor>,
    #[serde(default)]
    pub translations: Vec<PageTranslation>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PageUpdate {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub components: Option<Vec<ComponentDescriptor>>,
}

/// Body of `PUT /pages/:id/translations/:lang`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageTranslationInput {
    pub title: String,
    #[serde(default)]
    pub body: TranslationValue,
    #[serde(default)]
    pub meta_description: Option<String>,
}

impl PageTranslationInput {
    pub fn into_translation(self, language_code: &str) -> Result<PageTranslation, ValidationError> {
        require_text("title", &self.title)?;
        Ok(PageTranslation {
            language_code: language_code.to_string(),
            title: self.title.trim().to_string(),
            body: self.body,
            meta_description: self.meta_description.filter(|m| !m.trim().is_empty()),
        })
    }
}

// ==================== Projects ====================

/// A project photo. Files are uploaded elsewhere; only the URL is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectImage {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

/// A project's text in one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTranslation {
    pub language_code: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: TranslationValue,
}

impl Localized for ProjectTranslation {
    fn language_code(&self) -> &str {
        &self.language_code
    }
}

/// A finished piece shown in the portfolio gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub slug: String,
    pub category: Option<String>,
    pub year: Option<i32>,
    pub featured: bool,
    pub published: bool,
    pub sort_order: i32,
    pub images: Vec<ProjectImage>,
    pub translations: Vec<ProjectTranslation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewProject {
    pub slug: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub images: Vec<ProjectImage>,
    #[serde(default)]
    pub translations: Vec<ProjectTranslation>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProjectUpdate {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub images: Option<Vec<ProjectImage>>,
}

/// Body of `PUT /projects/:id/translations/:lang`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectTranslationInput {
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: TranslationValue,
}

impl ProjectTranslationInput {
    pub fn into_translation(
        self,
        language_code: &str,
    ) -> Result<ProjectTranslation, ValidationError> {
        require_text("title", &self.title)?;
        Ok(ProjectTranslation {
            language_code: language_code.to_string(),
            title: self.title.trim().to_string(),
            summary: self.summary.filter(|s| !s.trim().is_empty()),
            description: self.description,
        })
    }
}

/// Validate a slug field on create.
pub fn checked_slug(slug: &str) -> Result<String, ValidationError> {
    let slug = slug.trim().to_string();
    validate_slug(&slug)?;
    Ok(slug)
}

// ==================== Settings ====================

/// A site setting: free-form JSON under a dotted key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

// ==================== Analytics ====================

/// One recorded page view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageView {
    pub path: String,
    pub language_code: Option<String>,
    pub referrer: Option<String>,
    pub viewed_at: DateTime<Utc>,
}

// ==================== Social ====================

/// A post mirrored from the workshop's social media account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    pub external_id: String,
    pub platform: String,
    pub caption: Option<String>,
    pub media_url: Option<String>,
    pub permalink: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub synced_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_translation_value_untagged_text() {
        let value: TranslationValue = serde_json::from_value(json!("Hallo")).unwrap();
        assert_eq!(value, TranslationValue::Text("Hallo".to_string()));
    }

    #[test]
    fn test_translation_value_untagged_rich_text() {
        let value: TranslationValue = serde_json::from_value(json!({
            "type": "doc",
            "content": [{"type": "paragraph", "content": [{"type": "text", "text": "Hallo"}]}]
        }))
        .unwrap();
        assert!(matches!(value, TranslationValue::RichText(_)));
        assert_eq!(value.to_html(), "<p>Hallo</p>");
    }

    #[test]
    fn test_plain_text_to_html_paragraphs() {
        let value = TranslationValue::Text("Eerste regel\ntweede regel\n\nNieuwe alinea".to_string());
        assert_eq!(
            value.to_html(),
            "<p>Eerste regel<br>tweede regel</p><p>Nieuwe alinea</p>"
        );
    }

    #[test]
    fn test_plain_text_to_html_escapes() {
        let value = TranslationValue::Text("<b>hout</b>".to_string());
        assert_eq!(value.to_html(), "<p>&lt;b&gt;hout&lt;/b&gt;</p>");
    }

    #[test]
    fn test_translation_value_is_empty() {
        assert!(TranslationValue::default().is_empty());
        assert!(TranslationValue::Text("  ".to_string()).is_empty());
        assert!(!TranslationValue::Text("x".to_string()).is_empty());
        assert!(TranslationValue::RichText(RichTextNode::element("doc", vec![])).is_empty());
    }

    #[test]
    fn test_page_translation_input_requires_title() {
        let input = PageTranslationInput {
            title: " ".to_string(),
            body: TranslationValue::default(),
            meta_description: None,
        };
        assert!(input.into_translation("nl").is_err());
    }

    #[test]
    fn test_page_translation_input_trims() {
        let input = PageTranslationInput {
            title: " Over Ons ".to_string(),
            body: TranslationValue::Text("tekst".to_string()),
            meta_description: Some(String::new()),
        };
        let translation = input.into_translation("nl").unwrap();
        assert_eq!(translation.title, "Over Ons");
        assert_eq!(translation.language_code, "nl");
        assert!(translation.meta_description.is_none());
    }

    #[test]
    fn test_project_translation_input() {
        let input: ProjectTranslationInput = serde_json::from_value(json!({
            "title": "Eiken tafel",
            "summary": "Massief eik",
        }))
        .unwrap();
        let translation = input.into_translation("nl").unwrap();
        assert_eq!(translation.summary.as_deref(), Some("Massief eik"));
        assert!(translation.description.is_empty());
    }

    #[test]
    fn test_checked_slug() {
        assert_eq!(checked_slug(" oak-table ").unwrap(), "oak-table");
        assert!(checked_slug("Oak Table").is_err());
    }

    #[test]
    fn test_new_page_defaults() {
        let page: NewPage = serde_json::from_value(json!({"slug": "about"})).unwrap();
        assert!(!page.published);
        assert!(page.components.is_empty());
        assert!(page.translations.is_empty());
    }
}
