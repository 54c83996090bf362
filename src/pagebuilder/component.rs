//! Page-builder component descriptors and their typed payloads.

use crate::i18n::{Blank, FallbackResolver};
use crate::richtext::RichTextNode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One block on a page, as stored: `{id, type, order, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A component field that is either one value for every language or a
/// `language code -> value` map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedField<T> {
    PerLanguage(BTreeMap<String, T>),
    Single(T),
}

impl<T: Blank> LocalizedField<T> {
    /// Pick the value for the resolver's language chain.
    pub fn resolve(&self, resolver: &FallbackResolver<'_>) -> Option<&T> {
        match self {
            LocalizedField::Single(value) => Some(value),
            LocalizedField::PerLanguage(values) => {
                resolver.resolve_map(values).map(|resolved| resolved.value)
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeroData {
    pub heading: LocalizedField<String>,
    #[serde(default)]
    pub subheading: Option<LocalizedField<String>>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub cta_label: Option<LocalizedField<String>>,
    #[serde(default)]
    pub cta_href: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RichTextData {
    pub content: LocalizedField<RichTextNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageData {
    pub url: String,
    #[serde(default)]
    pub alt: Option<LocalizedField<String>>,
    #[serde(default)]
    pub caption: Option<LocalizedField<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GalleryImage {
    pub url: String,
    #[serde(default)]
    pub alt: Option<LocalizedField<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GalleryData {
    pub images: Vec<GalleryImage>,
    #[serde(default)]
    pub columns: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteData {
    pub text: LocalizedField<String>,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallToActionData {
    pub heading: LocalizedField<String>,
    pub label: LocalizedField<String>,
    pub href: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectGridData {
    #[serde(default)]
    pub heading: Option<LocalizedField<String>>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub featured_only: bool,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpacerData {
    #[serde(default)]
    pub size: Option<String>,
}

/// A descriptor with its payload decoded.
#[derive(Debug, Clone)]
pub enum Component {
    Hero(HeroData),
    RichText(RichTextData),
    Image(ImageData),
    Gallery(GalleryData),
    Quote(QuoteData),
    CallToAction(CallToActionData),
    ProjectGrid(ProjectGridData),
    Spacer(SpacerData),
}

impl Component {
    /// Decode a descriptor's payload by its type tag.
    ///
    /// Returns `Ok(None)` for a type with no template and `Err` for a known
    /// type whose data does not match.
    pub fn decode(descriptor: &ComponentDescriptor) -> Result<Option<Component>, serde_json::Error> {
        let data = descriptor.data.clone();
        let component = match descriptor.kind.as_str() {
            "hero" => Component::Hero(serde_json::from_value(data)?),
            "rich_text" | "text" => Component::RichText(serde_json::from_value(data)?),
            "image" => Component::Image(serde_json::from_value(data)?),
            "gallery" => Component::Gallery(serde_json::from_value(data)?),
            "quote" => Component::Quote(serde_json::from_value(data)?),
            "call_to_action" | "cta" => Component::CallToAction(serde_json::from_value(data)?),
            "project_grid" => Component::ProjectGrid(serde_json::from_value(data)?),
            "spacer" => {
                if data.is_null() {
                    Component::Spacer(SpacerData::default())
                } else {
                    Component::Spacer(serde_json::from_value(data)?)
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(component))
    }

    /// CSS modifier for the wrapping element.
    pub fn css_name(&self) -> &'static str {
        match self {
            Component::Hero(_) => "hero",
            Component::RichText(_) => "rich-text",
            Component::Image(_) => "image",
            Component::Gallery(_) => "gallery",
            Component::Quote(_) => "quote",
            Component::CallToAction(_) => "call-to-action",
            Component::ProjectGrid(_) => "project-grid",
            Component::Spacer(_) => "spacer",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(kind: &str, data: serde_json::Value) -> ComponentDescriptor {
        ComponentDescriptor {
            id: "c1".to_string(),
            kind: kind.to_string(),
            order: 0,
            data,
        }
    }

    #[test]
    fn test_descriptor_deserialize() {
        let descriptor: ComponentDescriptor = serde_json::from_value(json!({
            "id": "abc",
            "type": "quote",
            "order": 2,
            "data": {"text": "Hout leeft"}
        }))
        .unwrap();
        assert_eq!(descriptor.kind, "quote");
        assert_eq!(descriptor.order, 2);
    }

    #[test]
    fn test_descriptor_defaults() {
        let descriptor: ComponentDescriptor =
            serde_json::from_value(json!({"id": "s", "type": "spacer"})).unwrap();
        assert_eq!(descriptor.order, 0);
        assert!(descriptor.data.is_null());
        assert!(matches!(
            Component::decode(&descriptor),
            Ok(Some(Component::Spacer(_)))
        ));
    }

    #[test]
    fn test_localized_field_single() {
        let field: LocalizedField<String> = serde_json::from_value(json!("Welkom")).unwrap();
        let resolver = FallbackResolver::new("fr", "nl");
        assert_eq!(field.resolve(&resolver).map(String::as_str), Some("Welkom"));
    }

    #[test]
    fn test_localized_field_per_language() {
        let field: LocalizedField<String> =
            serde_json::from_value(json!({"nl": "Welkom", "fr": "Bienvenue"})).unwrap();

        let fr = FallbackResolver::new("fr", "nl");
        let en = FallbackResolver::new("en", "nl");
        assert_eq!(field.resolve(&fr).map(String::as_str), Some("Bienvenue"));
        assert_eq!(field.resolve(&en).map(String::as_str), Some("Welkom"));
    }

    #[test]
    fn test_localized_field_missing_everywhere() {
        let field: LocalizedField<String> = serde_json::from_value(json!({"en": "Welcome"})).unwrap();
        assert!(field.resolve(&FallbackResolver::new("fr", "nl")).is_none());
    }

    #[test]
    fn test_localized_rich_text_single_document() {
        let field: LocalizedField<RichTextNode> = serde_json::from_value(json!({
            "type": "doc",
            "content": [{"type": "paragraph", "content": [{"type": "text", "text": "x"}]}]
        }))
        .unwrap();
        assert!(matches!(field, LocalizedField::Single(_)));
    }

    #[test]
    fn test_localized_rich_text_per_language() {
        let field: LocalizedField<RichTextNode> = serde_json::from_value(json!({
            "nl": {"type": "doc"},
            "fr": {"type": "doc"}
        }))
        .unwrap();
        assert!(matches!(field, LocalizedField::PerLanguage(ref map) if map.len() == 2));
    }

    #[test]
    fn test_decode_unknown_type() {
        let result = Component::decode(&descriptor("carousel3d", json!({})));
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_decode_malformed_data() {
        let result = Component::decode(&descriptor("quote", json!({"author": "Jan"})));
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_aliases() {
        assert!(matches!(
            Component::decode(&descriptor("cta", json!({"heading": "h", "label": "l", "href": "/contact"}))),
            Ok(Some(Component::CallToAction(_)))
        ));
        assert!(matches!(
            Component::decode(&descriptor("text", json!({"content": {"type": "doc"}}))),
            Ok(Some(Component::RichText(_)))
        ));
    }

    #[test]
    fn test_css_name() {
        let component = Component::decode(&descriptor("project_grid", json!({})))
            .unwrap()
            .unwrap();
        assert_eq!(component.css_name(), "project-grid");
    }
}
