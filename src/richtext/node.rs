//! Rich-text document tree in the editor's JSON shape.
//!
//! ```json
//! {"type": "doc", "content": [
//!   {"type": "paragraph", "content": [
//!     {"type": "text", "text": "Hi", "marks": [{"type": "bold"}]}
//!   ]}
//! ]}
//! ```

use crate::i18n::Blank;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One node of a rich-text document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextNode {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<RichTextNode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
}

/// Inline formatting applied to a text node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,
}

impl RichTextNode {
    /// An element node with children.
    pub fn element(kind: &str, content: Vec<RichTextNode>) -> Self {
        Self {
            kind: kind.to_string(),
            attrs: None,
            content,
            text: None,
            marks: Vec::new(),
        }
    }

    /// A text leaf.
    pub fn text(text: &str) -> Self {
        Self {
            kind: "text".to_string(),
            attrs: None,
            content: Vec::new(),
            text: Some(text.to_string()),
            marks: Vec::new(),
        }
    }

    /// A `doc` root holding one paragraph per input line.
    pub fn doc_from_paragraphs<'a>(paragraphs: impl IntoIterator<Item = &'a str>) -> Self {
        let content = paragraphs
            .into_iter()
            .map(|p| Self::element("paragraph", vec![Self::text(p)]))
            .collect();
        Self::element("doc", content)
    }

    pub fn with_marks(mut self, marks: Vec<Mark>) -> Self {
        self.marks = marks;
        self
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attrs
            .get_or_insert_with(Map::new)
            .insert(name.to_string(), value.into());
        self
    }

    /// String attribute, if present and a string.
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attrs.as_ref()?.get(name)?.as_str()
    }

    /// Integer attribute, if present and numeric.
    pub fn attr_i64(&self, name: &str) -> Option<i64> {
        self.attrs.as_ref()?.get(name)?.as_i64()
    }

    /// True when the tree holds no visible text or media.
    pub fn is_empty(&self) -> bool {
        match self.kind.as_str() {
            "text" => self.text.as_deref().map_or(true, str::is_empty),
            "image" | "horizontalRule" => false,
            _ => self.content.iter().all(RichTextNode::is_empty),
        }
    }
}

impl Blank for RichTextNode {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Mark {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            attrs: None,
        }
    }

    pub fn link(href: &str) -> Self {
        let mut attrs = Map::new();
        attrs.insert("href".to_string(), Value::String(href.to_string()));
        Self {
            kind: "link".to_string(),
            attrs: Some(attrs),
        }
    }

    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attrs.as_ref()?.get(name)?.as_str()
    }
}
