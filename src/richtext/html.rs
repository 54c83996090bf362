//! Rich-text to HTML.
//!
//! A recursive walk over [`RichTextNode`]. Unknown node types render their
//! children; unknown marks leave the text unformatted. All text and attribute
//! values are escaped by maud.

use crate::richtext::{Mark, RichTextNode};
use maud::{html, Markup};

/// Render a document (or any subtree) to an HTML string.
pub fn to_html(node: &RichTextNode) -> String {
    render(node).into_string()
}

/// Render a node to maud markup, for embedding in templates.
pub fn render(node: &RichTextNode) -> Markup {
    match node.kind.as_str() {
        "paragraph" => html! { p { (children(node)) } },
        "heading" => heading(node),
        "bulletList" => html! { ul { (children(node)) } },
        "orderedList" => {
            let start = node.attr_i64("start").filter(|start| *start != 1);
            html! { ol start=[start] { (children(node)) } }
        }
        "listItem" => html! { li { (children(node)) } },
        "blockquote" => html! { blockquote { (children(node)) } },
        "codeBlock" => {
            let class = node
                .attr_str("language")
                .filter(|lang| is_safe_class(lang))
                .map(|lang| format!("language-{}", lang));
            html! { pre { code class=[class] { (inline_text(node)) } } }
        }
        "hardBreak" => html! { br; },
        "horizontalRule" => html! { hr; },
        "image" => image(node),
        "text" => text(node),
        // "doc" and anything unrecognized
        _ => children(node),
    }
}

fn children(node: &RichTextNode) -> Markup {
    html! {
        @for child in &node.content {
            (render(child))
        }
    }
}

fn heading(node: &RichTextNode) -> Markup {
    let inner = children(node);
    match node.attr_i64("level").unwrap_or(1).clamp(1, 6) {
        1 => html! { h1 { (inner) } },
        2 => html! { h2 { (inner) } },
        3 => html! { h3 { (inner) } },
        4 => html! { h4 { (inner) } },
        5 => html! { h5 { (inner) } },
        _ => html! { h6 { (inner) } },
    }
}

fn image(node: &RichTextNode) -> Markup {
    let Some(src) = node.attr_str("src").filter(|src| is_safe_url(src)) else {
        return html! {};
    };
    let alt = node.attr_str("alt").unwrap_or("");
    let title = node.attr_str("title");
    html! { img src=(src) alt=(alt) title=[title]; }
}

fn text(node: &RichTextNode) -> Markup {
    apply_marks(&node.marks, node.text.as_deref().unwrap_or(""))
}

/// Wrap text in its marks; the first mark is outermost.
fn apply_marks(marks: &[Mark], text: &str) -> Markup {
    let Some((mark, rest)) = marks.split_first() else {
        return html! { (text) };
    };
    let inner = apply_marks(rest, text);

    match mark.kind.as_str() {
        "bold" => html! { strong { (inner) } },
        "italic" => html! { em { (inner) } },
        "underline" => html! { u { (inner) } },
        "strike" => html! { s { (inner) } },
        "code" => html! { code { (inner) } },
        "highlight" => html! { mark { (inner) } },
        "subscript" => html! { sub { (inner) } },
        "superscript" => html! { sup { (inner) } },
        "link" => match mark.attr_str("href").filter(|href| is_safe_url(href)) {
            Some(href) => {
                let target = mark.attr_str("target").filter(|t| *t == "_blank");
                let rel = target.map(|_| "noopener noreferrer");
                html! { a href=(href) target=[target] rel=[rel] { (inner) } }
            }
            None => inner,
        },
        _ => inner,
    }
}

/// Concatenated text of all descendants, without block separators.
fn inline_text(node: &RichTextNode) -> String {
    match node.kind.as_str() {
        "text" => node.text.clone().unwrap_or_default(),
        "hardBreak" => "\n".to_string(),
        _ => node.content.iter().map(inline_text).collect(),
    }
}

/// Accept relative URLs and http(s)/mailto/tel; reject every other scheme.
pub fn is_safe_url(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() {
        return false;
    }

    match url.find([':', '/', '?', '#']) {
        Some(index) if url[index..].starts_with(':') => matches!(
            url[..index].to_ascii_lowercase().as_str(),
            "http" | "https" | "mailto" | "tel"
        ),
        _ => true,
    }
}

fn is_safe_class(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#'))
}
