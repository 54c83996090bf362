//! Plain-text extraction, for excerpts and meta descriptions.

use crate::richtext::RichTextNode;

const BLOCK_NODES: &[&str] = &[
    "paragraph",
    "heading",
    "listItem",
    "blockquote",
    "codeBlock",
    "horizontalRule",
];

/// Text content with one line per block, marks dropped.
pub fn to_plain_text(node: &RichTextNode) -> String {
    let mut out = String::new();
    collect(node, &mut out);
    out.trim().to_string()
}

fn collect(node: &RichTextNode, out: &mut String) {
    match node.kind.as_str() {
        "text" => out.push_str(node.text.as_deref().unwrap_or("")),
        "hardBreak" => out.push('\n'),
        "image" => {}
        kind => {
            for child in &node.content {
                collect(child, out);
            }
            if BLOCK_NODES.contains(&kind) && !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
        }
    }
}

/// Whitespace-collapsed text cut at a word boundary, with an ellipsis when
/// shortened.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }

    let cut: String = collapsed.chars().take(max_chars).collect();
    let trimmed = match cut.rfind(' ') {
        Some(index) if index > 0 => &cut[..index],
        _ => cut.as_str(),
    };
    format!("{}…", trimmed.trim_end_matches([',', ';', ':', '.', '-']))
}
