//! Rich-text documents: the editor's node tree and its HTML / plain-text
//! renderings.

mod html;
mod node;
mod text;

pub use html::{is_safe_url, render, to_html};
pub use node::{Mark, RichTextNode};
pub use text::{excerpt, to_plain_text};
