//! Page builder: typed, ordered component descriptors and their templates.

mod component;
mod render;

pub use component::{Component, ComponentDescriptor, LocalizedField};
pub use render::{render_components, sort_components, RenderContext, RenderOutput};
