//! Page-builder renderer: sort descriptors by `order`, dispatch each to the
//! template for its type.

use crate::content::ProjectCard;
use crate::i18n::FallbackResolver;
use crate::pagebuilder::component::{
    CallToActionData, Component, ComponentDescriptor, GalleryData, HeroData, ImageData,
    ProjectGridData, QuoteData, RichTextData, SpacerData,
};
use crate::richtext::{self, is_safe_url};
use maud::{html, Markup};
use serde::Serialize;
use tracing::{debug, warn};

/// Inputs a template may draw on besides its own data.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub resolver: FallbackResolver<'a>,
    /// Published projects, already resolved and ordered for display
    pub projects: &'a [ProjectCard],
}

/// Rendered page body plus which components made it in.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderOutput {
    pub html: String,
    pub rendered: Vec<String>,
    pub skipped: Vec<String>,
}

/// Descriptors in display order. Ties keep their original position.
pub fn sort_components(components: &[ComponentDescriptor]) -> Vec<&ComponentDescriptor> {
    let mut sorted: Vec<&ComponentDescriptor> = components.iter().collect();
    sorted.sort_by_key(|descriptor| descriptor.order);
    sorted
}

/// Render a page's components in order.
///
/// Unknown types, malformed data and components whose text has no value in
/// either the requested or the default language are skipped.
pub fn render_components(components: &[ComponentDescriptor], ctx: &RenderContext<'_>) -> RenderOutput {
    let mut output = RenderOutput::default();
    let mut blocks = Vec::with_capacity(components.len());

    for descriptor in sort_components(components) {
        let component = match Component::decode(descriptor) {
            Ok(Some(component)) => component,
            Ok(None) => {
                debug!(
                    "Skipping component {} with unknown type '{}'",
                    descriptor.id, descriptor.kind
                );
                output.skipped.push(descriptor.id.clone());
                continue;
            }
            Err(e) => {
                warn!(
                    "Skipping component {} ({}): invalid data: {}",
                    descriptor.id, descriptor.kind, e
                );
                output.skipped.push(descriptor.id.clone());
                continue;
            }
        };

        match render_component(&component, ctx) {
            Some(body) => {
                blocks.push(html! {
                    section
                        class={ "component component-" (component.css_name()) }
                        data-component-id=(descriptor.id) {
                        (body)
                    }
                });
                output.rendered.push(descriptor.id.clone());
            }
            None => {
                debug!(
                    "Skipping component {} ({}): nothing to show in '{}'",
                    descriptor.id,
                    descriptor.kind,
                    ctx.resolver.requested()
                );
                output.skipped.push(descriptor.id.clone());
            }
        }
    }

    output.html = html! { @for block in &blocks { (block) } }.into_string();
    output
}

fn render_component(component: &Component, ctx: &RenderContext<'_>) -> Option<Markup> {
    match component {
        Component::Hero(data) => hero(data, ctx),
        Component::RichText(data) => rich_text(data, ctx),
        Component::Image(data) => image(data, ctx),
        Component::Gallery(data) => gallery(data, ctx),
        Component::Quote(data) => quote(data, ctx),
        Component::CallToAction(data) => call_to_action(data, ctx),
        Component::ProjectGrid(data) => project_grid(data, ctx),
        Component::Spacer(data) => Some(spacer(data)),
    }
}

fn safe_url(url: Option<&str>) -> Option<&str> {
    url.filter(|url| is_safe_url(url))
}

fn hero(data: &HeroData, ctx: &RenderContext<'_>) -> Option<Markup> {
    let heading = data.heading.resolve(&ctx.resolver)?;
    let subheading = data.subheading.as_ref().and_then(|s| s.resolve(&ctx.resolver));
    let image_url = safe_url(data.image_url.as_deref());
    let cta = data
        .cta_label
        .as_ref()
        .and_then(|label| label.resolve(&ctx.resolver))
        .zip(safe_url(data.cta_href.as_deref()));

    Some(html! {
        @if let Some(url) = image_url {
            img.hero-image src=(url) alt="";
        }
        div.hero-content {
            h1 { (heading) }
            @if let Some(subheading) = subheading {
                p.hero-subheading { (subheading) }
            }
            @if let Some((label, href)) = cta {
                a.button href=(href) { (label) }
            }
        }
    })
}

fn rich_text(data: &RichTextData, ctx: &RenderContext<'_>) -> Option<Markup> {
    let doc = data.content.resolve(&ctx.resolver)?;
    Some(richtext::render(doc))
}

fn image(data: &ImageData, ctx: &RenderContext<'_>) -> Option<Markup> {
    let url = safe_url(Some(&data.url))?;
    let alt = data
        .alt
        .as_ref()
        .and_then(|alt| alt.resolve(&ctx.resolver))
        .map(String::as_str)
        .unwrap_or("");
    let caption = data.caption.as_ref().and_then(|c| c.resolve(&ctx.resolver));

    Some(html! {
        figure {
            img src=(url) alt=(alt) loading="lazy";
            @if let Some(caption) = caption {
                figcaption { (caption) }
            }
        }
    })
}

fn gallery(data: &GalleryData, ctx: &RenderContext<'_>) -> Option<Markup> {
    let images: Vec<(&str, &str)> = data
        .images
        .iter()
        .filter_map(|image| {
            let url = safe_url(Some(&image.url))?;
            let alt = image
                .alt
                .as_ref()
                .and_then(|alt| alt.resolve(&ctx.resolver))
                .map(String::as_str)
                .unwrap_or("");
            Some((url, alt))
        })
        .collect();

    if images.is_empty() {
        return None;
    }

    let columns = data.columns.unwrap_or(3).clamp(1, 6);
    Some(html! {
        ul.gallery data-columns=(columns) {
            @for (url, alt) in &images {
                li { img src=(url) alt=(alt) loading="lazy"; }
            }
        }
    })
}

fn quote(data: &QuoteData, ctx: &RenderContext<'_>) -> Option<Markup> {
    let text = data.text.resolve(&ctx.resolver)?;
    Some(html! {
        blockquote {
            p { (text) }
            @if let Some(author) = &data.author {
                cite { (author) }
            }
        }
    })
}

fn call_to_action(data: &CallToActionData, ctx: &RenderContext<'_>) -> Option<Markup> {
    let heading = data.heading.resolve(&ctx.resolver)?;
    let label = data.label.resolve(&ctx.resolver)?;
    let href = safe_url(Some(&data.href))?;

    Some(html! {
        h2 { (heading) }
        a.button href=(href) { (label) }
    })
}

fn project_grid(data: &ProjectGridData, ctx: &RenderContext<'_>) -> Option<Markup> {
    let cards: Vec<&ProjectCard> = ctx
        .projects
        .iter()
        .filter(|card| !data.featured_only || card.featured)
        .filter(|card| {
            data.category
                .as_deref()
                .map_or(true, |category| card.category.as_deref() == Some(category))
        })
        .take(data.limit.unwrap_or(usize::MAX))
        .collect();

    if cards.is_empty() {
        return None;
    }

    let heading = data.heading.as_ref().and_then(|h| h.resolve(&ctx.resolver));
    Some(html! {
        @if let Some(heading) = heading {
            h2 { (heading) }
        }
        ul.project-grid {
            @for card in &cards {
                li.project-card lang=(card.language) {
                    a href={ "/projects/" (card.slug) } {
                        @if let Some(cover) = &card.cover_image {
                            img src=(cover.url) alt=(cover.alt.as_deref().unwrap_or(&card.title)) loading="lazy";
                        }
                        h3 { (card.title) }
                        @if let Some(summary) = &card.summary {
                            p { (summary) }
                        }
                    }
                }
            }
        }
    })
}

fn spacer(data: &SpacerData) -> Markup {
    let size = match data.size.as_deref() {
        Some("small") => "small",
        Some("large") => "large",
        _ => "medium",
    };
    html! { div class={ "spacer spacer-" (size) } {} }
}
