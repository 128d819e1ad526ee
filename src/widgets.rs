//! Presentational components shared by the markdown renderer and the page
//! templates.
//!
//! Everything here is static markup. The small amount of client behaviour
//! (section highlighting, one-shot reveal animation) lives in
//! `static/guide.js` and keys off the classes and `data-*` attributes emitted
//! below; tooltips and the FAQ accordion work without JavaScript.

use crate::config::CtaConfig;
use crate::dictionary::Entry;
use crate::types::{FaqItem, Guide, Section};
use maud::{Markup, PreEscaped, html};

/// Class the reveal script watches. Elements get `is-visible` once, the
/// first time they enter the viewport.
pub const ANIMATE_CLASS: &str = "animate-on-scroll";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipKind {
    Glossary,
    Material,
}

impl TooltipKind {
    pub fn label(self) -> &'static str {
        match self {
            TooltipKind::Glossary => "glossary",
            TooltipKind::Material => "material",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductKind {
    Shop,
    Equipment,
}

impl ProductKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductKind::Shop => "shop",
            ProductKind::Equipment => "equipment",
        }
    }
}

/// Hover/focus tooltip for a glossary term or material.
///
/// Without an entry this is just the escaped label.
pub fn tooltip(label: &str, entry: Option<&Entry>, kind: TooltipKind) -> Markup {
    let Some(entry) = entry else {
        return html! { (label) };
    };
    html! {
        span class={ "tooltip tooltip-" (kind.label()) } tabindex="0" {
            span.tooltip-term { (label) }
            span.tooltip-body role="tooltip" {
                strong { (entry.name) }
                " "
                (entry.definition)
                @if let Some(slug) = &entry.guide {
                    " "
                    a href={ "/guides/" (slug) } { "Read the guide" }
                }
            }
        }
    }
}

/// Link into the shop or equipment catalog, opened in a new tab.
pub fn product_link(href: &str, label: &str, kind: ProductKind) -> Markup {
    html! {
        a.product-link href=(href) data-kind=(kind.as_str())
            target="_blank" rel="noopener noreferrer" {
            (label)
        }
    }
}

/// YouTube ids are 11 characters of `[A-Za-z0-9_-]`.
pub fn is_youtube_id(id: &str) -> bool {
    id.len() == 11
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Lazy privacy-enhanced YouTube embed. Inline-level so it can sit inside
/// the paragraph markdown wraps images in.
pub fn youtube_video(id: &str, title: &str) -> Markup {
    let src = format!("https://www.youtube-nocookie.com/embed/{id}");
    html! {
        span.video-embed {
            iframe src=(src) title=(title) loading="lazy"
                allow="accelerometer; encrypted-media; gyroscope; picture-in-picture"
                allowfullscreen {}
        }
    }
}

/// "On this page" navigation. The script marks the link of the section in
/// view with `aria-current`.
pub fn side_nav(sections: &[Section]) -> Markup {
    if sections.is_empty() {
        return html! {};
    }
    html! {
        nav.guide-side-nav aria-label="On this page" data-scrollspy {
            p.side-nav-title { "On this page" }
            ol {
                @for section in sections {
                    li {
                        a href={ "#" (section.id) } data-section=(section.id) { (section.label) }
                    }
                }
            }
        }
    }
}

pub fn animate_on_scroll(content: Markup) -> Markup {
    html! {
        div class=(ANIMATE_CLASS) { (content) }
    }
}

/// Anchor of the FAQ heading; body headings never take it.
pub const FAQ_SECTION_ID: &str = "frequently-asked-questions";

/// Expand/collapse list of questions; several may be open at once.
///
/// `render_answer` turns answer markdown into HTML.
pub fn faq_accordion(items: &[FaqItem], render_answer: impl Fn(&str) -> String) -> Markup {
    if items.is_empty() {
        return html! {};
    }
    html! {
        section.faq {
            h2 id=(FAQ_SECTION_ID) { "Frequently asked questions" }
            @for item in items {
                details.faq-item {
                    summary { (item.question) }
                    div.faq-answer { (PreEscaped(render_answer(&item.answer))) }
                }
            }
        }
    }
}

pub fn cta(config: &CtaConfig) -> Markup {
    if !config.enabled {
        return html! {};
    }
    animate_on_scroll(html! {
        aside.cta {
            h2 { (config.heading) }
            p { (config.text) }
            a.cta-button href=(config.url) { (config.button_label) }
        }
    })
}

/// Card linking to a guide, used by related-guide blocks and index pages.
pub fn guide_card(guide: &Guide) -> Markup {
    let blurb = guide.blurb();
    html! {
        a.guide-card href=(guide.path()) {
            span.guide-card-category { (guide.category.label()) }
            span.guide-card-title { (guide.title) }
            @if let Some(blurb) = blurb {
                span.guide-card-blurb { (blurb) }
            }
            span.guide-card-meta { (guide.reading_minutes()) " min read" }
        }
    }
}
