//! Guide body markdown: outline extraction and HTML rendering.
//!
//! Both passes run over the same pulldown-cmark event stream with heading ids
//! filled in, so the section ids recorded at scan time always match the
//! anchors in the rendered page.
//!
//! Link destinations with a custom scheme are rewritten into widgets:
//!
//! | Destination | Output |
//! |---|---|
//! | `guide:slug#frag`, `/guides/slug` | internal link, recorded as a guide reference |
//! | `glossary:Term`, `glossary:` | glossary tooltip (empty key → link text) |
//! | `material:Name`, `material:` | material tooltip (empty key → link text) |
//! | `shop:/path`, `equipment:/path` | product link to the external subdomain |
//! | `![title](youtube:ID)` | embedded video |
//!
//! Unknown dictionary keys and malformed video ids degrade to plain text and
//! are reported as [`RenderWarning`]s.

use crate::config::LinksConfig;
use crate::dictionary::Dictionary;
use crate::naming::slugify;
use crate::types::Section;
use crate::widgets::{self, ProductKind, TooltipKind};
use maud::html;
use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html as md_html};
use std::collections::HashSet;
use std::fmt;

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Where a link destination points.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkTarget<'s> {
    Guide {
        slug: &'s str,
        fragment: Option<&'s str>,
    },
    Glossary(String),
    Material(String),
    Product(ProductKind, &'s str),
    Other,
}

impl<'s> LinkTarget<'s> {
    pub fn parse(dest: &'s str) -> Self {
        if let Some(rest) = dest.strip_prefix("guide:") {
            return guide_target(rest);
        }
        if let Some(rest) = dest.strip_prefix("/guides/") {
            return guide_target(rest);
        }
        if let Some(key) = dest.strip_prefix("glossary:") {
            return LinkTarget::Glossary(decode_key(key));
        }
        if let Some(key) = dest.strip_prefix("material:") {
            return LinkTarget::Material(decode_key(key));
        }
        if let Some(path) = dest.strip_prefix("shop:") {
            return LinkTarget::Product(ProductKind::Shop, path);
        }
        if let Some(path) = dest.strip_prefix("equipment:") {
            return LinkTarget::Product(ProductKind::Equipment, path);
        }
        LinkTarget::Other
    }

    /// Slug of the referenced guide, if this is a guide link.
    pub fn guide_slug(&self) -> Option<&'s str> {
        match self {
            LinkTarget::Guide { slug, .. } => Some(slug),
            _ => None,
        }
    }
}

fn guide_target(rest: &str) -> LinkTarget<'_> {
    let (path, fragment) = match rest.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (rest, None),
    };
    let path = path.split('?').next().unwrap_or(path);
    let path = path.strip_suffix("index.html").unwrap_or(path);
    let slug = path.trim_end_matches('/');
    if slug.is_empty() || slug.contains('/') {
        return LinkTarget::Other;
    }
    LinkTarget::Guide {
        slug,
        fragment: fragment.filter(|f| !f.is_empty()),
    }
}

fn decode_key(key: &str) -> String {
    key.replace("%20", " ").trim().to_string()
}

/// Parse a body and give every heading a unique id.
///
/// Explicit `{#id}` attributes are claimed first, in document order; the
/// other headings get a slugified id. Either kind is suffixed `-2`, `-3`, …
/// when already taken. The FAQ anchor is reserved.
fn parse_with_ids(body: &str) -> Vec<Event<'_>> {
    let mut events: Vec<Event<'_>> = Parser::new_ext(body, options()).collect();
    let mut used = HashSet::from([widgets::FAQ_SECTION_ID.to_string()]);

    for event in &mut events {
        if let Event::Start(Tag::Heading { id: Some(id), .. }) = event {
            let base = id.to_string();
            *id = CowStr::from(claim_id(&mut used, &base));
        }
    }
    for i in 0..events.len() {
        if !matches!(events[i], Event::Start(Tag::Heading { id: None, .. })) {
            continue;
        }
        let unique = claim_id(&mut used, &slugify(&heading_text(&events[i + 1..])));
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(CowStr::from(unique));
        }
    }
    events
}

/// `base`, or the first free `base-N`, marked as used.
fn claim_id(used: &mut HashSet<String>, base: &str) -> String {
    let mut candidate = base.to_string();
    let mut n = 2;
    while used.contains(&candidate) {
        candidate = format!("{base}-{n}");
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}

/// Plain text of the events up to the end of the current heading.
fn heading_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            _ => {}
        }
    }
    collapse_whitespace(&text)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Outline (scan stage)
// ============================================================================

/// Structural facts about a guide body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    /// Text of the first `#` heading
    pub title: Option<String>,
    /// First paragraph before any `##` heading
    pub summary: Option<String>,
    /// `##` headings in document order
    pub sections: Vec<Section>,
    /// Referenced guide slugs, first occurrence order, no duplicates
    pub guide_refs: Vec<String>,
    pub word_count: usize,
}

enum SummaryTarget {
    Guide,
    Section(usize),
}

pub fn outline(body: &str) -> Outline {
    let events = parse_with_ids(body);
    let mut out = Outline::default();
    let mut target = Some(SummaryTarget::Guide);
    let mut heading: Option<(HeadingLevel, String, String)> = None;
    let mut paragraph: Option<String> = None;

    for event in &events {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                let id = id.as_deref().unwrap_or_default().to_string();
                heading = Some((*level, id, String::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                let Some((level, id, text)) = heading.take() else {
                    continue;
                };
                let label = collapse_whitespace(&text);
                match level {
                    HeadingLevel::H1 if out.title.is_none() => out.title = Some(label),
                    HeadingLevel::H2 => {
                        out.sections.push(Section {
                            id,
                            label,
                            summary: None,
                        });
                        target = Some(SummaryTarget::Section(out.sections.len() - 1));
                    }
                    _ => {}
                }
            }
            Event::Start(Tag::Paragraph) if heading.is_none() && target.is_some() => {
                paragraph = Some(String::new());
            }
            Event::End(TagEnd::Paragraph) => {
                let Some(text) = paragraph.take() else {
                    continue;
                };
                let text = collapse_whitespace(&text);
                if text.is_empty() {
                    continue;
                }
                match target.take() {
                    Some(SummaryTarget::Guide) => out.summary = Some(text),
                    Some(SummaryTarget::Section(idx)) => out.sections[idx].summary = Some(text),
                    None => {}
                }
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                if let Some(slug) = LinkTarget::parse(dest_url).guide_slug()
                    && !out.guide_refs.iter().any(|s| s == slug)
                {
                    out.guide_refs.push(slug.to_string());
                }
            }
            Event::Text(t) | Event::Code(t) => {
                out.word_count += t.split_whitespace().count();
                if let Some((_, _, buf)) = heading.as_mut() {
                    buf.push_str(t);
                } else if let Some(buf) = paragraph.as_mut() {
                    buf.push_str(t);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(buf) = paragraph.as_mut() {
                    buf.push(' ');
                }
            }
            _ => {}
        }
    }
    out
}

// ============================================================================
// Rendering (generate stage)
// ============================================================================

/// Lookup tables and link bases used while rendering a body.
#[derive(Debug, Clone, Copy)]
pub struct BodyContext<'a> {
    pub glossary: &'a Dictionary,
    pub materials: &'a Dictionary,
    pub links: &'a LinksConfig,
}

/// Content-completeness problems found while rendering. Never fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderWarning {
    MissingTerm { kind: TooltipKind, term: String },
    InvalidVideo { id: String },
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderWarning::MissingTerm { kind, term } => {
                write!(f, "{} entry {term:?} not found, rendered as plain text", kind.label())
            }
            RenderWarning::InvalidVideo { id } => {
                write!(f, "malformed YouTube id {id:?}, rendered as plain text")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedBody {
    pub html: String,
    pub warnings: Vec<RenderWarning>,
}

/// Render a guide body to HTML.
///
/// The first `#` heading is dropped (the page template renders the title),
/// and each `##` heading opens a `<section>` wrapper for the scroll
/// animation.
pub fn render_body(body: &str, ctx: &BodyContext<'_>) -> RenderedBody {
    let events = parse_with_ids(body);
    let mut out: Vec<Event<'_>> = Vec::with_capacity(events.len());
    let mut warnings = Vec::new();
    let mut section_open = false;
    let mut title_dropped = false;

    let mut iter = events.into_iter();
    while let Some(event) = iter.next() {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) if !title_dropped => {
                title_dropped = true;
                skip_until(&mut iter, |e| matches!(e, Event::End(TagEnd::Heading(_))));
            }
            Event::Start(Tag::Heading {
                level: HeadingLevel::H2,
                id,
                classes,
                attrs,
            }) => {
                if section_open {
                    out.push(Event::Html(CowStr::Borrowed("</section>\n")));
                }
                out.push(Event::Html(CowStr::from(format!(
                    "<section class=\"guide-section {}\">\n",
                    widgets::ANIMATE_CLASS
                ))));
                section_open = true;
                out.push(Event::Start(Tag::Heading {
                    level: HeadingLevel::H2,
                    id,
                    classes,
                    attrs,
                }));
            }
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => match LinkTarget::parse(&dest_url) {
                LinkTarget::Guide { slug, fragment } => {
                    let href = match fragment {
                        Some(fragment) => format!("/guides/{slug}#{fragment}"),
                        None => format!("/guides/{slug}"),
                    };
                    out.push(Event::Start(Tag::Link {
                        link_type,
                        dest_url: CowStr::from(href),
                        title,
                        id,
                    }));
                }
                LinkTarget::Glossary(key) => {
                    let label = collect_text(&mut iter, TagEnd::Link);
                    out.push(tooltip_event(
                        &label,
                        &key,
                        TooltipKind::Glossary,
                        ctx,
                        &mut warnings,
                    ));
                }
                LinkTarget::Material(key) => {
                    let label = collect_text(&mut iter, TagEnd::Link);
                    out.push(tooltip_event(
                        &label,
                        &key,
                        TooltipKind::Material,
                        ctx,
                        &mut warnings,
                    ));
                }
                LinkTarget::Product(kind, path) => {
                    let label = collect_text(&mut iter, TagEnd::Link);
                    let href = match kind {
                        ProductKind::Shop => ctx.links.shop(path),
                        ProductKind::Equipment => ctx.links.equipment(path),
                    };
                    let markup = widgets::product_link(&href, &label, kind);
                    out.push(Event::InlineHtml(CowStr::from(markup.into_string())));
                }
                LinkTarget::Other => out.push(Event::Start(Tag::Link {
                    link_type,
                    dest_url: dest_url.clone(),
                    title,
                    id,
                })),
            },
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => match dest_url.strip_prefix("youtube:").map(|v| v.trim().to_string()) {
                Some(video_id) => {
                    let label = collect_text(&mut iter, TagEnd::Image);
                    let markup = if widgets::is_youtube_id(&video_id) {
                        widgets::youtube_video(&video_id, &label)
                    } else {
                        warnings.push(RenderWarning::InvalidVideo { id: video_id });
                        html! { (label) }
                    };
                    out.push(Event::InlineHtml(CowStr::from(markup.into_string())));
                }
                None => out.push(Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                })),
            },
            other => out.push(other),
        }
    }
    if section_open {
        out.push(Event::Html(CowStr::Borrowed("</section>\n")));
    }

    let mut html = String::with_capacity(body.len() * 3 / 2);
    md_html::push_html(&mut html, out.into_iter());
    RenderedBody { html, warnings }
}

fn tooltip_event(
    label: &str,
    key: &str,
    kind: TooltipKind,
    ctx: &BodyContext<'_>,
    warnings: &mut Vec<RenderWarning>,
) -> Event<'static> {
    let key = if key.is_empty() { label } else { key };
    let dictionary = match kind {
        TooltipKind::Glossary => ctx.glossary,
        TooltipKind::Material => ctx.materials,
    };
    let entry = dictionary.lookup(key);
    if entry.is_none() {
        warnings.push(RenderWarning::MissingTerm {
            kind,
            term: key.to_string(),
        });
    }
    Event::InlineHtml(CowStr::from(widgets::tooltip(label, entry, kind).into_string()))
}

/// Consume events through the matching end tag, returning their plain text.
fn collect_text<'a>(iter: &mut impl Iterator<Item = Event<'a>>, end: TagEnd) -> String {
    let mut depth = 0usize;
    let mut text = String::new();
    for event in iter.by_ref() {
        match event {
            Event::Start(_) => depth += 1,
            Event::End(tag) if depth == 0 && tag == end => break,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    collapse_whitespace(&text)
}

fn skip_until<'a>(iter: &mut impl Iterator<Item = Event<'a>>, stop: impl Fn(&Event<'a>) -> bool) {
    for event in iter.by_ref() {
        if stop(&event) {
            break;
        }
    }
}

/// Render the markdown of a short field (FAQ answer) without widgets.
/// Raw HTML is shown as text.
pub fn render_inline(text: &str) -> String {
    let events = Parser::new_ext(text, options()).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut html = String::new();
    md_html::push_html(&mut html, events);
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::Entry;
    use std::path::Path;

    const BODY: &str = "\
# Grinding Guide

Grinding removes sectioning damage and produces a flat surface.

## Planar Grinding

Start with [SiC paper](shop:/abrasives/sic) at 220 grit.
See [sectioning](guide:sectioning) first.

## Fine Grinding {#fine}

Progress to finer grits and watch for [relief](glossary:).

## Planar Grinding

Duplicate heading text on purpose, back to [polishing](/guides/polishing#diamond).
";

    fn dicts() -> (Dictionary, Dictionary, LinksConfig) {
        let glossary = Dictionary::from_entries(
            [Entry {
                name: "Relief".to_string(),
                definition: "Height differences between phases.".to_string(),
                guide: None,
            }],
            Path::new("glossary.toml"),
        )
        .unwrap();
        let materials = Dictionary::from_entries(
            [Entry {
                name: "Ti-6Al-4V".to_string(),
                definition: "Alpha-beta titanium alloy.".to_string(),
                guide: Some("titanium".to_string()),
            }],
            Path::new("materials.toml"),
        )
        .unwrap();
        (glossary, materials, LinksConfig::default())
    }

    fn render(body: &str) -> RenderedBody {
        let (glossary, materials, links) = dicts();
        let ctx = BodyContext {
            glossary: &glossary,
            materials: &materials,
            links: &links,
        };
        render_body(body, &ctx)
    }

    #[test]
    fn outline_collects_title_summary_and_sections() {
        let o = outline(BODY);
        assert_eq!(o.title.as_deref(), Some("Grinding Guide"));
        assert_eq!(
            o.summary.as_deref(),
            Some("Grinding removes sectioning damage and produces a flat surface.")
        );
        let ids: Vec<&str> = o.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["planar-grinding", "fine", "planar-grinding-2"]);
        assert_eq!(o.sections[1].label, "Fine Grinding");
    }

    #[test]
    fn repeated_explicit_ids_are_suffixed() {
        let body = "## Cutting {#step}\n\na\n\n## Cleaning {#step}\n\nb\n\n## Step\n\nc\n";
        let o = outline(body);
        let ids: Vec<&str> = o.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["step", "step-2", "step-3"]);
    }

    #[test]
    fn faq_anchor_is_reserved() {
        let o = outline("## Frequently Asked Questions\n\nSee below.\n");
        assert_eq!(o.sections[0].id, "frequently-asked-questions-2");
    }

    #[test]
    fn outline_section_summary_is_first_paragraph() {
        let o = outline(BODY);
        assert_eq!(
            o.sections[0].summary.as_deref(),
            Some("Start with SiC paper at 220 grit. See sectioning first.")
        );
    }

    #[test]
    fn outline_collects_guide_refs_in_order() {
        let o = outline(BODY);
        assert_eq!(o.guide_refs, ["sectioning", "polishing"]);
    }

    #[test]
    fn outline_counts_words() {
        let o = outline("# T\n\none two three\n\n## S\n\nfour five");
        assert_eq!(o.word_count, 7);
    }

    #[test]
    fn outline_without_h2_has_no_sections() {
        let o = outline("Just a paragraph.");
        assert!(o.sections.is_empty());
        assert_eq!(o.summary.as_deref(), Some("Just a paragraph."));
        assert!(o.title.is_none());
    }

    #[test]
    fn rendered_anchors_match_outline_ids() {
        let o = outline(BODY);
        let r = render(BODY);
        for section in &o.sections {
            assert!(
                r.html.contains(&format!("id=\"{}\"", section.id)),
                "missing anchor {}",
                section.id
            );
        }
    }

    #[test]
    fn render_drops_title_heading() {
        let r = render(BODY);
        assert!(!r.html.contains("<h1"));
        assert!(!r.html.contains("Grinding Guide"));
    }

    #[test]
    fn render_wraps_sections() {
        let r = render(BODY);
        assert_eq!(r.html.matches("<section class=\"guide-section").count(), 3);
        assert_eq!(r.html.matches("</section>").count(), 3);
    }

    #[test]
    fn render_rewrites_guide_links() {
        let r = render(BODY);
        assert!(r.html.contains("href=\"/guides/sectioning\""));
        assert!(r.html.contains("href=\"/guides/polishing#diamond\""));
    }

    #[test]
    fn render_product_link_points_at_shop() {
        let r = render(BODY);
        assert!(r.html.contains("https://shop.example.com/abrasives/sic"));
        assert!(r.html.contains("product-link"));
        assert!(r.html.contains("rel=\"noopener noreferrer\""));
    }

    #[test]
    fn render_glossary_tooltip_uses_link_text_as_key() {
        let r = render(BODY);
        assert!(r.html.contains("Height differences between phases."));
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn render_material_tooltip_with_explicit_key() {
        let r = render("Airframes use [the alloy](material:ti-6al-4v).");
        assert!(r.html.contains("Alpha-beta titanium alloy."));
        assert!(r.html.contains("href=\"/guides/titanium\""));
    }

    #[test]
    fn missing_glossary_term_falls_back_to_text() {
        let r = render("[NonexistentTerm123](glossary:)");
        assert!(r.html.contains("NonexistentTerm123"));
        assert!(!r.html.contains("tooltip"));
        assert_eq!(
            r.warnings,
            [RenderWarning::MissingTerm {
                kind: TooltipKind::Glossary,
                term: "NonexistentTerm123".to_string()
            }]
        );
    }

    #[test]
    fn missing_term_text_is_escaped() {
        let r = render("[<b>x</b>](glossary:)");
        assert!(!r.html.contains("<b>x</b>"));
    }

    #[test]
    fn youtube_embed_and_fallback() {
        let ok = render("![Vibratory polishing demo](youtube:dQw4w9WgXcQ)");
        assert!(ok.html.contains("youtube-nocookie.com/embed/dQw4w9WgXcQ"));
        assert!(ok.warnings.is_empty());

        let bad = render("![Broken](youtube:short)");
        assert!(!bad.html.contains("iframe"));
        assert!(bad.html.contains("Broken"));
        assert!(matches!(bad.warnings[0], RenderWarning::InvalidVideo { .. }));
    }

    #[test]
    fn ordinary_links_pass_through() {
        let r = render("[ASTM E3](https://www.astm.org/e0003-11r17.html)");
        assert!(r.html.contains("href=\"https://www.astm.org/e0003-11r17.html\""));
    }

    #[test]
    fn link_target_parsing() {
        assert_eq!(
            LinkTarget::parse("/guides/etching/"),
            LinkTarget::Guide {
                slug: "etching",
                fragment: None
            }
        );
        assert_eq!(LinkTarget::parse("/guides/"), LinkTarget::Other);
        assert_eq!(LinkTarget::parse("/guides/a/b.png"), LinkTarget::Other);
        assert_eq!(
            LinkTarget::parse("glossary:Edge%20Retention"),
            LinkTarget::Glossary("Edge Retention".to_string())
        );
        assert_eq!(
            LinkTarget::parse("equipment:/saws"),
            LinkTarget::Product(ProductKind::Equipment, "/saws")
        );
    }

    #[test]
    fn render_inline_markdown() {
        assert!(render_inline("Use **diamond** paste.").contains("<strong>diamond</strong>"));
    }

    #[test]
    fn render_inline_escapes_raw_html() {
        let answer = "Rinse <img src=x onerror=alert(1)> well.\n\n<script>x</script>\n";
        let html = render_inline(answer);
        assert!(!html.contains("<img"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
