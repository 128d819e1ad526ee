//! HTML site generation.
//!
//! Stage 2 of the build pipeline. Takes the scan manifest and renders the
//! complete site into memory ([`render_site`]); [`write_site`] puts it on
//! disk and the `serve` command serves it directly.
//!
//! ## Generated Files
//!
//! ```text
//! dist/
//! ├── index.html                   # Home: intro + listed guides by category
//! ├── 404.html
//! ├── sitemap.xml                  # Canonical URL of every listed page
//! ├── robots.txt
//! ├── guides/
//! │   ├── index.html               # All listed guides by category
//! │   ├── sectioning/index.html    # One page per guide
//! │   └── ...
//! └── images/...                   # Copied from content/assets/
//! ```
//!
//! Every guide goes through the same template: breadcrumb, title block, side
//! navigation, body, FAQ, related guides, CTA. Guides supply content only.
//!
//! ## CSS and JavaScript
//!
//! Embedded at compile time and inlined into every page:
//! - `static/style.css`: base styles (color variables generated from config)
//! - `static/guide.js`: side-nav scroll-spy and the one-shot reveal animation
//!
//! Guide pages render in parallel on the rayon pool; every other page is
//! cheap and rendered inline.

use crate::config::{self, SiteConfig};
use crate::markdown::{self, BodyContext, RenderWarning};
use crate::registry::{GuideRegistry, RegistryError};
use crate::seo::metadata::{PageInfo, page_metadata};
use crate::seo::{
    PageMetadata, breadcrumb_trail, guide_metadata, guide_structured_data, to_json_ld,
};
use crate::types::{Category, Guide, Manifest};
use crate::widgets;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Asset walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Asset {0} would overwrite a generated file")]
    AssetConflict(String),
}

const CSS_STATIC: &str = include_str!("../static/style.css");
const JS: &str = include_str!("../static/guide.js");

/// Content of `<meta name="generator">`.
pub const GENERATOR: &str = concat!("metallography-guides ", env!("CARGO_PKG_VERSION"));

/// A render warning and the page it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteWarning {
    pub page: String,
    pub warning: RenderWarning,
}

/// The rendered site, keyed by output-relative path (`guides/x/index.html`).
#[derive(Debug, Default)]
pub struct Site {
    pub files: BTreeMap<String, Vec<u8>>,
    pub warnings: Vec<SiteWarning>,
}

impl Site {
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// Number of HTML pages.
    pub fn page_count(&self) -> usize {
        self.files.keys().filter(|p| p.ends_with(".html")).count()
    }
}

struct RenderedPage {
    path: String,
    html: String,
    warnings: Vec<RenderWarning>,
}

/// Output path of a guide page.
pub fn guide_output_path(guide: &Guide) -> String {
    format!("guides/{}/index.html", guide.slug)
}

/// Render the whole site in memory.
///
/// `source_root` is the content directory; only its assets are read.
pub fn render_site(manifest: &Manifest, source_root: &Path) -> Result<Site, GenerateError> {
    let config = &manifest.config;
    let registry = GuideRegistry::new(&manifest.guides)?;
    let ctx = BodyContext {
        glossary: &manifest.glossary,
        materials: &manifest.materials,
        links: &config.links,
    };
    let css = format!("{}\n\n{}", config::generate_color_css(&config.colors), CSS_STATIC);

    let guides: Vec<&Guide> = registry.guides().collect();
    let pages = guides
        .par_iter()
        .map(|guide| render_guide_page(guide, &registry, &ctx, config, &css))
        .collect::<Result<Vec<_>, _>>()?;

    let mut site = Site::default();
    for page in pages {
        tracing::debug!(page = %page.path, "rendered guide");
        site.warnings
            .extend(page.warnings.into_iter().map(|warning| SiteWarning {
                page: page.path.clone(),
                warning,
            }));
        site.files.insert(page.path, page.html.into_bytes());
    }

    let groups = registry.by_category();
    site.files.insert(
        "index.html".to_string(),
        render_home(&groups, config, &css).into_string().into_bytes(),
    );
    site.files.insert(
        "guides/index.html".to_string(),
        render_guide_index(&groups, config, &css).into_string().into_bytes(),
    );
    site.files.insert(
        "404.html".to_string(),
        render_not_found(config, &css).into_string().into_bytes(),
    );
    site.files
        .insert("sitemap.xml".to_string(), render_sitemap(&registry, config).into_bytes());
    site.files
        .insert("robots.txt".to_string(), render_robots(config).into_bytes());

    collect_assets(&source_root.join(&config.assets_dir), &mut site.files)?;
    Ok(site)
}

/// Write every file of `site` under `output_dir`.
pub fn write_site(site: &Site, output_dir: &Path) -> Result<(), GenerateError> {
    fs::create_dir_all(output_dir)?;
    for (path, bytes) in &site.files {
        let target = output_dir.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, bytes)?;
    }
    Ok(())
}

/// Read a manifest written by the scan stage.
pub fn load_manifest(manifest_path: &Path) -> Result<Manifest, GenerateError> {
    let manifest_content = fs::read_to_string(manifest_path)?;
    Ok(serde_json::from_str(&manifest_content)?)
}

/// Read a scan manifest, render it and write the site.
pub fn generate(
    manifest_path: &Path,
    source_root: &Path,
    output_dir: &Path,
) -> Result<Site, GenerateError> {
    let manifest = load_manifest(manifest_path)?;
    let site = render_site(&manifest, source_root)?;
    write_site(&site, output_dir)?;
    Ok(site)
}

/// Add every non-hidden file under `assets_dir` to `files`. A missing
/// directory adds nothing; an asset at a generated path is an error.
fn collect_assets(
    assets_dir: &Path,
    files: &mut BTreeMap<String, Vec<u8>>,
) -> Result<(), GenerateError> {
    if !assets_dir.is_dir() {
        return Ok(());
    }
    let walker = WalkDir::new(assets_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(assets_dir)
            .unwrap_or(entry.path())
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if files.contains_key(&rel) {
            return Err(GenerateError::AssetConflict(rel));
        }
        files.insert(rel, fs::read(entry.path())?);
    }
    Ok(())
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure.
fn base_document(
    meta: &PageMetadata,
    config: &SiteConfig,
    css: &str,
    json_ld: &[String],
    indexable: bool,
    body_class: &str,
    content: Markup,
) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(config.site.language) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                (meta.head_tags())
                @if !indexable {
                    meta name="robots" content="noindex";
                }
                meta name="generator" content=(GENERATOR);
                style { (PreEscaped(css)) }
                @for doc in json_ld {
                    script type="application/ld+json" { (PreEscaped(doc)) }
                }
            }
            body class=(body_class) {
                (site_header(config))
                (content)
                (site_footer(config))
                script { (PreEscaped(JS)) }
            }
        }
    }
}

fn site_header(config: &SiteConfig) -> Markup {
    html! {
        header.site-header {
            a.site-name href="/" { (config.site.name) }
            nav.site-nav aria-label="Main" {
                a href="/guides/" { "Guides" }
                a href=(config.links.shop_url) target="_blank" rel="noopener noreferrer" { "Shop" }
                a href=(config.links.equipment_url) target="_blank" rel="noopener noreferrer" {
                    "Equipment"
                }
            }
        }
    }
}

fn site_footer(config: &SiteConfig) -> Markup {
    html! {
        footer.site-footer {
            nav aria-label="Footer" {
                a href="/guides/" { "All guides" }
                a href=(config.links.shop_url) target="_blank" rel="noopener noreferrer" {
                    "Consumables shop"
                }
                a href=(config.links.equipment_url) target="_blank" rel="noopener noreferrer" {
                    "Equipment catalog"
                }
            }
            p.copyright { (config.site.name) }
        }
    }
}

/// Breadcrumb trail; the last item is the current page and not a link.
fn breadcrumb(guide: &Guide) -> Markup {
    let trail = breadcrumb_trail(guide);
    let last = trail.len().saturating_sub(1);
    html! {
        nav.breadcrumb aria-label="Breadcrumb" {
            ol {
                @for (i, crumb) in trail.iter().enumerate() {
                    li {
                        @if i == last {
                            span aria-current="page" { (crumb.name) }
                        } @else {
                            a href=(crumb.path) { (crumb.name) }
                        }
                    }
                }
            }
        }
    }
}

/// Listed guides grouped by category, each category anchored by its id.
fn category_sections(groups: &[(Category, Vec<&Guide>)]) -> Markup {
    html! {
        @for (category, guides) in groups {
            section.category id=(category.anchor()) {
                h2 { (category.label()) }
                div.guide-grid {
                    @for guide in guides {
                        (widgets::guide_card(guide))
                    }
                }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

fn render_guide_page(
    guide: &Guide,
    registry: &GuideRegistry<'_>,
    ctx: &BodyContext<'_>,
    config: &SiteConfig,
    css: &str,
) -> Result<RenderedPage, GenerateError> {
    let meta = guide_metadata(guide, config);
    let json_ld = guide_structured_data(guide, config)
        .iter()
        .map(to_json_ld)
        .collect::<Result<Vec<_>, _>>()?;
    let body = markdown::render_body(&guide.body, ctx);
    let related = registry.related(guide);

    let content = html! {
        main.guide-page {
            (breadcrumb(guide))
            article.guide {
                header.guide-header {
                    p.guide-category {
                        a href={ "/guides/#" (guide.category.anchor()) } {
                            (guide.category.label())
                        }
                    }
                    h1 { (guide.title) }
                    @if let Some(description) = guide.description() {
                        p.guide-lede { (description) }
                    }
                    p.guide-meta {
                        (guide.reading_minutes()) " min read"
                        @if let Some(level) = &guide.level {
                            " · " (level)
                        }
                    }
                    @if let Some(image) = &guide.image {
                        img.guide-hero src=(image.src) alt=(image.alt)
                            width=[image.width] height=[image.height];
                    }
                }
                div.guide-layout {
                    (widgets::side_nav(&guide.sections))
                    div.guide-body {
                        (PreEscaped(body.html))
                        (widgets::faq_accordion(&guide.faq, markdown::render_inline))
                    }
                }
            }
            @if !related.is_empty() {
                (widgets::animate_on_scroll(html! {
                    section.related-guides {
                        h2 { "Related guides" }
                        div.guide-grid {
                            @for other in &related {
                                (widgets::guide_card(other))
                            }
                        }
                    }
                }))
            }
            (widgets::cta(&config.cta))
        }
    };

    let html = base_document(&meta, config, css, &json_ld, guide.in_nav, "guide", content);
    Ok(RenderedPage {
        path: guide_output_path(guide),
        html: html.into_string(),
        warnings: body.warnings,
    })
}

fn render_home(groups: &[(Category, Vec<&Guide>)], config: &SiteConfig, css: &str) -> Markup {
    let meta = page_metadata(
        PageInfo {
            title: None,
            description: None,
            path: "/",
        },
        config,
    );
    let content = html! {
        main.home-page {
            section.hero {
                h1 { (config.site.name) }
                p.hero-text { (config.site.description) }
                a.hero-button href="/guides/" { "Browse all guides" }
            }
            (category_sections(groups))
            (widgets::cta(&config.cta))
        }
    };
    base_document(&meta, config, css, &[], true, "home", content)
}

fn render_guide_index(
    groups: &[(Category, Vec<&Guide>)],
    config: &SiteConfig,
    css: &str,
) -> Markup {
    let meta = page_metadata(
        PageInfo {
            title: Some("All guides"),
            description: None,
            path: "/guides/",
        },
        config,
    );
    let content = html! {
        main.index-page {
            h1 { "All guides" }
            @if groups.len() > 1 {
                nav.category-jump aria-label="Categories" {
                    @for (category, _) in groups {
                        a href={ "#" (category.anchor()) } { (category.label()) }
                    }
                }
            }
            (category_sections(groups))
        }
    };
    base_document(&meta, config, css, &[], true, "index", content)
}

fn render_not_found(config: &SiteConfig, css: &str) -> Markup {
    let meta = page_metadata(
        PageInfo {
            title: Some("Page not found"),
            description: None,
            path: "/404.html",
        },
        config,
    );
    let content = html! {
        main.not-found {
            h1 { "Page not found" }
            p { "The page you were looking for does not exist or has moved." }
            a href="/guides/" { "Browse all guides" }
        }
    };
    base_document(&meta, config, css, &[], false, "not-found", content)
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Sitemap of the home page, the index and every listed guide.
fn render_sitemap(registry: &GuideRegistry<'_>, config: &SiteConfig) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    let fixed: [(String, Option<&String>); 2] =
        ["/", "/guides/"].map(|path| (config.absolute_url(path), None));
    let guides = registry
        .guides()
        .filter(|g| g.in_nav)
        .map(|g| (config.absolute_url(&g.path()), g.modified.as_ref().or(g.published.as_ref())));
    for (loc, lastmod) in fixed.into_iter().chain(guides) {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", xml_escape(&loc)));
        if let Some(lastmod) = lastmod {
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", xml_escape(lastmod)));
        }
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

fn render_robots(config: &SiteConfig) -> String {
    format!(
        "User-agent: *\nAllow: /\n\nSitemap: {}\n",
        config.absolute_url("/sitemap.xml")
    )
}
