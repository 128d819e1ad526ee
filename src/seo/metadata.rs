//! Page metadata: everything that goes into `<head>` besides JSON-LD.

use super::{canonical_url, resolve_description, truncate_words, DESCRIPTION_LIMIT};
use crate::config::SiteConfig;
use crate::types::{Guide, GuideImage};
use maud::{Markup, html};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct PageMetadata {
    /// Document `<title>`
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub canonical_url: String,
    pub open_graph: OpenGraph,
    pub twitter: TwitterCard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenGraph {
    /// `og:type`: `article` for guides, `website` otherwise
    pub kind: &'static str,
    pub title: String,
    pub description: String,
    pub url: String,
    pub site_name: String,
    pub locale: String,
    pub image: Option<SocialImage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SocialImage {
    /// Absolute URL
    pub url: String,
    pub alt: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TwitterCard {
    pub card: &'static str,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub site: Option<String>,
}

/// Inputs for pages that are not guides (home, index, 404).
#[derive(Debug, Clone, Copy)]
pub struct PageInfo<'a> {
    /// Page heading; `None` for the home page, which uses the site name alone
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub path: &'a str,
}

/// `"{page} | {site}"`, or just the site name.
fn document_title(page_title: Option<&str>, config: &SiteConfig) -> String {
    match page_title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) if title != config.site.name => format!("{title} | {}", config.site.name),
        _ => config.site.name.clone(),
    }
}

/// Merge keyword lists, dropping case-insensitive duplicates and blanks.
fn merge_keywords<'a>(lists: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    lists
        .into_iter()
        .map(str::trim)
        .filter(|k| !k.is_empty() && seen.insert(k.to_lowercase()))
        .map(str::to_string)
        .collect()
}

fn social_image(image: Option<&GuideImage>, config: &SiteConfig) -> Option<SocialImage> {
    match image {
        Some(image) => Some(SocialImage {
            url: config.absolute_url(&image.src),
            alt: Some(image.alt.clone()).filter(|a| !a.is_empty()),
            width: image.width,
            height: image.height,
        }),
        None => config.site.default_image.as_ref().map(|src| SocialImage {
            url: config.absolute_url(src),
            alt: None,
            width: None,
            height: None,
        }),
    }
}

/// Fields shared by guide and non-guide pages before the Open Graph and
/// Twitter blocks are derived from them.
struct Draft {
    og_title: String,
    title: String,
    description: String,
    keywords: Vec<String>,
    url: String,
    kind: &'static str,
    image: Option<SocialImage>,
}

impl Draft {
    fn finish(self, config: &SiteConfig) -> PageMetadata {
        let twitter = TwitterCard {
            card: if self.image.is_some() {
                "summary_large_image"
            } else {
                "summary"
            },
            title: self.og_title.clone(),
            description: self.description.clone(),
            image: self.image.as_ref().map(|i| i.url.clone()),
            site: config.site.twitter_handle.clone(),
        };
        PageMetadata {
            title: self.title,
            description: self.description.clone(),
            keywords: self.keywords,
            canonical_url: self.url.clone(),
            open_graph: OpenGraph {
                kind: self.kind,
                title: self.og_title,
                description: self.description,
                url: self.url,
                site_name: config.site.name.clone(),
                locale: config.site.locale.clone(),
                image: self.image,
            },
            twitter,
        }
    }
}

/// Metadata for a guide page. Never fails; absent fields fall back to site
/// defaults.
pub fn guide_metadata(guide: &Guide, config: &SiteConfig) -> PageMetadata {
    let keywords = merge_keywords(
        guide
            .keywords
            .iter()
            .map(String::as_str)
            .chain([guide.category.label()])
            .chain(config.site.keywords.iter().map(String::as_str)),
    );
    let og_title = if guide.title.trim().is_empty() {
        config.site.name.clone()
    } else {
        guide.title.clone()
    };
    Draft {
        og_title,
        title: document_title(Some(guide.title.as_str()), config),
        description: resolve_description(guide, config),
        keywords,
        url: canonical_url(guide, config),
        kind: "article",
        image: social_image(guide.image.as_ref(), config),
    }
    .finish(config)
}

/// Metadata for a non-guide page.
pub fn page_metadata(page: PageInfo<'_>, config: &SiteConfig) -> PageMetadata {
    let description = page
        .description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(&config.site.description);
    Draft {
        og_title: page.title.unwrap_or(&config.site.name).to_string(),
        title: document_title(page.title, config),
        description: truncate_words(description, DESCRIPTION_LIMIT),
        keywords: merge_keywords(config.site.keywords.iter().map(String::as_str)),
        url: config.absolute_url(page.path),
        kind: "website",
        image: social_image(None, config),
    }
    .finish(config)
}

impl PageMetadata {
    /// `<head>` tags for this metadata.
    pub fn head_tags(&self) -> Markup {
        let og = &self.open_graph;
        let tw = &self.twitter;
        html! {
            title { (self.title) }
            meta name="description" content=(self.description);
            @if !self.keywords.is_empty() {
                meta name="keywords" content=(self.keywords.join(", "));
            }
            link rel="canonical" href=(self.canonical_url);
            meta property="og:type" content=(og.kind);
            meta property="og:title" content=(og.title);
            meta property="og:description" content=(og.description);
            meta property="og:url" content=(og.url);
            meta property="og:site_name" content=(og.site_name);
            meta property="og:locale" content=(og.locale);
            @if let Some(image) = &og.image {
                meta property="og:image" content=(image.url);
                @if let Some(alt) = &image.alt {
                    meta property="og:image:alt" content=(alt);
                }
                @if let Some(width) = image.width {
                    meta property="og:image:width" content=(width);
                }
                @if let Some(height) = image.height {
                    meta property="og:image:height" content=(height);
                }
            }
            meta name="twitter:card" content=(tw.card);
            meta name="twitter:title" content=(tw.title);
            meta name="twitter:description" content=(tw.description);
            @if let Some(image) = &tw.image {
                meta name="twitter:image" content=(image);
            }
            @if let Some(site) = &tw.site {
                meta name="twitter:site" content=(site);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::guide;
    use crate::types::Category;

    fn aerospace() -> Guide {
        let mut g = guide("aerospace-applications", Category::ApplicationSpecific, 110);
        g.title = "Aerospace Applications Guide".to_string();
        g.description = Some("Preparing titanium and nickel superalloys.".to_string());
        g.keywords = vec!["titanium".to_string(), "Metallography".to_string()];
        g
    }

    #[test]
    fn guide_title_and_canonical() {
        let meta = guide_metadata(&aerospace(), &SiteConfig::default());
        assert_eq!(meta.title, "Aerospace Applications Guide | Metallography Guides");
        assert_eq!(
            meta.canonical_url,
            "https://guides.example.com/guides/aerospace-applications"
        );
        assert_eq!(meta.open_graph.url, meta.canonical_url);
        assert_eq!(meta.open_graph.title, "Aerospace Applications Guide");
        assert_eq!(meta.open_graph.kind, "article");
    }

    #[test]
    fn keywords_merge_and_dedupe() {
        let meta = guide_metadata(&aerospace(), &SiteConfig::default());
        assert_eq!(
            meta.keywords,
            [
                "titanium",
                "Metallography",
                "Application-Specific",
                "sample preparation"
            ]
        );
    }

    #[test]
    fn guide_image_becomes_large_card() {
        let mut g = aerospace();
        g.image = Some(GuideImage {
            src: "/images/turbine-blade.jpg".to_string(),
            alt: "Etched turbine blade".to_string(),
            width: Some(1200),
            height: Some(630),
        });
        let meta = guide_metadata(&g, &SiteConfig::default());
        let image = meta.open_graph.image.as_ref().unwrap();
        assert_eq!(image.url, "https://guides.example.com/images/turbine-blade.jpg");
        assert_eq!(image.width, Some(1200));
        assert_eq!(meta.twitter.card, "summary_large_image");
    }

    #[test]
    fn no_image_is_summary_card() {
        let meta = guide_metadata(&aerospace(), &SiteConfig::default());
        assert!(meta.open_graph.image.is_none());
        assert_eq!(meta.twitter.card, "summary");
    }

    #[test]
    fn default_image_fallback() {
        let mut config = SiteConfig::default();
        config.site.default_image = Some("/images/og.jpg".to_string());
        let meta = guide_metadata(&aerospace(), &config);
        assert_eq!(
            meta.twitter.image.as_deref(),
            Some("https://guides.example.com/images/og.jpg")
        );
    }

    #[test]
    fn empty_title_defaults_to_site_name() {
        let mut g = aerospace();
        g.title = String::new();
        let meta = guide_metadata(&g, &SiteConfig::default());
        assert_eq!(meta.title, "Metallography Guides");
        assert_eq!(meta.open_graph.title, "Metallography Guides");
    }

    #[test]
    fn head_tags_escape_content() {
        let mut g = aerospace();
        g.description = Some("Ni \"superalloys\" & <Ti>".to_string());
        let head = guide_metadata(&g, &SiteConfig::default()).head_tags().into_string();
        assert!(head.contains("&quot;superalloys&quot; &amp; &lt;Ti&gt;"));
        assert!(head.contains("<link rel=\"canonical\""));
        assert!(head.contains("property=\"og:locale\" content=\"en_US\""));
    }

    #[test]
    fn home_page_uses_site_name() {
        let meta = page_metadata(
            PageInfo {
                title: None,
                description: None,
                path: "/",
            },
            &SiteConfig::default(),
        );
        assert_eq!(meta.title, "Metallography Guides");
        assert_eq!(meta.canonical_url, "https://guides.example.com/");
        assert_eq!(meta.open_graph.kind, "website");
    }
}
