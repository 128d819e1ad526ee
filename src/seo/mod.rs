//! Search-engine metadata for guide pages.
//!
//! | Module | Produces |
//! |--------|----------|
//! | [`metadata`] | `<title>`, meta description, keywords, canonical link, Open Graph, Twitter Card |
//! | [`structured_data`] | JSON-LD documents: Article, Course, BreadcrumbList, HowTo, FAQPage |
//!
//! Both builders are pure functions of a [`Guide`] and the [`SiteConfig`], and
//! share the helpers below so the title, description and URL are identical
//! in every place they appear on a page.

pub mod metadata;
pub mod structured_data;

pub use metadata::{PageMetadata, guide_metadata};
pub use structured_data::{StructuredData, guide_structured_data, to_json_ld};

use crate::config::SiteConfig;
use crate::types::Guide;

/// Meta descriptions longer than this are cut at a word boundary.
pub const DESCRIPTION_LIMIT: usize = 160;

/// Description used by every metadata block of a guide page.
///
/// Sidecar description, else the body's first paragraph, else the site
/// description.
pub fn resolve_description(guide: &Guide, config: &SiteConfig) -> String {
    let text = guide.blurb().unwrap_or(&config.site.description);
    truncate_words(text, DESCRIPTION_LIMIT)
}

/// Cut `text` to at most `max` characters at a word boundary, appending `…`.
pub fn truncate_words(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    let trimmed = match cut.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => &cut[..pos],
        _ => cut.as_str(),
    };
    format!("{}…", trimmed.trim_end_matches([',', ';', ':', '.', ' ']))
}

/// Canonical URL of a guide page.
pub fn canonical_url(guide: &Guide, config: &SiteConfig) -> String {
    config.absolute_url(&guide.path())
}

/// One step of the breadcrumb trail.
#[derive(Debug, Clone, PartialEq)]
pub struct Crumb {
    pub name: String,
    pub path: String,
}

/// Home → Guides → guide title. The last name equals the page `<h1>`.
pub fn breadcrumb_trail(guide: &Guide) -> Vec<Crumb> {
    vec![
        Crumb {
            name: "Home".to_string(),
            path: "/".to_string(),
        },
        Crumb {
            name: "Guides".to_string(),
            path: "/guides/".to_string(),
        },
        Crumb {
            name: guide.title.clone(),
            path: guide.path(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::guide;
    use crate::types::Category;

    #[test]
    fn description_prefers_sidecar() {
        let mut g = guide("etching", Category::Process, 50);
        g.description = Some("Reveal microstructure.".to_string());
        g.summary = Some("Body summary.".to_string());
        assert_eq!(
            resolve_description(&g, &SiteConfig::default()),
            "Reveal microstructure."
        );
    }

    #[test]
    fn description_falls_back_to_summary_then_site() {
        let config = SiteConfig::default();
        let mut g = guide("etching", Category::Process, 50);
        g.description = Some("   ".to_string());
        g.summary = Some("Body summary.".to_string());
        assert_eq!(resolve_description(&g, &config), "Body summary.");

        g.summary = None;
        assert_eq!(resolve_description(&g, &config), config.site.description);
    }

    #[test]
    fn empty_description_uses_summary() {
        let mut g = guide("etching", Category::Process, 50);
        g.description = Some(String::new());
        g.summary = Some("Body summary.".to_string());
        assert_eq!(
            resolve_description(&g, &SiteConfig::default()),
            "Body summary."
        );
    }

    #[test]
    fn long_descriptions_are_cut_at_words() {
        let text = "word ".repeat(60);
        let cut = truncate_words(text.trim(), DESCRIPTION_LIMIT);
        assert!(cut.chars().count() <= DESCRIPTION_LIMIT);
        assert!(cut.ends_with("word…"));
    }

    #[test]
    fn short_descriptions_untouched() {
        assert_eq!(truncate_words("Short.", 160), "Short.");
    }

    #[test]
    fn breadcrumb_ends_with_guide_title() {
        let mut g = guide("aerospace-applications", Category::ApplicationSpecific, 110);
        g.title = "Aerospace Applications Guide".to_string();
        let trail = breadcrumb_trail(&g);
        assert_eq!(trail.len(), 3);
        assert_eq!(trail[2].name, "Aerospace Applications Guide");
        assert_eq!(trail[2].path, "/guides/aerospace-applications");
    }
}
