//! Shared types used across pipeline stages.
//!
//! These types are serialized to `manifest.json` by the scan stage and read
//! back by the generate stage, so both sides see the same shape.

use crate::config::SiteConfig;
use crate::dictionary::Dictionary;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Guide category. Controls grouping on the index pages and the
/// `articleSection` of the Article structured data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    #[default]
    #[serde(alias = "basics")]
    Basics,
    #[serde(alias = "process")]
    Process,
    #[serde(rename = "Material-Specific", alias = "material-specific")]
    MaterialSpecific,
    #[serde(rename = "Application-Specific", alias = "application-specific")]
    ApplicationSpecific,
}

impl Category {
    /// Display order on index pages.
    pub const ALL: [Category; 4] = [
        Category::Basics,
        Category::Process,
        Category::MaterialSpecific,
        Category::ApplicationSpecific,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Basics => "Basics",
            Category::Process => "Process",
            Category::MaterialSpecific => "Material-Specific",
            Category::ApplicationSpecific => "Application-Specific",
        }
    }

    /// Anchor id used for the category blocks on index pages.
    pub fn anchor(self) -> &'static str {
        match self {
            Category::Basics => "basics",
            Category::Process => "process",
            Category::MaterialSpecific => "material-specific",
            Category::ApplicationSpecific => "application-specific",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An in-page section, taken from a `##` heading of the guide body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Anchor id (explicit `{#id}` attribute or slugified label)
    pub id: String,
    /// Heading text
    pub label: String,
    /// Plain text of the first paragraph under the heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Hero image reference. Only path and presentation metadata; the file is
/// served as a static asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuideImage {
    pub src: String,
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}

/// A single guide record, keyed by slug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guide {
    /// URL slug (filename stem with number prefix stripped)
    pub slug: String,
    /// Sidecar title, first `# heading`, or slug with dashes → spaces
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// First paragraph of the body, plain text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Declared related guides, in display order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,
    pub sections: Vec<Section>,
    /// Guide slugs linked from the body
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub guide_refs: Vec<String>,
    /// Step-by-step procedure: sections become HowTo steps
    #[serde(default)]
    pub procedure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<GuideImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faq: Vec<FaqItem>,
    pub word_count: usize,
    /// Raw markdown body
    pub body: String,
    /// Content-relative source path, for CLI output
    pub source_path: String,
    /// Whether the guide appears in listings (has number prefix)
    pub in_nav: bool,
    /// Sort key from number prefix
    pub sort_key: u32,
}

impl Guide {
    /// Site-relative URL path of the guide page.
    pub fn path(&self) -> String {
        format!("/guides/{}", self.slug)
    }

    /// Sidecar description, if it has any text.
    pub fn description(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }

    /// Short text for cards and meta tags: description, else body summary.
    pub fn blurb(&self) -> Option<&str> {
        self.description().or_else(|| non_blank(self.summary.as_deref()))
    }

    /// Estimated reading time at 200 words per minute, at least one minute.
    pub fn reading_minutes(&self) -> usize {
        self.word_count.div_ceil(200).max(1)
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

/// Output of the scan stage.
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub guides: Vec<Guide>,
    #[serde(default)]
    pub glossary: Dictionary,
    #[serde(default)]
    pub materials: Dictionary,
    pub config: SiteConfig,
}
