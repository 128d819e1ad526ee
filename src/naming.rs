//! Slug rules for guide files and in-page anchors.
//!
//! Guide files follow an `NNN-slug.md` convention: the optional numeric prefix
//! orders the guide in listings, the remainder is the URL slug. Slugs double
//! as registry keys, so they are restricted to lowercase ASCII letters,
//! digits, and single interior hyphens.
//!
//! - `010-sectioning` → order 10, slug `sectioning`
//! - `110-aerospace-applications` → order 110, slug `aerospace-applications`
//! - `draft-notes` → unordered (hidden from listings), slug `draft-notes`

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum NameError {
    #[error("empty slug in {0:?}")]
    Empty(String),
    #[error("slug {slug:?} in {stem:?} must be lowercase letters, digits and single hyphens")]
    NotUrlSafe { stem: String, slug: String },
}

/// Parsed guide file stem.
#[derive(Debug, Clone, PartialEq)]
pub struct GuideFileName {
    /// Number prefix if present
    pub order: Option<u32>,
    pub slug: String,
}

impl GuideFileName {
    /// Fallback title when neither sidecar nor body supplies one.
    pub fn fallback_title(&self) -> String {
        self.slug.replace('-', " ")
    }
}

/// Parse a guide file stem such as `030-grinding`.
pub fn parse_guide_file_name(stem: &str) -> Result<GuideFileName, NameError> {
    let (order, slug) = match stem.split_once('-') {
        Some((prefix, rest))
            if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            (prefix.parse::<u32>().ok(), rest)
        }
        _ => (None, stem),
    };
    if slug.is_empty() {
        return Err(NameError::Empty(stem.to_string()));
    }
    if !is_url_safe_slug(slug) {
        return Err(NameError::NotUrlSafe {
            stem: stem.to_string(),
            slug: slug.to_string(),
        });
    }
    Ok(GuideFileName {
        order,
        slug: slug.to_string(),
    })
}

/// Lowercase ASCII alphanumerics separated by single hyphens.
pub fn is_url_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Turn heading text into an anchor id.
///
/// Non-alphanumeric runs collapse to one hyphen; non-ASCII letters are
/// dropped. Returns `"section"` if nothing usable remains.
pub fn slugify(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut pending_dash = false;
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c.is_ascii_punctuation() {
            pending_dash = true;
        }
    }
    if out.is_empty() {
        "section".to_string()
    } else {
        out
    }
}
