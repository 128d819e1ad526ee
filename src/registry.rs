//! Guide registry: slug → guide lookups over the scanned guides.
//!
//! Every renderer reads guides through the registry. Lookups return
//! `Option`/`Result` rather than assuming presence; the scan stage calls
//! [`GuideRegistry::validate_references`] so a renamed slug fails the build
//! instead of producing a broken page.

use crate::dictionary::Dictionary;
use crate::types::{Category, Guide};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Same-category guides shown when a guide declares no related guides.
const FALLBACK_RELATED: usize = 3;

#[derive(Error, Debug, PartialEq)]
pub enum RegistryError {
    #[error("no guide with slug {0:?}")]
    UnknownSlug(String),
    #[error("duplicate guide slug {slug:?} ({first} and {second})")]
    DuplicateSlug {
        slug: String,
        first: String,
        second: String,
    },
    #[error("{} dangling guide reference(s):\n{}", .0.len(), format_dangling(.0))]
    DanglingReferences(Vec<DanglingReference>),
}

fn format_dangling(refs: &[DanglingReference]) -> String {
    refs.iter()
        .map(|r| format!("  {r}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Where a missing slug was referenced from.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceSource {
    /// A guide's sidecar `related` list
    Related(String),
    /// A link in a guide body
    Body(String),
    /// A `glossary.toml` entry's `guide` key
    Glossary(String),
    /// A `materials.toml` entry's `guide` key
    Material(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DanglingReference {
    pub from: ReferenceSource,
    pub slug: String,
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.from {
            ReferenceSource::Related(from) => {
                write!(f, "{from} (related) → {}", self.slug)
            }
            ReferenceSource::Body(from) => write!(f, "{from} (body link) → {}", self.slug),
            ReferenceSource::Glossary(name) => {
                write!(f, "glossary.toml {name:?} → {}", self.slug)
            }
            ReferenceSource::Material(name) => {
                write!(f, "materials.toml {name:?} → {}", self.slug)
            }
        }
    }
}

/// Read-only index over a set of guides.
#[derive(Debug)]
pub struct GuideRegistry<'a> {
    by_slug: BTreeMap<&'a str, &'a Guide>,
    /// Listing order: nav guides by sort key, then hidden guides by slug.
    ordered: Vec<&'a Guide>,
}

impl<'a> GuideRegistry<'a> {
    /// Index the guides, rejecting duplicate slugs.
    pub fn new(guides: &'a [Guide]) -> Result<Self, RegistryError> {
        let mut by_slug: BTreeMap<&'a str, &'a Guide> = BTreeMap::new();
        for guide in guides {
            if let Some(existing) = by_slug.insert(guide.slug.as_str(), guide) {
                return Err(RegistryError::DuplicateSlug {
                    slug: guide.slug.clone(),
                    first: existing.source_path.clone(),
                    second: guide.source_path.clone(),
                });
            }
        }
        let mut ordered: Vec<&'a Guide> = guides.iter().collect();
        ordered.sort_by(|a, b| {
            (!a.in_nav, a.sort_key, &a.slug).cmp(&(!b.in_nav, b.sort_key, &b.slug))
        });
        Ok(Self { by_slug, ordered })
    }

    /// Guide for `slug`, or `None`.
    pub fn get_guide_by_slug(&self, slug: &str) -> Option<&'a Guide> {
        self.by_slug.get(slug).copied()
    }

    /// Guide for `slug`, treating absence as an error.
    pub fn require(&self, slug: &str) -> Result<&'a Guide, RegistryError> {
        self.get_guide_by_slug(slug)
            .ok_or_else(|| RegistryError::UnknownSlug(slug.to_string()))
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.by_slug.contains_key(slug)
    }

    pub fn len(&self) -> usize {
        self.by_slug.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_slug.is_empty()
    }

    /// All guides in listing order.
    pub fn guides(&self) -> impl Iterator<Item = &'a Guide> + '_ {
        self.ordered.iter().copied()
    }

    /// Nav-visible guides grouped by category, categories in display order,
    /// empty categories omitted.
    pub fn by_category(&self) -> Vec<(Category, Vec<&'a Guide>)> {
        Category::ALL
            .iter()
            .filter_map(|&category| {
                let guides: Vec<&'a Guide> = self
                    .guides()
                    .filter(|g| g.in_nav && g.category == category)
                    .collect();
                (!guides.is_empty()).then_some((category, guides))
            })
            .collect()
    }

    /// Guides to cross-link from `guide`.
    ///
    /// Declared related guides in declared order (unknown and self references
    /// skipped); otherwise up to three nav-visible guides from the same
    /// category.
    pub fn related(&self, guide: &Guide) -> Vec<&'a Guide> {
        if !guide.related.is_empty() {
            return guide
                .related
                .iter()
                .filter(|slug| **slug != guide.slug)
                .filter_map(|slug| self.get_guide_by_slug(slug))
                .collect();
        }
        self.guides()
            .filter(|g| g.in_nav && g.category == guide.category && g.slug != guide.slug)
            .take(FALLBACK_RELATED)
            .collect()
    }

    /// Check that every slug referenced by a guide or dictionary entry exists.
    ///
    /// Reports all dangling references at once: guides in listing order,
    /// then glossary entries, then materials.
    pub fn validate_references(
        &self,
        glossary: &Dictionary,
        materials: &Dictionary,
    ) -> Result<(), RegistryError> {
        let mut dangling = Vec::new();
        for guide in self.guides() {
            for slug in &guide.related {
                if !self.contains(slug) {
                    dangling.push(DanglingReference {
                        from: ReferenceSource::Related(guide.slug.clone()),
                        slug: slug.clone(),
                    });
                }
            }
            for slug in &guide.guide_refs {
                if !self.contains(slug) {
                    dangling.push(DanglingReference {
                        from: ReferenceSource::Body(guide.slug.clone()),
                        slug: slug.clone(),
                    });
                }
            }
        }
        let entries = glossary
            .entries()
            .map(|e| (e, ReferenceSource::Glossary(e.name.clone())))
            .chain(
                materials
                    .entries()
                    .map(|e| (e, ReferenceSource::Material(e.name.clone()))),
            );
        for (entry, from) in entries {
            if let Some(slug) = &entry.guide
                && !self.contains(slug)
            {
                dangling.push(DanglingReference {
                    from,
                    slug: slug.clone(),
                });
            }
        }
        if dangling.is_empty() {
            Ok(())
        } else {
            Err(RegistryError::DanglingReferences(dangling))
        }
    }
}
