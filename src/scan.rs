//! Content scanning and manifest generation.
//!
//! Stage 1 of the build pipeline. Reads the content directory, builds one
//! [`Guide`] record per markdown file, loads the dictionaries and the site
//! config, and checks referential integrity before anything is rendered.
//!
//! ## Directory Structure
//!
//! ```text
//! content/
//! ├── config.toml                  # Site configuration (optional)
//! ├── glossary.toml                # [[term]] entries (optional)
//! ├── materials.toml               # [[material]] entries (optional)
//! ├── assets/                      # Copied verbatim to the output root
//! └── guides/
//!     ├── 010-sectioning.md        # Numbered = listed, sorted by number
//!     ├── 010-sectioning.toml      # Sidecar: title, category, related, faq, …
//!     ├── 030-grinding.md
//!     └── draft-notes.md           # Unnumbered = rendered but not listed
//! ```
//!
//! ## Sidecar
//!
//! ```toml
//! title = "Grinding Guide"
//! description = "From planar grinding to the last SiC step."
//! category = "Process"
//! keywords = ["SiC paper", "planar grinding"]
//! related = ["sectioning", "polishing"]
//! procedure = true                 # sections become HowTo steps
//! level = "Beginner"
//! published = 2024-03-01
//!
//! [image]
//! src = "/images/grinding.svg"
//! alt = "Grinding wheel with SiC paper"
//!
//! [[faq]]
//! question = "Which grit should I start with?"
//! answer = "The finest grit that removes sectioning damage in about a minute."
//! ```
//!
//! Every key is optional; unknown keys are an error.
//!
//! ## Validation
//!
//! - Slugs must be URL-safe and unique
//! - Every `related` slug, in-body guide link and dictionary `guide` key must
//!   name an existing guide (all offenders are reported together)

use crate::config::{self, CliOverrides};
use crate::dictionary::{self, DictionaryError};
use crate::markdown;
use crate::naming::{self, NameError};
use crate::registry::{GuideRegistry, RegistryError};
use crate::types::{Category, FaqItem, Guide, GuideImage, Manifest};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Guides directory under the content root.
pub const GUIDES_DIR: &str = "guides";

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),
    #[error("Invalid guide file name {path}: {source}")]
    Name { path: PathBuf, source: NameError },
    #[error("Invalid sidecar {path}: {source}")]
    Sidecar {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Per-guide metadata from `NNN-slug.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct GuideSidecar {
    title: Option<String>,
    description: Option<String>,
    category: Option<Category>,
    keywords: Vec<String>,
    related: Vec<String>,
    procedure: bool,
    level: Option<String>,
    image: Option<GuideImage>,
    published: Option<toml::value::Datetime>,
    modified: Option<toml::value::Datetime>,
    faq: Vec<FaqItem>,
}

pub fn scan(root: &Path) -> Result<Manifest, ScanError> {
    scan_with(root, &CliOverrides::default())
}

/// Scan with CLI config overrides applied on top of `config.toml`.
pub fn scan_with(root: &Path, overrides: &CliOverrides) -> Result<Manifest, ScanError> {
    let config = config::load_config_with(root, overrides)?;
    let glossary = dictionary::load_glossary(root)?;
    let materials = dictionary::load_materials(root)?;

    let mut guides = parse_guides(root)?;
    guides.sort_by(|a, b| {
        (!a.in_nav, a.sort_key, &a.slug).cmp(&(!b.in_nav, b.sort_key, &b.slug))
    });

    let registry = GuideRegistry::new(&guides)?;
    registry.validate_references(&glossary, &materials)?;

    Ok(Manifest {
        guides,
        glossary,
        materials,
        config,
    })
}

/// Parse every `.md` file in `guides/`. A missing directory means no guides.
fn parse_guides(root: &Path) -> Result<Vec<Guide>, ScanError> {
    let dir = root.join(GUIDES_DIR);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut md_files: Vec<PathBuf> = fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && !p
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with('.'))
                && p.extension()
                    .map(|e| e.eq_ignore_ascii_case("md"))
                    .unwrap_or(false)
        })
        .collect();
    md_files.sort();

    md_files.iter().map(|path| parse_guide(root, path)).collect()
}

fn parse_guide(root: &Path, md_path: &Path) -> Result<Guide, ScanError> {
    let stem = md_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = naming::parse_guide_file_name(&stem).map_err(|source| ScanError::Name {
        path: md_path.to_path_buf(),
        source,
    })?;

    let body = fs::read_to_string(md_path)?;
    let sidecar = load_sidecar(&md_path.with_extension("toml"))?;
    let outline = markdown::outline(&body);

    let title = sidecar
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or(outline.title)
        .unwrap_or_else(|| name.fallback_title());
    let source_path = md_path
        .strip_prefix(root)
        .unwrap_or(md_path)
        .to_string_lossy()
        .to_string();

    Ok(Guide {
        slug: name.slug,
        title,
        description: sidecar.description.filter(|d| !d.trim().is_empty()),
        summary: outline.summary,
        category: sidecar.category.unwrap_or_default(),
        keywords: sidecar.keywords,
        related: sidecar.related,
        sections: outline.sections,
        guide_refs: outline.guide_refs,
        procedure: sidecar.procedure,
        level: sidecar.level,
        image: sidecar.image,
        published: sidecar.published.map(|d| d.to_string()),
        modified: sidecar.modified.map(|d| d.to_string()),
        faq: sidecar.faq,
        word_count: outline.word_count,
        body,
        source_path,
        in_nav: name.order.is_some(),
        sort_key: name.order.unwrap_or(u32::MAX),
    })
}

fn load_sidecar(path: &Path) -> Result<GuideSidecar, ScanError> {
    if !path.exists() {
        return Ok(GuideSidecar::default());
    }
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|source| ScanError::Sidecar {
        path: path.to_path_buf(),
        source,
    })
}
