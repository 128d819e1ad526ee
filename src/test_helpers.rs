//! Shared test utilities.
//!
//! Builders for in-memory guide records, plus fixture setup and lookup
//! helpers that work with scan-stage data (`Manifest`, `Guide`).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let manifest = scan(tmp.path()).unwrap();
//!
//! let guide = find_guide(&manifest, "grinding");
//! assert_eq!(guide.title, "Grinding Guide");
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::types::{Category, Guide, Manifest};

// =========================================================================
// Record builders
// =========================================================================

/// Minimal guide record. `u32::MAX` as the sort key marks it hidden.
pub fn guide(slug: &str, category: Category, sort_key: u32) -> Guide {
    Guide {
        slug: slug.to_string(),
        title: slug.replace('-', " "),
        description: None,
        summary: None,
        category,
        keywords: Vec::new(),
        related: Vec::new(),
        sections: Vec::new(),
        guide_refs: Vec::new(),
        procedure: false,
        level: None,
        image: None,
        published: None,
        modified: None,
        faq: Vec::new(),
        word_count: 0,
        body: String::new(),
        source_path: format!("guides/{slug}.md"),
        in_nav: sort_key != u32::MAX,
        sort_key,
    }
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Write a guide (and optional sidecar) into a content root.
pub fn write_guide(root: &Path, stem: &str, body: &str, sidecar: Option<&str>) {
    let dir = root.join("guides");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{stem}.md")), body).unwrap();
    if let Some(sidecar) = sidecar {
        std::fs::write(dir.join(format!("{stem}.toml")), sidecar).unwrap();
    }
}

// =========================================================================
// Manifest lookups
// =========================================================================

/// Find a guide by slug. Panics if not found.
pub fn find_guide<'a>(manifest: &'a Manifest, slug: &str) -> &'a Guide {
    manifest
        .guides
        .iter()
        .find(|g| g.slug == slug)
        .unwrap_or_else(|| {
            let slugs = guide_slugs(manifest);
            panic!("guide '{slug}' not found. Available: {slugs:?}")
        })
}

/// All guide slugs in manifest order.
pub fn guide_slugs(manifest: &Manifest) -> Vec<&str> {
    manifest.guides.iter().map(|g| g.slug.as_str()).collect()
}
