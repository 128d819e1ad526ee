//! CLI output formatting for the pipeline stages.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every guide leads with
//! its positional index and title; filesystem paths follow as indented
//! `Source:` lines, so the output reads as a content inventory while still
//! tracing back to files.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Guides
//! Basics
//!     001 Sectioning Guide (4 sections)
//!         Source: guides/010-sectioning.md
//!         Sidecar: guides/010-sectioning.toml
//!         Related: mounting
//! Process
//!     003 Grinding Guide (3 sections, procedure, 2 FAQ)
//!         Source: guides/030-grinding.md
//!
//! Unlisted
//!     draft notes
//!         Source: guides/draft-notes.md
//!
//! Dictionaries
//!     glossary.toml (5 terms)
//!     materials.toml (3 materials)
//!
//! Config
//!     config.toml
//!     assets/
//! ```
//!
//! ## Generate
//!
//! ```text
//! Home → index.html
//! Guides → guides/index.html
//! 001 Sectioning Guide → guides/sectioning/index.html
//!
//! Unlisted
//!     draft notes → guides/draft-notes/index.html
//!
//! Warnings
//!     guides/grinding/index.html: glossary entry "Smear" not found, rendered as plain text
//!
//! Generated 8 guide pages, 3 other pages, 2 assets, 1 warning
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O besides existence checks on the content root.

use crate::generate::{Site, SiteWarning, guide_output_path};
use crate::types::{Guide, Manifest};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// `(4 sections, procedure, 2 FAQ)`; empty parts are left out.
fn guide_details(guide: &Guide) -> String {
    let mut parts = vec![plural(guide.sections.len(), "section", "sections")];
    if guide.procedure {
        parts.push("procedure".to_string());
    }
    if !guide.faq.is_empty() {
        parts.push(format!("{} FAQ", guide.faq.len()));
    }
    format!("({})", parts.join(", "))
}

/// Listed guides in manifest order, then unlisted ones.
fn split_listed(manifest: &Manifest) -> (Vec<&Guide>, Vec<&Guide>) {
    manifest.guides.iter().partition(|g| g.in_nav)
}

// ============================================================================
// Stage 1: Scan output
// ============================================================================

/// Format scan stage output: listed guides by category, unlisted guides,
/// dictionaries and config sources.
pub fn format_scan_output(manifest: &Manifest, source_root: &Path) -> Vec<String> {
    let mut lines = vec!["Guides".to_string()];
    let (listed, unlisted) = split_listed(manifest);

    let mut current_category = None;
    let mut ordered: Vec<(usize, &Guide)> = listed.iter().copied().enumerate().collect();
    ordered.sort_by_key(|(pos, g)| (g.category, *pos));
    for (pos, guide) in ordered {
        if current_category != Some(guide.category) {
            lines.push(guide.category.label().to_string());
            current_category = Some(guide.category);
        }
        lines.push(format!(
            "    {} {} {}",
            format_index(pos + 1),
            guide.title,
            guide_details(guide)
        ));
        lines.extend(source_lines(guide, source_root, "        "));
    }

    if !unlisted.is_empty() {
        lines.push(String::new());
        lines.push("Unlisted".to_string());
        for guide in unlisted {
            lines.push(format!("    {}", guide.title));
            lines.extend(source_lines(guide, source_root, "        "));
        }
    }

    lines.push(String::new());
    lines.push("Dictionaries".to_string());
    lines.push(format!(
        "    glossary.toml ({})",
        plural(manifest.glossary.len(), "term", "terms")
    ));
    lines.push(format!(
        "    materials.toml ({})",
        plural(manifest.materials.len(), "material", "materials")
    ));

    lines.push(String::new());
    lines.push("Config".to_string());
    if source_root.join("config.toml").exists() {
        lines.push("    config.toml".to_string());
    }
    if source_root.join(&manifest.config.assets_dir).is_dir() {
        lines.push(format!("    {}/", manifest.config.assets_dir));
    }

    lines
}

fn source_lines(guide: &Guide, source_root: &Path, indent: &str) -> Vec<String> {
    let mut lines = vec![format!("{indent}Source: {}", guide.source_path)];
    let sidecar = Path::new(&guide.source_path).with_extension("toml");
    if source_root.join(&sidecar).exists() {
        lines.push(format!("{indent}Sidecar: {}", sidecar.to_string_lossy()));
    }
    if !guide.related.is_empty() {
        lines.push(format!("{indent}Related: {}", guide.related.join(", ")));
    }
    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(manifest: &Manifest, source_root: &Path) {
    for line in format_scan_output(manifest, source_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Generate output
// ============================================================================

/// Format render warnings, one per line, grouped under a heading.
pub fn format_warnings(warnings: &[SiteWarning]) -> Vec<String> {
    if warnings.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["Warnings".to_string()];
    lines.extend(
        warnings
            .iter()
            .map(|w| format!("    {}: {}", w.page, w.warning)),
    );
    lines
}

/// Format generate stage output: every page with its output path, then
/// warnings and totals.
pub fn format_generate_output(manifest: &Manifest, site: &Site) -> Vec<String> {
    let mut lines = vec![
        "Home → index.html".to_string(),
        "Guides → guides/index.html".to_string(),
    ];
    let (listed, unlisted) = split_listed(manifest);
    for (i, guide) in listed.iter().enumerate() {
        lines.push(format!(
            "{} {} → {}",
            format_index(i + 1),
            guide.title,
            guide_output_path(guide)
        ));
    }
    if !unlisted.is_empty() {
        lines.push(String::new());
        lines.push("Unlisted".to_string());
        for guide in &unlisted {
            lines.push(format!("    {} → {}", guide.title, guide_output_path(guide)));
        }
    }

    let warnings = format_warnings(&site.warnings);
    if !warnings.is_empty() {
        lines.push(String::new());
        lines.extend(warnings);
    }

    let guide_pages = manifest.guides.len();
    let other_pages = site.page_count().saturating_sub(guide_pages);
    let assets = site
        .files
        .keys()
        .filter(|p| !p.ends_with(".html") && *p != "sitemap.xml" && *p != "robots.txt")
        .count();
    lines.push(String::new());
    lines.push(format!(
        "Generated {}, {}, {}, {}",
        plural(guide_pages, "guide page", "guide pages"),
        plural(other_pages, "other page", "other pages"),
        plural(assets, "asset", "assets"),
        plural(site.warnings.len(), "warning", "warnings"),
    ));
    lines
}

/// Print generate output to stdout.
pub fn print_generate_output(manifest: &Manifest, site: &Site) {
    for line in format_generate_output(manifest, site) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
