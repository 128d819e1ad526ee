//! # Metallography Guides
//!
//! A static site generator for a library of metallography guides: sample
//! preparation procedures, material-specific advice, application notes.
//! Each guide is a markdown file plus an optional TOML sidecar; every page is
//! rendered through one shared template with search metadata, JSON-LD
//! structured data, side navigation, glossary tooltips and related guides.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! ```text
//! 1. Scan      content/  →  manifest.json   (files → validated guide records)
//! 2. Generate  manifest  →  dist/           (HTML, sitemap, robots, assets)
//!    Serve     content/  →  HTTP            (scan + render in memory, axum)
//! ```
//!
//! The manifest is human-readable JSON, so each stage can be inspected and
//! tested on its own. Rendering is a pure function of the manifest; the only
//! file reads after scanning are the static assets.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: reads guides, sidecars and dictionaries, checks references, produces the manifest |
//! | [`generate`] | Stage 2: renders every page with Maud, guide pages in parallel |
//! | [`serve`] | axum server over the in-memory site, with ETags and a 404 page |
//! | [`registry`] | Slug → guide lookups, related guides, referential integrity |
//! | [`seo`] | Page metadata (title, description, Open Graph, Twitter) and JSON-LD |
//! | [`markdown`] | Outline extraction and body rendering with custom link schemes |
//! | [`widgets`] | Side nav, tooltips, product links, video, FAQ, CTA, guide cards |
//! | [`dictionary`] | Glossary and materials loaded from TOML |
//! | [`config`] | `config.toml` loading, validation, layering and CSS generation |
//! | [`types`] | Records serialized between stages (`Guide`, `Manifest`) |
//! | [`naming`] | `NNN-slug` file name convention and anchor slugs |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Lookups Return Option, Integrity Is Checked Once
//!
//! Renderers never assume a slug exists: [`registry::GuideRegistry`] returns
//! `Option`/`Result`, and the scan stage runs
//! [`registry::GuideRegistry::validate_references`] so a renamed guide fails
//! the build with every dangling reference listed, rather than producing a
//! broken page.
//!
//! ## Missing Dictionary Terms Degrade
//!
//! A glossary or material link to an unknown term renders as plain text and
//! is reported as a warning. `check --strict` turns warnings into a failure.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/): templates are
//! checked at compile time and every interpolation is escaped. JSON-LD is
//! built from typed serde structs, never by string concatenation.

pub mod config;
pub mod dictionary;
pub mod generate;
pub mod markdown;
pub mod naming;
pub mod output;
pub mod registry;
pub mod scan;
pub mod seo;
pub mod serve;
pub mod types;
pub mod widgets;

#[cfg(test)]
pub(crate) mod test_helpers;
