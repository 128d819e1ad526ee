mod common;

use metallography_guides::generate::{self, render_site};
use metallography_guides::registry::GuideRegistry;
use metallography_guides::scan::{self, ScanError};
use std::fs;

fn html(site: &generate::Site, path: &str) -> String {
    String::from_utf8(site.get(path).unwrap().to_vec()).unwrap()
}

#[test]
fn fixture_content_builds_without_warnings() {
    let content = common::fixture_content();
    let manifest = scan::scan(content.path()).unwrap();
    let site = render_site(&manifest, content.path()).unwrap();

    assert!(site.warnings.is_empty(), "{:?}", site.warnings);
    assert_eq!(site.page_count(), manifest.guides.len() + 3);
    assert!(site.get("favicon.svg").is_some());
    assert!(site.get("images/grinding-wheel.svg").is_some());
}

#[test]
fn every_guide_reference_resolves() {
    let content = common::fixture_content();
    let manifest = scan::scan(content.path()).unwrap();
    let registry = GuideRegistry::new(&manifest.guides).unwrap();
    registry
        .validate_references(&manifest.glossary, &manifest.materials)
        .unwrap();

    for guide in &manifest.guides {
        for slug in guide.related.iter().chain(&guide.guide_refs) {
            assert!(registry.contains(slug), "{} → {slug}", guide.slug);
        }
    }
}

#[test]
fn tooltips_and_product_links_rendered() {
    let content = common::fixture_content();
    let manifest = scan::scan(content.path()).unwrap();
    let site = render_site(&manifest, content.path()).unwrap();

    let grinding = html(&site, "guides/grinding/index.html");
    assert!(grinding.contains("https://shop.example.org/abrasives/sic-paper"));
    assert!(grinding.contains("Subsurface damage introduced by cutting"));
    assert!(grinding.contains("dQw4w9WgXcQ"));
    assert!(grinding.contains("href=\"/guides/polishing#diamond-polishing\""));

    let titanium = html(&site, "guides/titanium/index.html");
    assert!(titanium.contains("Alpha-beta titanium alloy"));
}

#[test]
fn canonical_urls_use_configured_base() {
    let content = common::fixture_content();
    let manifest = scan::scan(content.path()).unwrap();
    let site = render_site(&manifest, content.path()).unwrap();

    let etching = html(&site, "guides/etching/index.html");
    assert!(etching.contains("https://guides.example.org/guides/etching"));
    let sitemap = html(&site, "sitemap.xml");
    assert_eq!(sitemap.matches("<url>").count(), 9);
    assert!(!sitemap.contains("draft-notes"));
}

#[test]
fn renamed_guide_fails_scan() {
    let content = common::fixture_content();
    let guides = content.path().join("guides");
    fs::rename(guides.join("040-polishing.md"), guides.join("040-lapping.md")).unwrap();
    fs::rename(guides.join("040-polishing.toml"), guides.join("040-lapping.toml")).unwrap();

    let err = scan::scan(content.path()).unwrap_err();
    assert!(matches!(err, ScanError::Registry(_)));
    let message = err.to_string();
    assert!(message.contains("grinding (related) → polishing"), "{message}");
}

#[test]
fn scan_then_generate_through_manifest() {
    let content = common::fixture_content();
    let temp = tempfile::TempDir::new().unwrap();
    let out = tempfile::TempDir::new().unwrap();

    let manifest = scan::scan(content.path()).unwrap();
    let manifest_path = temp.path().join("manifest.json");
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest).unwrap()).unwrap();

    let site = generate::generate(&manifest_path, content.path(), out.path()).unwrap();
    assert!(out.path().join("index.html").is_file());
    assert!(out.path().join("guides/aerospace-applications/index.html").is_file());
    assert!(out.path().join("images/og-default.svg").is_file());
    assert_eq!(
        fs::read(out.path().join("robots.txt")).unwrap(),
        site.get("robots.txt").unwrap()
    );
}
