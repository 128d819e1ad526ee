//! Site configuration module.
//!
//! Handles loading, validating, and layering `config.toml`. Stock defaults are
//! the base layer, the content root's `config.toml` is merged on top, and CLI
//! overrides (such as `--base-url`) are merged last.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! assets_dir = "assets"     # Copied verbatim to the output root
//!
//! [site]
//! name = "Metallography Guides"
//! description = "Practical guides to metallographic sample preparation."
//! base_url = "https://guides.example.com"
//! locale = "en_US"          # Open Graph locale
//! language = "en"           # <html lang> and JSON-LD inLanguage
//! keywords = ["metallography", "sample preparation"]
//! # default_image = "/images/og-default.jpg"
//! # logo = "/images/logo.png"
//! # twitter_handle = "@example"
//!
//! [links]
//! shop_url = "https://shop.example.com"
//! equipment_url = "https://equipment.example.com"
//!
//! [cta]
//! enabled = true
//! heading = "Need consumables for your lab?"
//! text = "..."
//! button_label = "Browse the shop"
//! url = "https://shop.example.com"
//!
//! [colors.light]
//! background = "#ffffff"
//! ...
//!
//! [processing]
//! max_processes = 4         # Max parallel render workers (omit for auto)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Directory under the content root copied to the output root.
    pub assets_dir: String,
    /// Site identity used by the metadata and structured-data builders.
    pub site: SiteInfo,
    /// External shop and equipment-catalog subdomains.
    pub links: LinksConfig,
    /// Call-to-action block appended to every guide.
    pub cta: CtaConfig,
    /// Color schemes for light and dark modes.
    pub colors: ColorConfig,
    /// Parallel rendering settings.
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            assets_dir: "assets".to_string(),
            site: SiteInfo::default(),
            links: LinksConfig::default(),
            cta: CtaConfig::default(),
            colors: ColorConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.name.trim().is_empty() {
            return Err(ConfigError::Validation("site.name must not be empty".into()));
        }
        if self.site.locale.trim().is_empty() {
            return Err(ConfigError::Validation("site.locale must not be empty".into()));
        }
        for (key, url) in [
            ("site.base_url", &self.site.base_url),
            ("links.shop_url", &self.links.shop_url),
            ("links.equipment_url", &self.links.equipment_url),
        ] {
            if !is_absolute_http(url) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be an absolute http(s) URL, got {url:?}"
                )));
            }
        }
        if self.cta.enabled && !is_absolute_http(&self.cta.url) && !self.cta.url.starts_with('/') {
            return Err(ConfigError::Validation(
                "cta.url must be an absolute http(s) URL or a site path".into(),
            ));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.site.base_url.trim_end_matches('/')
    }

    /// Resolve a site path (or an already absolute URL) to an absolute URL.
    pub fn absolute_url(&self, path: &str) -> String {
        if is_absolute_http(path) {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url(), path)
        } else {
            format!("{}/{}", self.base_url(), path)
        }
    }
}

fn is_absolute_http(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// Site identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    /// Site name: suffix of every `<title>`, `og:site_name`, publisher name.
    pub name: String,
    /// Fallback meta description for pages without their own.
    pub description: String,
    /// Absolute origin all canonical URLs are built from.
    pub base_url: String,
    /// Open Graph locale, e.g. `en_US`.
    pub locale: String,
    /// Document language, e.g. `en`.
    pub language: String,
    /// Keywords appended to every page's keyword list.
    pub keywords: Vec<String>,
    /// Open Graph / Twitter image for pages without a hero image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_image: Option<String>,
    /// Publisher logo for Article structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    /// `twitter:site` handle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_handle: Option<String>,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            name: "Metallography Guides".to_string(),
            description: "Practical guides to metallographic sample preparation: sectioning, \
                          mounting, grinding, polishing and etching."
                .to_string(),
            base_url: "https://guides.example.com".to_string(),
            locale: "en_US".to_string(),
            language: "en".to_string(),
            keywords: vec![
                "metallography".to_string(),
                "sample preparation".to_string(),
            ],
            default_image: None,
            logo: None,
            twitter_handle: None,
        }
    }
}

/// External subdomains the product links point at.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinksConfig {
    /// Base of `shop:` links.
    pub shop_url: String,
    /// Base of `equipment:` links.
    pub equipment_url: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            shop_url: "https://shop.example.com".to_string(),
            equipment_url: "https://equipment.example.com".to_string(),
        }
    }
}

impl LinksConfig {
    pub fn shop(&self, path: &str) -> String {
        join_url(&self.shop_url, path)
    }

    pub fn equipment(&self, path: &str) -> String {
        join_url(&self.equipment_url, path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CtaConfig {
    pub enabled: bool,
    pub heading: String,
    pub text: String,
    pub button_label: String,
    pub url: String,
}

impl Default for CtaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            heading: "Equip your preparation lab".to_string(),
            text: "Consumables and equipment for every step covered in these guides."
                .to_string(),
            button_label: "Browse the shop".to_string(),
            url: "https://shop.example.com".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel render workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    pub light: ColorScheme,
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    pub background: String,
    /// Cards, side navigation, tooltips.
    pub surface: String,
    pub text: String,
    /// Breadcrumbs, captions, side navigation.
    pub text_muted: String,
    pub border: String,
    pub link: String,
    pub link_hover: String,
    /// Active section marker, CTA button.
    pub accent: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            surface: "#f4f5f7".to_string(),
            text: "#1b1e23".to_string(),
            text_muted: "#5f6670".to_string(),
            border: "#dde0e4".to_string(),
            link: "#1d4f91".to_string(),
            link_hover: "#0f2f5c".to_string(),
            accent: "#c0561b".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#111318".to_string(),
            surface: "#1b1e25".to_string(),
            text: "#e8e9eb".to_string(),
            text_muted: "#9aa1ab".to_string(),
            border: "#2e323b".to_string(),
            link: "#8ab4f0".to_string(),
            link_hover: "#c1d7f7".to_string(),
            accent: "#f08a4b".to_string(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Overrides supplied on the command line, applied after `config.toml`.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub base_url: Option<String>,
}

impl CliOverrides {
    fn to_value(&self) -> Option<toml::Value> {
        let base_url = self.base_url.as_ref()?;
        let mut site = toml::map::Map::new();
        site.insert("base_url".to_string(), toml::Value::String(base_url.clone()));
        let mut root = toml::map::Map::new();
        root.insert("site".to_string(), toml::Value::Table(site));
        Some(toml::Value::Table(root))
    }
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    load_config_with(root, &CliOverrides::default())
}

/// Like [`load_config`], with CLI overrides as the topmost layer.
pub fn load_config_with(root: &Path, overrides: &CliOverrides) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let layers = load_raw_config(root)?
        .into_iter()
        .chain(overrides.to_value());
    resolve_config(base, layers)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Metallography Guides Configuration
# ==================================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Directory under the content root copied verbatim to the output root.
assets_dir = "assets"

# ---------------------------------------------------------------------------
# Site identity (titles, canonical URLs, Open Graph, JSON-LD publisher)
# ---------------------------------------------------------------------------
[site]
name = "Metallography Guides"
description = "Practical guides to metallographic sample preparation: sectioning, mounting, grinding, polishing and etching."
# Absolute origin. Canonical URLs are {base_url}/guides/{slug}.
base_url = "https://guides.example.com"
locale = "en_US"
language = "en"
# Appended to every page's keyword list.
keywords = ["metallography", "sample preparation"]
# Image used by Open Graph / Twitter cards when a guide has none.
# default_image = "/images/og-default.jpg"
# Publisher logo in Article structured data.
# logo = "/images/logo.png"
# twitter_handle = "@example"

# ---------------------------------------------------------------------------
# External links: `shop:/path` and `equipment:/path` in guide bodies
# ---------------------------------------------------------------------------
[links]
shop_url = "https://shop.example.com"
equipment_url = "https://equipment.example.com"

# ---------------------------------------------------------------------------
# Call to action appended to every guide
# ---------------------------------------------------------------------------
[cta]
enabled = true
heading = "Equip your preparation lab"
text = "Consumables and equipment for every step covered in these guides."
button_label = "Browse the shop"
url = "https://shop.example.com"

# ---------------------------------------------------------------------------
# Colors - Light mode (prefers-color-scheme: light)
# ---------------------------------------------------------------------------
[colors.light]
background = "#ffffff"
surface = "#f4f5f7"
text = "#1b1e23"
text_muted = "#5f6670"
border = "#dde0e4"
link = "#1d4f91"
link_hover = "#0f2f5c"
accent = "#c0561b"

# ---------------------------------------------------------------------------
# Colors - Dark mode (prefers-color-scheme: dark)
# ---------------------------------------------------------------------------
[colors.dark]
background = "#111318"
surface = "#1b1e25"
text = "#e8e9eb"
text_muted = "#9aa1ab"
border = "#2e323b"
link = "#8ab4f0"
link_hover = "#c1d7f7"
accent = "#f08a4b"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel page-render workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

/// Generate CSS custom properties from color config.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        ":root {{\n{}}}\n\n@media (prefers-color-scheme: dark) {{\n    :root {{\n{}    }}\n}}",
        scheme_properties(&colors.light, "    "),
        scheme_properties(&colors.dark, "        "),
    )
}

fn scheme_properties(scheme: &ColorScheme, indent: &str) -> String {
    [
        ("bg", &scheme.background),
        ("surface", &scheme.surface),
        ("text", &scheme.text),
        ("text-muted", &scheme.text_muted),
        ("border", &scheme.border),
        ("link", &scheme.link),
        ("link-hover", &scheme.link_hover),
        ("accent", &scheme.accent),
    ]
    .iter()
    .map(|(name, value)| format!("{indent}--color-{name}: {value};\n"))
    .collect()
}
