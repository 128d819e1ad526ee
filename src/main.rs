use clap::{Parser, Subcommand};
use metallography_guides::config::{self, CliOverrides};
use metallography_guides::{generate, output, scan, serve};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "metallography-guides")]
#[command(about = "Static site generator for metallography guides")]
#[command(long_about = "\
Static site generator for metallography guides

Each markdown file under guides/ becomes a guide page with search metadata,
JSON-LD structured data, side navigation, tooltips and related guides.

Content structure:

  content/
  ├── config.toml                  # Site config (optional)
  ├── glossary.toml                # [[term]] name, definition, guide?
  ├── materials.toml               # [[material]] name, definition, guide?
  ├── assets/                      # Copied to the output root
  └── guides/
      ├── 010-sectioning.md        # Guide (numbered = listed, ordered)
      ├── 010-sectioning.toml      # Sidecar: title, category, related, faq, ...
      └── draft-notes.md           # No number prefix = rendered, not listed

Link schemes in guide bodies:
  [text](guide:slug#section)   internal guide link (validated)
  [text](glossary:)            glossary tooltip, link text is the key
  [text](material:Name)        material tooltip
  [text](shop:/path)           shop product link
  [text](equipment:/path)      equipment catalog link
  ![title](youtube:VIDEO_ID)   embedded video

Run 'metallography-guides gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (manifest)
    #[arg(long, default_value = ".guides-temp", global = true)]
    temp_dir: PathBuf,

    /// Override site.base_url from config.toml
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan content directory into a manifest
    Scan,
    /// Produce the HTML site from the manifest
    Generate,
    /// Run the full pipeline: scan → generate
    Build,
    /// Validate content and render in memory without writing
    Check {
        /// Fail on render warnings (missing glossary terms, bad video ids)
        #[arg(long)]
        strict: bool,
    },
    /// Render in memory and serve over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    let overrides = CliOverrides {
        base_url: cli.base_url.clone(),
    };

    match cli.command {
        Command::Scan => {
            let manifest = scan::scan_with(&cli.source, &overrides)?;
            write_manifest(&manifest, &cli.temp_dir)?;
            output::print_scan_output(&manifest, &cli.source);
        }
        Command::Generate => {
            let mut manifest = generate::load_manifest(&cli.temp_dir.join("manifest.json"))?;
            if let Some(base_url) = &cli.base_url {
                manifest.config.site.base_url = base_url.clone();
                manifest.config.validate()?;
            }
            init_thread_pool(&manifest.config.processing);
            let site = generate::render_site(&manifest, &cli.source)?;
            generate::write_site(&site, &cli.output)?;
            output::print_generate_output(&manifest, &site);
        }
        Command::Build => {
            std::fs::create_dir_all(&cli.temp_dir)?;

            println!("==> Stage 1: Scanning {}", cli.source.display());
            let manifest = scan::scan_with(&cli.source, &overrides)?;
            write_manifest(&manifest, &cli.temp_dir)?;
            output::print_scan_output(&manifest, &cli.source);

            println!("==> Stage 2: Generating HTML → {}", cli.output.display());
            init_thread_pool(&manifest.config.processing);
            let site = generate::render_site(&manifest, &cli.source)?;
            generate::write_site(&site, &cli.output)?;
            output::print_generate_output(&manifest, &site);

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check { strict } => {
            println!("==> Checking {}", cli.source.display());
            let manifest = scan::scan_with(&cli.source, &overrides)?;
            output::print_scan_output(&manifest, &cli.source);
            init_thread_pool(&manifest.config.processing);
            let site = generate::render_site(&manifest, &cli.source)?;
            let warnings = output::format_warnings(&site.warnings);
            if !warnings.is_empty() {
                println!();
                for line in warnings {
                    println!("{}", line);
                }
            }
            if strict && !site.warnings.is_empty() {
                let count = site.warnings.len();
                return Err(format!("{count} render warning(s) in strict mode").into());
            }
            println!("==> Content is valid");
        }
        Command::Serve { addr } => {
            // Canonical links point at the local server unless overridden
            let overrides = CliOverrides {
                base_url: cli.base_url.clone().or_else(|| Some(format!("http://{addr}"))),
            };
            let manifest = scan::scan_with(&cli.source, &overrides)?;
            init_thread_pool(&manifest.config.processing);
            let site = generate::render_site(&manifest, &cli.source)?;
            for w in &site.warnings {
                tracing::warn!(page = %w.page, "{}", w.warning);
            }
            tracing::info!(
                guides = manifest.guides.len(),
                files = site.files.len(),
                "Rendered {}",
                cli.source.display()
            );
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(serve::run(site, addr))?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "metallography_guides=info,tower_http=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn write_manifest(
    manifest: &metallography_guides::types::Manifest,
    temp_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(temp_dir)?;
    let json = serde_json::to_string_pretty(manifest)?;
    std::fs::write(temp_dir.join("manifest.json"), json)?;
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
