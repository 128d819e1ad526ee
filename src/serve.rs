//! Local HTTP server over an in-memory [`Site`].
//!
//! Paths resolve the way a static host would serve the `dist/` tree:
//!
//! | Request | File |
//! |---|---|
//! | `/` | `index.html` |
//! | `/guides/grinding`, `/guides/grinding/` | `guides/grinding/index.html` |
//! | `/guides/grinding/index.html` | `guides/grinding/index.html` |
//! | `/images/wheel.svg` | `images/wheel.svg` |
//!
//! Unknown paths get `404.html` with status 404. Every response carries a
//! SHA-256 `ETag`; a matching `If-None-Match` returns 304.

use crate::generate::Site;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
struct Asset {
    body: Bytes,
    content_type: &'static str,
    etag: String,
}

impl Asset {
    fn new(path: &str, bytes: Vec<u8>) -> Self {
        let etag = format!("\"{:x}\"", Sha256::digest(&bytes));
        Self {
            body: Bytes::from(bytes),
            content_type: content_type(path),
            etag,
        }
    }
}

/// Immutable path → file table shared by all requests.
#[derive(Debug, Default)]
struct SiteFiles {
    files: HashMap<String, Asset>,
}

impl SiteFiles {
    fn from_site(site: Site) -> Self {
        let files = site
            .files
            .into_iter()
            .map(|(path, bytes)| {
                let asset = Asset::new(&path, bytes);
                (path, asset)
            })
            .collect();
        Self { files }
    }

    fn resolve(&self, request_path: &str) -> Option<&Asset> {
        let key = request_path.trim_start_matches('/');
        if key.is_empty() {
            return self.files.get("index.html");
        }
        if key.ends_with('/') {
            return self.files.get(&format!("{key}index.html"));
        }
        self.files
            .get(key)
            .or_else(|| self.files.get(&format!("{key}/index.html")))
    }

    fn not_found(&self) -> Option<&Asset> {
        self.files.get("404.html")
    }
}

/// MIME type by file extension.
pub fn content_type(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "woff2" => "font/woff2",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Whether an `If-None-Match` header value matches `etag`.
fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match
        .split(',')
        .map(|tag| tag.trim())
        .any(|tag| tag == "*" || tag.strip_prefix("W/").unwrap_or(tag) == etag)
}

/// Router serving `site` for every GET/HEAD path.
pub fn router(site: Site) -> Router {
    let files = Arc::new(SiteFiles::from_site(site));
    Router::new()
        .fallback(serve_path)
        .layer(TraceLayer::new_for_http())
        .with_state(files)
}

async fn serve_path(
    State(files): State<Arc<SiteFiles>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "GET, HEAD")]).into_response();
    }

    let (status, asset) = match files.resolve(uri.path()) {
        Some(asset) => (StatusCode::OK, asset),
        None => match files.not_found() {
            Some(asset) => (StatusCode::NOT_FOUND, asset),
            None => return StatusCode::NOT_FOUND.into_response(),
        },
    };

    let not_modified = status == StatusCode::OK
        && headers
            .get(header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| etag_matches(v, &asset.etag));
    if not_modified {
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, asset.etag.clone())]).into_response();
    }

    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        Body::from(asset.body.clone())
    };
    (
        status,
        [
            (header::CONTENT_TYPE, asset.content_type.to_string()),
            (header::ETAG, asset.etag.clone()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        body,
    )
        .into_response()
}

/// Bind `addr` and serve until the process is stopped.
pub async fn run(site: Site, addr: SocketAddr) -> Result<(), ServeError> {
    let app = router(site);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Serving on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files() -> SiteFiles {
        let mut site = Site::default();
        for path in [
            "index.html",
            "404.html",
            "guides/index.html",
            "guides/grinding/index.html",
            "images/wheel.svg",
        ] {
            site.files.insert(path.to_string(), path.as_bytes().to_vec());
        }
        SiteFiles::from_site(site)
    }

    fn resolved(files: &SiteFiles, path: &str) -> Option<String> {
        files
            .resolve(path)
            .map(|a| String::from_utf8(a.body.to_vec()).unwrap())
    }

    #[test]
    fn guide_path_variants_resolve_to_same_page() {
        let files = files();
        for path in [
            "/guides/grinding",
            "/guides/grinding/",
            "/guides/grinding/index.html",
        ] {
            assert_eq!(
                resolved(&files, path).as_deref(),
                Some("guides/grinding/index.html"),
                "{path}"
            );
        }
    }

    #[test]
    fn root_and_index_resolve() {
        let files = files();
        assert_eq!(resolved(&files, "/").as_deref(), Some("index.html"));
        assert_eq!(resolved(&files, "/guides/").as_deref(), Some("guides/index.html"));
        assert_eq!(resolved(&files, "/guides").as_deref(), Some("guides/index.html"));
    }

    #[test]
    fn unknown_path_unresolved() {
        let files = files();
        assert!(files.resolve("/guides/lapping").is_none());
        assert!(files.resolve("/images/missing.svg").is_none());
    }

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type("guides/x/index.html"), "text/html; charset=utf-8");
        assert_eq!(content_type("images/a.SVG"), "image/svg+xml");
        assert_eq!(content_type("sitemap.xml"), "application/xml");
        assert_eq!(content_type("LICENSE"), "application/octet-stream");
    }

    #[test]
    fn etag_is_quoted_sha256() {
        let asset = Asset::new("a.txt", b"abc".to_vec());
        assert_eq!(
            asset.etag,
            "\"ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad\""
        );
    }

    #[test]
    fn if_none_match_forms() {
        let etag = "\"abc\"";
        assert!(etag_matches("\"abc\"", etag));
        assert!(etag_matches("W/\"abc\"", etag));
        assert!(etag_matches("\"x\", \"abc\"", etag));
        assert!(etag_matches("*", etag));
        assert!(!etag_matches("\"abd\"", etag));
    }
}
