//! Development server.
//!
//! Built on `tiny_http`:
//!
//! - Static file serving from the build output directory
//! - Automatic `index.html` resolution for directories
//! - The detail route (`/project.html?id=<id>`) rendered from source on every request
//! - File watching and auto-rebuild (via `watch` module)
//! - Graceful shutdown on Ctrl+C
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Main Thread   │     │  Watcher Thread  │
//! │  (HTTP Server)  │     │  (File Monitor)  │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       │
//!          ▼                       ▼
//!    resolve_route()         Detect changes
//!     ├── Detail ─► render from data/  Trigger rebuild
//!     ├── File   ─► public/...
//!     └── NotFound ─► public/404.html
//! ```

use crate::{
    config::SiteConfig,
    log,
    project::{
        ProjectError,
        summary::{listed_ids, load_summaries},
    },
    render::{
        Layout,
        pages::{render_error, render_failure, render_not_found},
        render_project,
    },
    watch::watch_for_changes_blocking,
};
use anyhow::{Context, Result, anyhow};
use std::{
    fs,
    net::{IpAddr, SocketAddr},
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

const HTML: &str = "text/html; charset=utf-8";

// ============================================================================
// Server Entry Point
// ============================================================================

/// Start the development server with optional file watching.
///
/// Blocks until Ctrl+C is received.
pub fn serve_site(config: Arc<SiteConfig>) -> Result<()> {
    let interface: IpAddr = config
        .serve
        .interface
        .parse()
        .with_context(|| format!("Invalid interface `{}`", config.serve.interface))?;

    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}", addr);

    if config.serve.watch {
        let config = Arc::clone(&config);
        std::thread::spawn(move || {
            if let Err(err) = watch_for_changes_blocking(config) {
                log!("watch"; "{err}");
            }
        });
    }

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &config) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Routing
// ============================================================================

#[derive(Debug, PartialEq, Eq)]
enum Route {
    /// The dynamic detail page, with the raw `id` query value
    Detail(Option<String>),
    File(PathBuf),
    NotFound,
}

/// Map a request URL to a route.
fn resolve_route(url: &str, config: &SiteConfig) -> Route {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let Ok(path) = urlencoding::decode(path) else {
        return Route::NotFound;
    };
    let request_path = path.trim_matches('/');

    if request_path == config.build.detail_route.trim_matches('/') {
        return Route::Detail(query_param(query, "id"));
    }

    let relative = Path::new(request_path);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Route::NotFound;
    }

    let local_path = config.build.output.join(relative);
    if local_path.is_file() {
        return Route::File(local_path);
    }
    let index_path = local_path.join("index.html");
    if index_path.is_file() {
        return Route::File(index_path);
    }
    Route::NotFound
}

/// First value of `key` in a query string, percent- and `+`-decoded.
fn query_param(query: &str, key: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(k, _)| *k == key)
        .and_then(|(_, v)| {
            urlencoding::decode(&v.replace('+', " "))
                .ok()
                .map(|v| v.into_owned())
        })
}

/// Render the detail page for `id` from source: `(status, html)`.
fn detail_response(config: &SiteConfig, id: Option<&str>) -> (u16, String) {
    let layout = match Layout::from_config(config) {
        Ok(layout) => layout,
        Err(e) => {
            log!("error"; "{:#}", e);
            return (500, render_error(&Layout::default(), &format!("{e:#}"), &[]));
        }
    };

    let summaries = match load_summaries(&config.summaries_path()) {
        Ok(summaries) => summaries,
        Err(e) => {
            log!("error"; "{}", e);
            return (500, render_error(&layout, &e.to_string(), &[]));
        }
    };
    let listed = listed_ids(&summaries);

    let Some(id) = id.filter(|id| !id.is_empty()) else {
        return (404, render_not_found(&layout, None, &listed));
    };

    match render_project(config, &layout, id, &summaries) {
        Ok(html) => (200, html),
        Err(e @ ProjectError::NotFound { .. }) => (404, render_failure(&layout, &e, &listed)),
        Err(e) => {
            log!("error"; "{}", e);
            (500, render_failure(&layout, &e, &listed))
        }
    }
}

// ============================================================================
// Request Handling
// ============================================================================

/// Handle a single HTTP request.
fn handle_request(request: Request, config: &SiteConfig) -> Result<()> {
    match resolve_route(request.url(), config) {
        Route::Detail(id) => {
            let (status, html) = detail_response(config, id.as_deref());
            respond(request, status, html.into_bytes(), HTML)
        }
        Route::File(path) => {
            let content =
                fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
            respond(request, 200, content, guess_content_type(&path))
        }
        Route::NotFound => match fs::read(config.build.output.join("404.html")) {
            Ok(page) => respond(request, 404, page, HTML),
            Err(_) => respond(
                request,
                404,
                b"404 Not Found".to_vec(),
                "text/plain; charset=utf-8",
            ),
        },
    }
}

fn respond(request: Request, status: u16, body: Vec<u8>, content_type: &str) -> Result<()> {
    let header = Header::from_bytes("Content-Type", content_type)
        .map_err(|()| anyhow!("Invalid content type `{content_type}`"))?;
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(header);
    request.respond(response)?;
    Ok(())
}

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => HTML,
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",

        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",

        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogg") => "video/ogg",

        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",

        Some("pdf") => "application/pdf",
        // Code files are shown as text
        Some("txt" | "md" | "cs" | "cpp" | "h" | "hpp" | "rs" | "py" | "lua") => {
            "text/plain; charset=utf-8"
        }

        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARIES: &str = "- id: pool\n  title: Pool\n- id: broken\n  title: Broken\n";

    fn site() -> (tempfile::TempDir, SiteConfig) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("data/projects")).unwrap();
        fs::create_dir_all(root.join("public/projects/pool")).unwrap();
        fs::write(root.join("data/projects.yaml"), SUMMARIES).unwrap();
        fs::write(
            root.join("data/projects/pool.md"),
            "---\nprojectName: Object Pool\n---\nFast.\n",
        )
        .unwrap();
        fs::write(root.join("data/projects/broken.md"), "---\nprojectName: X\n").unwrap();
        fs::write(root.join("public/projects/pool/index.html"), "<p>pool</p>").unwrap();
        fs::write(root.join("public/style.css"), "p{}").unwrap();

        let mut config = SiteConfig::default();
        config.update_path_with_root(root);
        (dir, config)
    }

    #[test]
    fn test_query_param() {
        assert_eq!(query_param("id=pool", "id").as_deref(), Some("pool"));
        assert_eq!(query_param("x=1&id=my%20pool", "id").as_deref(), Some("my pool"));
        assert_eq!(query_param("id=a+b&id=c", "id").as_deref(), Some("a b"));
        assert_eq!(query_param("id", "id").as_deref(), Some(""));
        assert_eq!(query_param("", "id"), None);
    }

    #[test]
    fn test_resolve_route() {
        let (_dir, config) = site();
        let out = &config.build.output;

        assert_eq!(
            resolve_route("/project.html?id=pool", &config),
            Route::Detail(Some("pool".into()))
        );
        assert_eq!(resolve_route("/project.html", &config), Route::Detail(None));
        assert_eq!(
            resolve_route("/projects/pool/", &config),
            Route::File(out.join("projects/pool/index.html"))
        );
        assert_eq!(
            resolve_route("/style.css?t=1", &config),
            Route::File(out.join("style.css"))
        );
        assert_eq!(resolve_route("/nope", &config), Route::NotFound);
        assert_eq!(resolve_route("/../data/projects.yaml", &config), Route::NotFound);
        assert_eq!(resolve_route("/%2e%2e/data/projects.yaml", &config), Route::NotFound);
    }

    #[test]
    fn test_detail_renders_from_source() {
        let (_dir, config) = site();
        let (status, html) = detail_response(&config, Some("pool"));
        assert_eq!(status, 200);
        assert!(html.contains("Object Pool"));
    }

    #[test]
    fn test_unknown_id_is_not_found_panel() {
        let (_dir, config) = site();
        let (status, html) = detail_response(&config, Some("<nope>"));
        assert_eq!(status, 404);
        assert!(html.contains("Project Not Found"));
        assert!(html.contains("<code>&lt;nope&gt;</code>"));
        assert!(html.contains(r#"<a href="/projects/pool/">pool</a>"#));
        assert!(html.contains(r#"<a href="/projects/broken/">broken</a>"#));
    }

    #[test]
    fn test_format_error_is_error_panel() {
        let (_dir, config) = site();
        let (status, html) = detail_response(&config, Some("broken"));
        assert_eq!(status, 500);
        assert!(html.contains("<h1>Error</h1>"));
        assert!(html.contains("not closed"));
    }

    #[test]
    fn test_missing_id() {
        let (_dir, config) = site();
        let (status, html) = detail_response(&config, None);
        assert_eq!(status, 404);
        assert!(html.contains("The page you requested does not exist."));
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a/index.html")), HTML);
        assert_eq!(guess_content_type(Path::new("Pool.cs")), "text/plain; charset=utf-8");
        assert_eq!(guess_content_type(Path::new("clip.mp4")), "video/mp4");
        assert_eq!(guess_content_type(Path::new("blob")), "application/octet-stream");
    }
}
