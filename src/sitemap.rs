//! Sitemap generation.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://jane.dev/projects/pool/</loc>
//!     <lastmod>2025-01-01</lastmod>
//!   </url>
//! </urlset>
//! ```

use crate::{config::SiteConfig, log, project::ProjectSummary, utils::minify::Minifier};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::{fs, path::Path};

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Write the sitemap if enabled in config.
pub fn build_sitemap(
    config: &SiteConfig,
    summaries: &[ProjectSummary],
    minifier: &Minifier,
) -> Result<()> {
    if !config.build.sitemap.enable {
        return Ok(());
    }
    let Some(base_url) = config.base.url.as_deref() else {
        return Ok(());
    };

    let sitemap = Sitemap::new(base_url, summaries, |id| lastmod(&config.project_path(id)));
    let path = &config.build.sitemap.path;
    let xml = sitemap.into_xml();

    fs::write(path, minifier.xml(&xml).as_bytes())
        .with_context(|| format!("Failed to write sitemap to {}", path.display()))?;

    log!("sitemap"; "{}", path.file_name().unwrap_or_default().to_string_lossy());
    Ok(())
}

/// Modification date of a file as `YYYY-MM-DD`.
fn lastmod(path: &Path) -> Option<String> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Local>::from(modified).format("%Y-%m-%d").to_string())
}

struct Sitemap {
    urls: Vec<UrlEntry>,
}

struct UrlEntry {
    loc: String,
    lastmod: Option<String>,
}

impl Sitemap {
    /// Home page plus every visible project whose page lives on this site.
    fn new(
        base_url: &str,
        summaries: &[ProjectSummary],
        lastmod: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let base = base_url.trim_end_matches('/');
        let home = UrlEntry {
            loc: format!("{base}/"),
            lastmod: None,
        };

        let projects = summaries.iter().filter(|s| !s.hidden).filter_map(|s| {
            let url = s.detail_url();
            url.starts_with('/').then(|| UrlEntry {
                loc: format!("{base}{url}"),
                lastmod: lastmod(&s.id),
            })
        });

        Self {
            urls: std::iter::once(home).chain(projects).collect(),
        }
    }

    fn into_xml(self) -> String {
        let mut xml = String::with_capacity(256 + self.urls.len() * 96);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
        xml.push('\n');

        for entry in self.urls {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
            if let Some(lastmod) = entry.lastmod {
                xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
            }
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
