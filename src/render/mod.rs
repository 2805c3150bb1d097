//! HTML rendering of project pages.
//!
//! ```text
//! ProjectDetail ──► markdown::to_html() ──► directive::expand_directives()
//!       │                                              │
//!       └── code::load_section_code() (rayon) ─────────┤
//!                                                      ▼
//!                                   pages::render_detail() ──► Layout::page()
//! ```

pub mod code;
pub mod directive;
pub mod markdown;
pub mod pages;
pub mod video;

use crate::{
    config::SiteConfig,
    project::{ProjectError, ProjectSummary, load_project},
};
use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::{borrow::Cow, fs, path::Path, sync::LazyLock};

/// Page skeleton shared by every rendered page (embedded at compile time)
const LAYOUT_TEMPLATE: &str = include_str!("../embed/layout.html");

static RE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").unwrap());

/// Fill `{name}` placeholders of a template in one pass.
///
/// Inserted values are never rescanned, so content containing `{body}` stays literal.
/// Unknown placeholders are left as they are.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    RE_PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            vars.iter()
                .find(|(name, _)| *name == &caps[1])
                .map_or_else(|| caps[0].to_owned(), |(_, value)| (*value).to_owned())
        })
        .into_owned()
}

/// Escape text for HTML bodies and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Make a site-relative path root-absolute; URLs and absolute paths pass through.
///
/// Detail pages live under `/projects/<id>/`, where `assets/x.png` would not resolve.
pub fn site_url(src: &str) -> Cow<'_, str> {
    let has_scheme = src.split_once(':').is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    });
    if has_scheme || src.starts_with(['/', '#', '?']) || src.is_empty() {
        Cow::Borrowed(src)
    } else {
        Cow::Owned(format!("/{}", src.trim_start_matches("./")))
    }
}

/// Reverse [`escape_html`] for text lifted out of rendered markdown.
pub fn unescape_html(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Site-wide page chrome: head links, partials and copyright.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    language: String,
    site_title: String,
    author: String,
    description: String,
    stylesheets: Vec<String>,
    scripts: Vec<String>,
    header: String,
    footer: String,
    copyright: String,
}

impl Layout {
    /// Build the layout for a config, reading the header/footer partials.
    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        Ok(Self {
            language: config.base.language.clone(),
            site_title: config.base.title.clone(),
            author: config.base.author.clone(),
            description: config.base.description.clone(),
            stylesheets: config.base.stylesheets.clone(),
            scripts: config.base.scripts.clone(),
            header: read_partial(config.build.header.as_deref())?,
            footer: read_partial(config.build.footer.as_deref())?,
            copyright: config.copyright(),
        })
    }

    pub fn site_title(&self) -> &str {
        &self.site_title
    }

    /// Wrap `body` into a full HTML document.
    pub fn page(&self, title: &str, body_class: &str, body: &str) -> String {
        let mut head = String::new();
        if !self.description.is_empty() {
            head.push_str(&format!(
                r#"<meta name="description" content="{}">"#,
                escape_html(&self.description)
            ));
        }
        if !self.author.is_empty() {
            head.push_str(&format!(
                r#"<meta name="author" content="{}">"#,
                escape_html(&self.author)
            ));
        }
        for href in &self.stylesheets {
            head.push_str(&format!(r#"<link rel="stylesheet" href="{}">"#, escape_html(href)));
        }
        for src in &self.scripts {
            head.push_str(&format!(r#"<script src="{}" defer></script>"#, escape_html(src)));
        }

        let copyright = if self.copyright.is_empty() {
            String::new()
        } else {
            format!(r#"<p class="copyright">{}</p>"#, escape_html(&self.copyright))
        };

        fill_template(
            LAYOUT_TEMPLATE,
            &[
                ("lang", &escape_html(&self.language)),
                ("title", &escape_html(title)),
                ("head", &head),
                ("body_class", body_class),
                ("header", &self.header),
                ("body", body),
                ("footer", &self.footer),
                ("copyright", &copyright),
                ("version", env!("CARGO_PKG_VERSION")),
            ],
        )
    }
}

/// Load, parse and render one project page from source.
pub fn render_project(
    config: &SiteConfig,
    layout: &Layout,
    id: &str,
    summaries: &[ProjectSummary],
) -> Result<String, ProjectError> {
    let detail = load_project(&config.project_path(id), id, summaries)?;
    let code = code::load_section_code(&detail.detailed_sections, config.get_root());
    Ok(pages::render_detail(
        layout,
        &detail,
        &code,
        config.build.slug.fragment,
    ))
}

fn read_partial(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read partial {}", path.display())),
        None => Ok(String::new()),
    }
}
