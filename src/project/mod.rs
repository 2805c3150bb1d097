//! Project records: summaries for the card grid and parsed detail pages.
//!
//! # Architecture
//!
//! ```text
//! data/projects.yaml ──► summary::load_summaries() ──► Vec<ProjectSummary>
//!                                                           │
//!                                                  summary::card_order()
//!
//! data/projects/<id>.md ──► parser::parse_project() ──► ProjectDetail
//!                              │
//!                              ├── frontmatter (YAML, typed + validated)
//!                              └── body split on `## heading`
//!                                      ├── overview (text before first heading)
//!                                      ├── Contributions (bullets → list)
//!                                      └── DetailedSection[]
//! ```

mod error;
mod frontmatter;
pub mod parser;
pub mod summary;

pub use error::ProjectError;
pub use parser::parse_project;

use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};

/// External links shown on cards and detail pages.
///
/// Link kinds other than these three are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Links {
    pub github: Option<String>,
    pub demo: Option<String>,
    pub trello: Option<String>,
}

impl Links {
    /// `(label, url)` pairs for the links that are set, in display order.
    pub fn labelled(&self) -> Vec<(&'static str, &str)> {
        [
            ("View on GitHub", self.github.as_deref()),
            ("Play Demo", self.demo.as_deref()),
            ("Trello Board", self.trello.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, url)| url.filter(|u| !u.trim().is_empty()).map(|u| (label, u)))
        .collect()
    }
}

/// Abbreviated project record used for the card grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub image_src: Option<String>,
    #[serde(default)]
    pub image_caption: Option<String>,
    #[serde(default)]
    pub project_type: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub flairs: Vec<String>,
    #[serde(default)]
    pub links: Links,
    #[serde(default)]
    pub detail_page_url: Option<String>,
    #[serde(default)]
    pub highlighted: bool,
    #[serde(default)]
    pub hidden: bool,
}

impl ProjectSummary {
    /// Link target of the card, [`project_url`] unless overridden.
    pub fn detail_url(&self) -> String {
        self.detail_page_url
            .clone()
            .unwrap_or_else(|| project_url(&self.id))
    }
}

/// Canonical static page of a project, `/projects/<id>/` with the id percent-encoded.
pub fn project_url(id: &str) -> String {
    format!("/projects/{}/", urlencoding::encode(id))
}

/// One titled box of `label: value` rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoBox {
    pub title: String,
    pub entries: Vec<(String, String)>,
}

/// A `##` section of a project page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedSection {
    pub heading: String,
    /// Raw markdown body, trimmed
    pub body: String,
    pub code_preview_file: Option<String>,
    pub code_expanded_file: Option<String>,
    pub code_language: Option<String>,
}

impl DetailedSection {
    pub fn has_code_ref(&self) -> bool {
        self.code_preview_file.is_some() || self.code_expanded_file.is_some()
    }

    /// Sections without body text and without code are not rendered.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty() && !self.has_code_ref()
    }
}

/// Fully parsed project page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    pub id: String,
    pub page_title: String,
    pub hero_image: Option<String>,
    pub project_name: String,
    pub project_type: Option<String>,
    pub flairs: Vec<String>,
    pub project_info: Vec<InfoBox>,
    pub gallery_images: Vec<String>,
    #[serde(rename = "videoURL")]
    pub video_url: Option<String>,
    /// Markdown preceding the first `##` heading
    pub overview: String,
    pub detailed_sections: Vec<DetailedSection>,
    pub contributions: Vec<String>,
    pub links: Links,
}

/// Read and parse one project file.
///
/// Ids missing from `summaries` and missing files both map to
/// [`ProjectError::NotFound`], so request input never reaches the filesystem
/// unless it names a known project. The error lists visible ids only.
pub fn load_project(
    path: &Path,
    id: &str,
    summaries: &[ProjectSummary],
) -> Result<ProjectDetail, ProjectError> {
    let not_found = || ProjectError::NotFound {
        id: id.to_owned(),
        available: summary::listed_ids(summaries),
    };
    if !summaries.iter().any(|s| s.id == id) {
        return Err(not_found());
    }

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(not_found()),
        Err(source) => {
            return Err(ProjectError::Fetch {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    parse_project(id, &text)
}
