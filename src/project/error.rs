//! Project loading errors.

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop a project page (or the card index) from rendering.
///
/// The first four variants are format errors of a single markdown file and
/// always carry the project id.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project `{id}`: file must start with a `---` frontmatter line")]
    MissingFrontmatterDelimiter { id: String },

    #[error("project `{id}`: frontmatter is not closed with a `---` line")]
    MissingClosingDelimiter { id: String },

    #[error("project `{id}`: invalid frontmatter YAML: {source}")]
    Yaml {
        id: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("project `{id}`: {message}")]
    Validation { id: String, message: String },

    #[error("project `{id}` not found")]
    NotFound { id: String, available: Vec<String> },

    #[error("failed to read `{}`", path.display())]
    Fetch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid summaries file `{}`: {source}", path.display())]
    Summaries {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl ProjectError {
    /// Whether the markdown itself is malformed.
    pub const fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::MissingFrontmatterDelimiter { .. }
                | Self::MissingClosingDelimiter { .. }
                | Self::Yaml { .. }
                | Self::Validation { .. }
        )
    }
}
