//! Typed frontmatter schema.
//!
//! The YAML block between the `---` lines is deserialized into [`Frontmatter`]
//! and validated once here, so rendering never has to look keys up.

use super::{InfoBox, Links, ProjectDetail, ProjectError};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

/// Title of the box collecting scalar `projectInfo` entries.
const GENERAL_INFO_TITLE: &str = "Project Info";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Frontmatter {
    #[serde(alias = "title")]
    page_title: Option<String>,
    project_name: Option<String>,
    project_type: Option<String>,
    hero_image: Option<String>,
    #[serde(default)]
    flairs: Vec<String>,
    #[serde(default)]
    project_info: Mapping,
    #[serde(default)]
    gallery_images: Vec<String>,
    #[serde(rename = "videoURL", alias = "videoUrl")]
    video_url: Option<String>,
    #[serde(default)]
    links: Links,
}

impl Frontmatter {
    /// Deserialize the raw YAML text of a frontmatter block.
    pub(super) fn parse(id: &str, yaml: &str) -> Result<Self, ProjectError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|source| ProjectError::Yaml {
            id: id.to_owned(),
            source,
        })
    }

    /// Validate and turn into a detail record with an empty body.
    pub(super) fn into_detail(self, id: &str) -> Result<ProjectDetail, ProjectError> {
        let page_title = non_blank(self.page_title);
        let project_name = non_blank(self.project_name)
            .or_else(|| page_title.clone())
            .ok_or_else(|| validation(id, "frontmatter needs a `projectName` or `title`"))?;

        Ok(ProjectDetail {
            id: id.to_owned(),
            page_title: page_title.unwrap_or_else(|| project_name.clone()),
            hero_image: non_blank(self.hero_image),
            project_name,
            project_type: non_blank(self.project_type),
            flairs: self.flairs,
            project_info: info_boxes(id, &self.project_info)?,
            gallery_images: self.gallery_images,
            video_url: non_blank(self.video_url),
            links: self.links,
            ..Default::default()
        })
    }
}

fn validation(id: &str, message: impl Into<String>) -> ProjectError {
    ProjectError::Validation {
        id: id.to_owned(),
        message: message.into(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Split `projectInfo` into boxes.
///
/// Scalar entries go into one general box (listed first); a nested mapping
/// becomes its own box titled by its key.
fn info_boxes(id: &str, info: &Mapping) -> Result<Vec<InfoBox>, ProjectError> {
    let mut general = Vec::new();
    let mut groups = Vec::new();

    for (key, value) in info {
        let key = scalar_text(key)
            .ok_or_else(|| validation(id, "`projectInfo` keys must be plain text"))?;

        match value {
            Value::Mapping(inner) => {
                let mut entries = Vec::with_capacity(inner.len());
                for (label, value) in inner {
                    let label = scalar_text(label).ok_or_else(|| {
                        validation(id, format!("`projectInfo.{key}` keys must be plain text"))
                    })?;
                    if matches!(value, Value::Mapping(_)) {
                        return Err(validation(
                            id,
                            format!("`projectInfo.{key}.{label}` nests too deep"),
                        ));
                    }
                    if let Some(text) = value_text(value) {
                        entries.push((label, text));
                    }
                }
                if !entries.is_empty() {
                    groups.push(InfoBox {
                        title: key,
                        entries,
                    });
                }
            }
            other => {
                if let Some(text) = value_text(other) {
                    general.push((key, text));
                }
            }
        }
    }

    let mut boxes = Vec::with_capacity(groups.len() + 1);
    if !general.is_empty() {
        boxes.push(InfoBox {
            title: GENERAL_INFO_TITLE.to_owned(),
            entries: general,
        });
    }
    boxes.extend(groups);
    Ok(boxes)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Display text of an info value; sequences are joined with `", "`.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Sequence(items) => {
            let parts: Vec<_> = items.iter().filter_map(scalar_text).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Tagged(tagged) => value_text(&tagged.value),
        other => scalar_text(other),
    }
}
