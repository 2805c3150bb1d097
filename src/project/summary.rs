//! Project summaries: the YAML list behind the card grid.

use super::{ProjectError, ProjectSummary};
use rustc_hash::FxHashSet;
use std::{fs, path::Path};

/// Load the summaries list.
///
/// JSON is a subset of YAML, so a `projects.json` in the same shape works too.
pub fn load_summaries(path: &Path) -> Result<Vec<ProjectSummary>, ProjectError> {
    let text = fs::read_to_string(path).map_err(|source| ProjectError::Fetch {
        path: path.to_path_buf(),
        source,
    })?;
    parse_summaries(&text, path)
}

/// Parse summaries text; `origin` is only used in errors.
pub fn parse_summaries(text: &str, origin: &Path) -> Result<Vec<ProjectSummary>, ProjectError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let summaries: Vec<ProjectSummary> =
        serde_yaml::from_str(text).map_err(|source| ProjectError::Summaries {
            path: origin.to_path_buf(),
            source,
        })?;

    let mut seen = FxHashSet::default();
    for summary in &summaries {
        if summary.id.trim().is_empty() {
            return Err(ProjectError::Validation {
                id: summary.title.clone(),
                message: "summary entry has an empty `id`".into(),
            });
        }
        if !is_path_segment(&summary.id) {
            return Err(ProjectError::Validation {
                id: summary.id.clone(),
                message: "summary id may only contain ASCII letters, digits, `.`, `_` and `-`"
                    .into(),
            });
        }
        if !seen.insert(summary.id.as_str()) {
            return Err(ProjectError::Validation {
                id: summary.id.clone(),
                message: format!("duplicate id in {}", origin.display()),
            });
        }
    }

    Ok(summaries)
}

/// Ids name output directories, source files and URL path segments.
fn is_path_segment(id: &str) -> bool {
    !matches!(id, "." | "..")
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Cards in display order: hidden entries dropped, highlighted entries first.
///
/// The sort is stable, so authoring order is kept within each group.
pub fn card_order(summaries: &[ProjectSummary]) -> Vec<&ProjectSummary> {
    let mut cards: Vec<_> = summaries.iter().filter(|s| !s.hidden).collect();
    cards.sort_by_key(|s| !s.highlighted);
    cards
}

/// Ids offered on not-found and error panels; hidden projects stay unlisted.
pub fn listed_ids(summaries: &[ProjectSummary]) -> Vec<String> {
    summaries
        .iter()
        .filter(|s| !s.hidden)
        .map(|s| s.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SUMMARIES: &str = r#"
- id: pool
  title: Object Pool Manager
  imageSrc: assets/images/pool.png
  description: Allocation-free spawning.
  flairs: [Unity, C#]
  links:
    github: https://github.com/jane/pool
- id: inventory
  title: Networked Inventory
  projectType: Team Project
  description: Server authoritative inventory.
  highlighted: true
- id: terminal
  title: UniTerminal
  hidden: true
"#;

    fn origin() -> PathBuf {
        PathBuf::from("data/projects.yaml")
    }

    #[test]
    fn test_parse_summaries() {
        let summaries = parse_summaries(SUMMARIES, &origin()).unwrap();
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].image_src.as_deref(), Some("assets/images/pool.png"));
        assert_eq!(summaries[0].flairs, vec!["Unity", "C#"]);
        assert_eq!(
            summaries[0].links.github.as_deref(),
            Some("https://github.com/jane/pool")
        );
        assert_eq!(summaries[1].project_type.as_deref(), Some("Team Project"));
        assert!(summaries[1].highlighted);
        assert!(summaries[2].hidden);
    }

    #[test]
    fn test_highlighted_card_comes_first() {
        let summaries = parse_summaries(SUMMARIES, &origin()).unwrap();
        let ids: Vec<_> = card_order(&summaries).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["inventory", "pool"]);
    }

    #[test]
    fn test_card_order_is_stable() {
        let summaries: Vec<ProjectSummary> = ["a", "b", "c", "d"]
            .iter()
            .map(|id| ProjectSummary {
                id: (*id).into(),
                highlighted: matches!(*id, "b" | "d"),
                ..Default::default()
            })
            .collect();
        let ids: Vec<_> = card_order(&summaries).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_listed_ids_skip_hidden() {
        let summaries = parse_summaries(SUMMARIES, &origin()).unwrap();
        assert_eq!(listed_ids(&summaries), vec!["pool", "inventory"]);
    }

    #[test]
    fn test_unknown_link_kinds_are_ignored() {
        let text = "- id: pool\n  title: Pool\n  links:\n    github: https://github.com/jane/pool\n    itch: https://jane.itch.io/pool\n";
        let summaries = parse_summaries(text, &origin()).unwrap();
        assert_eq!(
            summaries[0].links.labelled(),
            vec![("View on GitHub", "https://github.com/jane/pool")]
        );
    }

    #[test]
    fn test_json_summaries() {
        let json = r#"[{"id": "pool", "title": "Pool", "highlighted": true}]"#;
        let summaries = parse_summaries(json, Path::new("projects.json")).unwrap();
        assert_eq!(summaries[0].id, "pool");
        assert!(summaries[0].highlighted);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let text = "- id: a\n  title: A\n- id: a\n  title: B\n";
        let err = parse_summaries(text, &origin()).unwrap_err();
        assert!(matches!(err, ProjectError::Validation { ref id, .. } if id == "a"));
    }

    #[test]
    fn test_id_must_be_path_segment() {
        for id in ["../etc", "a/b", "..", " padded", "a#b", "a?b", "50%", "my pool", "über"] {
            let text = format!("- id: '{id}'\n  title: X\n");
            let err = parse_summaries(&text, &origin()).unwrap_err();
            assert!(matches!(err, ProjectError::Validation { .. }), "{id}");
        }
        let ok = parse_summaries("- id: pool-v2.1_b\n  title: X\n", &origin()).unwrap();
        assert_eq!(ok[0].id, "pool-v2.1_b");
    }

    #[test]
    fn test_invalid_yaml() {
        let err = parse_summaries("id: not-a-list", &origin()).unwrap_err();
        assert!(matches!(err, ProjectError::Summaries { .. }));
    }

    #[test]
    fn test_missing_file_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_summaries(&dir.path().join("projects.yaml")).unwrap_err();
        assert!(matches!(err, ProjectError::Fetch { .. }));
    }

    #[test]
    fn test_empty_file_has_no_cards() {
        assert!(parse_summaries("\n", &origin()).unwrap().is_empty());
    }
}
