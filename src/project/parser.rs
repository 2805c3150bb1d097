//! Markdown project parser.
//!
//! A project file is YAML frontmatter followed by a markdown body:
//!
//! ```text
//! ---
//! projectName: Networked Inventory
//! ---
//! Overview text, everything before the first heading.
//!
//! ## Architecture
//! Body text with {{image:assets/arch.png|Server layout|right}}
//! ```csharp-preview:assets/code/Inventory-preview.cs
//! ```csharp-expanded:assets/code/Inventory-full.cs
//!
//! ## Contributions
//! - Wrote the replication layer
//! ```
//!
//! Only `## ` headings split sections. Lines inside an ordinary fenced code
//! block are body text, so example code containing `## ` never opens a
//! section.

use super::{DetailedSection, ProjectDetail, ProjectError, frontmatter::Frontmatter};
use regex::Regex;
use std::sync::LazyLock;

const DELIMITER: &str = "---";
const FENCE: &str = "```";
const CONTRIBUTIONS: &str = "contributions";

/// A `## ` heading with visible text; `##   ` alone stays body text.
static RE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##[ \t]+(\S.*?)(?:[ \t]+#+)?[ \t]*$").unwrap());

/// ```` ```lang-preview:path ```` / ```` ```lang-expanded:path ````
static RE_CODE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^```[ \t]*([^\s:`]+?)-(preview|expanded):[ \t]*(\S.*?)[ \t]*$").unwrap()
});

/// Parse one project markdown file.
pub fn parse_project(id: &str, text: &str) -> Result<ProjectDetail, ProjectError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let (yaml, body) = split_frontmatter(id, text)?;

    let mut detail = Frontmatter::parse(id, &yaml)?.into_detail(id)?;
    parse_body(&body, &mut detail);
    Ok(detail)
}

/// Split into `(frontmatter, body)` on the first two `---` lines.
fn split_frontmatter(id: &str, text: &str) -> Result<(String, String), ProjectError> {
    let mut lines = text.lines();

    if lines.next().map(str::trim_end) != Some(DELIMITER) {
        return Err(ProjectError::MissingFrontmatterDelimiter { id: id.to_owned() });
    }

    let mut yaml = Vec::new();
    for line in lines.by_ref() {
        if line.trim() == DELIMITER {
            let body: Vec<&str> = lines.collect();
            return Ok((yaml.join("\n"), body.join("\n")));
        }
        yaml.push(line);
    }

    Err(ProjectError::MissingClosingDelimiter { id: id.to_owned() })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeRefKind {
    Preview,
    Expanded,
}

/// A section while its lines are being collected.
struct OpenSection {
    /// `None` for the overview pseudo-section
    heading: Option<String>,
    lines: Vec<String>,
    preview: Option<String>,
    expanded: Option<String>,
    language: Option<String>,
}

impl OpenSection {
    fn new(heading: Option<String>) -> Self {
        Self {
            heading,
            lines: Vec::new(),
            preview: None,
            expanded: None,
            language: None,
        }
    }

    fn attach(&mut self, kind: CodeRefKind, language: &str, path: &str) {
        let slot = match kind {
            CodeRefKind::Preview => &mut self.preview,
            CodeRefKind::Expanded => &mut self.expanded,
        };
        *slot = Some(path.to_owned());
        self.language.get_or_insert_with(|| language.to_owned());
    }

    fn body(&self) -> String {
        self.lines.join("\n").trim().to_owned()
    }

    /// Move the collected section into `detail`.
    fn close(self, detail: &mut ProjectDetail) {
        let Some(heading) = self.heading.as_deref() else {
            detail.overview = self.body();
            return;
        };

        if heading.trim().eq_ignore_ascii_case(CONTRIBUTIONS) {
            detail.contributions.extend(contribution_items(&self.lines));
            return;
        }

        let section = DetailedSection {
            heading: heading.to_owned(),
            body: self.body(),
            code_preview_file: self.preview,
            code_expanded_file: self.expanded,
            code_language: self.language,
        };
        if !section.is_empty() {
            detail.detailed_sections.push(section);
        }
    }
}

/// A bare run of backticks closing a reference fence.
fn is_closing_fence(line: &str) -> bool {
    let line = line.trim();
    line.starts_with(FENCE) && line.chars().all(|c| c == '`')
}

/// Bullet lines (`- item`) of a Contributions section.
fn contribution_items(lines: &[String]) -> impl Iterator<Item = String> + '_ {
    lines.iter().filter_map(|line| {
        line.trim_start()
            .strip_prefix('-')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_owned)
    })
}

fn parse_body(body: &str, detail: &mut ProjectDetail) {
    let mut current = OpenSection::new(None);
    let mut in_code_block = false;
    let mut expect_ref_close = false;

    for line in body.lines() {
        let is_fence = line.trim_start().starts_with(FENCE);

        if expect_ref_close {
            expect_ref_close = false;
            if is_closing_fence(line) {
                continue;
            }
        }

        // Any fence line toggles, so a stray "```js" closes the open block.
        if in_code_block {
            if is_fence {
                in_code_block = false;
            }
            current.lines.push(line.to_owned());
            continue;
        }

        if let Some(caps) = RE_HEADING.captures(line) {
            let heading = caps[1].trim().to_owned();
            std::mem::replace(&mut current, OpenSection::new(Some(heading))).close(detail);
            continue;
        }

        if let Some(caps) = RE_CODE_REF.captures(line.trim_start()) {
            let kind = if &caps[2] == "preview" {
                CodeRefKind::Preview
            } else {
                CodeRefKind::Expanded
            };
            // the overview never shows code
            if current.heading.is_some() {
                current.attach(kind, &caps[1], &caps[3]);
            }
            expect_ref_close = true;
            continue;
        }

        if is_fence {
            in_code_block = true;
        }
        current.lines.push(line.to_owned());
    }

    current.close(detail);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ProjectDetail {
        parse_project("demo", text).unwrap()
    }

    #[test]
    fn test_missing_opening_delimiter() {
        let err = parse_project("inv", "projectName: X\n---\nbody").unwrap_err();
        assert!(matches!(err, ProjectError::MissingFrontmatterDelimiter { ref id } if id == "inv"));
        assert!(err.is_format_error());
    }

    #[test]
    fn test_missing_opening_delimiter_on_empty_input() {
        let err = parse_project("inv", "").unwrap_err();
        assert!(matches!(err, ProjectError::MissingFrontmatterDelimiter { .. }));
    }

    #[test]
    fn test_missing_closing_delimiter() {
        let err = parse_project("inv", "---\nprojectName: X\n## Heading\n").unwrap_err();
        assert!(matches!(err, ProjectError::MissingClosingDelimiter { ref id } if id == "inv"));
    }

    #[test]
    fn test_yaml_error_is_format_error_with_id() {
        let err = parse_project("pool", "---\nprojectName: [unclosed\n---\n").unwrap_err();
        assert!(err.is_format_error());
        assert!(matches!(err, ProjectError::Yaml { ref id, .. } if id == "pool"));
    }

    #[test]
    fn test_bom_and_crlf_are_accepted() {
        let detail = parse("\u{feff}---\r\nprojectName: X\r\n---\r\nHello\r\n");
        assert_eq!(detail.project_name, "X");
        assert_eq!(detail.overview, "Hello");
    }

    #[test]
    fn test_overview_and_sections() {
        let detail = parse(
            "---\nprojectName: X\n---\n\nIntro line.\n\nSecond para.\n\n## Design\nPools are prewarmed.\n\n## Networking\nServer authoritative.\n",
        );
        assert_eq!(detail.overview, "Intro line.\n\nSecond para.");
        assert_eq!(detail.detailed_sections.len(), 2);
        assert_eq!(detail.detailed_sections[0].heading, "Design");
        assert_eq!(detail.detailed_sections[0].body, "Pools are prewarmed.");
        assert_eq!(detail.detailed_sections[1].heading, "Networking");
    }

    #[test]
    fn test_deeper_headings_do_not_split() {
        let detail = parse("---\nprojectName: X\n---\n## Design\n### Detail\ntext\n");
        assert_eq!(detail.detailed_sections.len(), 1);
        assert_eq!(detail.detailed_sections[0].body, "### Detail\ntext");
    }

    #[test]
    fn test_heading_inside_code_block_is_body() {
        let detail = parse(
            "---\nprojectName: X\n---\n## Console\nExample:\n```bash\n## not a heading\n```\nAfter.\n",
        );
        assert_eq!(detail.detailed_sections.len(), 1);
        let body = &detail.detailed_sections[0].body;
        assert!(body.contains("## not a heading"));
        assert!(body.ends_with("After."));
    }

    #[test]
    fn test_heading_after_code_block_splits_again() {
        let detail = parse("---\nprojectName: X\n---\n## A\n```\n## inside\n```\n## B\ntext\n");
        let headings: Vec<_> = detail
            .detailed_sections
            .iter()
            .map(|s| s.heading.as_str())
            .collect();
        assert_eq!(headings, vec!["A", "B"]);
    }

    #[test]
    fn test_any_fence_line_closes_code_block() {
        let detail = parse("---\nprojectName: X\n---\n## A\n```\ncode\n```js\n## B\ntext\n");
        let headings: Vec<_> = detail
            .detailed_sections
            .iter()
            .map(|s| s.heading.as_str())
            .collect();
        assert_eq!(headings, vec!["A", "B"]);
        assert_eq!(detail.detailed_sections[0].body, "```\ncode\n```js");
        assert_eq!(detail.detailed_sections[1].body, "text");
    }

    #[test]
    fn test_blank_heading_is_body_text() {
        let detail = parse("---\nprojectName: X\n---\n## Notes\n##   \ntext\n");
        assert_eq!(detail.detailed_sections.len(), 1);
        assert_eq!(detail.detailed_sections[0].heading, "Notes");
        assert_eq!(detail.detailed_sections[0].body, "##   \ntext");
    }

    #[test]
    fn test_empty_sections_are_dropped() {
        let detail = parse("---\nprojectName: X\n---\n## Empty\n\n   \n## Kept\ntext\n");
        assert_eq!(detail.detailed_sections.len(), 1);
        assert_eq!(detail.detailed_sections[0].heading, "Kept");
    }

    #[test]
    fn test_code_only_section_is_kept() {
        let detail = parse(
            "---\nprojectName: X\n---\n## Pool\n```csharp-preview:assets/code/Pool-preview.cs\n```\n```csharp-expanded:assets/code/Pool-full.cs\n```\n",
        );
        let section = &detail.detailed_sections[0];
        assert_eq!(section.body, "");
        assert_eq!(
            section.code_preview_file.as_deref(),
            Some("assets/code/Pool-preview.cs")
        );
        assert_eq!(
            section.code_expanded_file.as_deref(),
            Some("assets/code/Pool-full.cs")
        );
        assert_eq!(section.code_language.as_deref(), Some("csharp"));
    }

    #[test]
    fn test_code_ref_without_closing_fence() {
        let detail = parse(
            "---\nprojectName: X\n---\n## Terminal\n```cpp-preview:assets/code/Term.cpp\nText after.\n",
        );
        let section = &detail.detailed_sections[0];
        assert_eq!(section.code_language.as_deref(), Some("cpp"));
        assert_eq!(section.body, "Text after.");
    }

    #[test]
    fn test_code_ref_inside_code_block_is_literal() {
        let detail = parse(
            "---\nprojectName: X\n---\n## Docs\n```markdown\n```csharp-preview:x.cs\n```\n",
        );
        let section = &detail.detailed_sections[0];
        assert!(!section.has_code_ref());
        assert!(section.body.contains("```csharp-preview:x.cs"));
    }

    #[test]
    fn test_code_ref_in_overview_is_ignored() {
        let detail = parse("---\nprojectName: X\n---\n```csharp-preview:x.cs\n```\nIntro\n");
        assert_eq!(detail.overview, "Intro");
        assert!(detail.detailed_sections.is_empty());
    }

    #[test]
    fn test_contributions_become_list() {
        let detail = parse(
            "---\nprojectName: X\n---\n## contributions\n- Wrote the pool\n  - Profiled GC spikes  \nnot a bullet\n-\n## Design\ntext\n",
        );
        assert_eq!(
            detail.contributions,
            vec!["Wrote the pool", "Profiled GC spikes"]
        );
        assert!(
            detail
                .detailed_sections
                .iter()
                .all(|s| !s.heading.eq_ignore_ascii_case("contributions"))
        );
        assert_eq!(detail.detailed_sections.len(), 1);
    }

    #[test]
    fn test_multiple_contributions_sections_append() {
        let detail = parse(
            "---\nprojectName: X\n---\n## Contributions\n- one\n## CONTRIBUTIONS \n- two\n",
        );
        assert_eq!(detail.contributions, vec!["one", "two"]);
        assert!(detail.detailed_sections.is_empty());
    }

    #[test]
    fn test_heading_trailing_hashes_trimmed() {
        let detail = parse("---\nprojectName: X\n---\n## Design ##\ntext\n");
        assert_eq!(detail.detailed_sections[0].heading, "Design");
    }
}
