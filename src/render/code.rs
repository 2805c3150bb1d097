//! External code files referenced by `lang-preview:` / `lang-expanded:` fences.

use super::escape_html;
use crate::{log, project::DetailedSection};
use rayon::prelude::*;
use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};
use thiserror::Error;

/// A code file that could not be loaded. Scoped to its own block.
#[derive(Debug, Error)]
#[error("Error loading code file: {path}")]
pub struct CodeFileError {
    pub path: String,
    #[source]
    source: io::Error,
}

pub type CodeText = Result<String, CodeFileError>;

/// Loaded files of one section, in section order.
#[derive(Debug, Default)]
pub struct SectionCode {
    pub preview: Option<CodeText>,
    pub expanded: Option<CodeText>,
}

/// Load the code files of every section, sections in parallel.
///
/// Failures are logged and kept per block.
pub fn load_section_code(sections: &[DetailedSection], root: &Path) -> Vec<SectionCode> {
    sections
        .par_iter()
        .map(|section| SectionCode {
            preview: section.code_preview_file.as_deref().map(|p| load(root, p)),
            expanded: section.code_expanded_file.as_deref().map(|p| load(root, p)),
        })
        .collect()
}

fn load(root: &Path, path: &str) -> CodeText {
    let result = resolve(root, path).and_then(|full| fs::read_to_string(full));
    result.map_err(|source| {
        log!("warn"; "failed to load code file `{}`: {}", path, source);
        CodeFileError {
            path: path.to_owned(),
            source,
        }
    })
}

/// Resolve a site-relative path, refusing to leave the site root.
fn resolve(root: &Path, path: &str) -> io::Result<PathBuf> {
    let relative = Path::new(path.trim_start_matches('/'));
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "path leaves the site root",
        ));
    }
    Ok(root.join(relative))
}

/// Render the code block of a section; empty when it has no code reference.
pub fn render_code(section: &DetailedSection, code: &SectionCode) -> String {
    if code.preview.is_none() && code.expanded.is_none() {
        return String::new();
    }

    let lang = section.code_language.as_deref().unwrap_or("plaintext");
    let mut html = String::from(r#"<div class="code-snippet">"#);

    if let Some(preview) = &code.preview {
        let file = section.code_preview_file.as_deref().unwrap_or_default();
        html.push_str(&header(lang, file));
        html.push_str(&code_block(preview, lang));
    }
    if let Some(expanded) = &code.expanded {
        if code.preview.is_none() {
            let file = section.code_expanded_file.as_deref().unwrap_or_default();
            html.push_str(&header(lang, file));
        }
        html.push_str(r#"<details class="code-snippet__expanded"><summary>View full code</summary>"#);
        html.push_str(&code_block(expanded, lang));
        html.push_str("</details>");
    }

    html.push_str("</div>");
    html
}

fn header(lang: &str, file: &str) -> String {
    let name = Path::new(file)
        .file_name()
        .map_or(file.into(), |n| n.to_string_lossy());
    format!(
        r#"<div class="code-snippet__header"><span class="code-snippet__lang">{}</span><span class="code-snippet__file">{}</span></div>"#,
        escape_html(lang),
        escape_html(&name)
    )
}

fn code_block(text: &CodeText, lang: &str) -> String {
    match text {
        Ok(code) => format!(
            r#"<pre><code class="language-{}">{}</code></pre>"#,
            escape_html(lang),
            escape_html(code)
        ),
        Err(err) => format!(r#"<p class="code-error">{}</p>"#, escape_html(&err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn section(preview: Option<&str>, expanded: Option<&str>) -> DetailedSection {
        DetailedSection {
            heading: "Pooling".into(),
            code_preview_file: preview.map(Into::into),
            code_expanded_file: expanded.map(Into::into),
            code_language: Some("csharp".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_and_render() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assets/code")).unwrap();
        fs::write(dir.path().join("assets/code/Pool.cs"), "if (a < b) {}").unwrap();

        let sections = [
            section(Some("assets/code/Pool.cs"), Some("assets/code/Missing.cs")),
            DetailedSection::default(),
        ];
        let code = load_section_code(&sections, dir.path());
        assert_eq!(code.len(), 2);
        assert!(code[1].preview.is_none());

        let html = render_code(&sections[0], &code[0]);
        assert!(html.contains(r#"<pre><code class="language-csharp">if (a &lt; b) {}</code></pre>"#));
        assert!(html.contains("<details"));
        assert!(html.contains("Error loading code file: assets/code/Missing.cs"));
        assert!(html.contains(r#"<span class="code-snippet__file">Pool.cs</span>"#));

        assert_eq!(render_code(&sections[1], &code[1]), "");
    }

    #[test]
    fn test_leading_slash_is_site_relative() {
        let root = Path::new("/site");
        assert_eq!(
            resolve(root, "/assets/code/a.cs").unwrap(),
            Path::new("/site/assets/code/a.cs")
        );
    }

    #[test]
    fn test_parent_dir_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path(), "../secret.txt").unwrap_err();
        assert_eq!(err.path, "../secret.txt");
        assert_eq!(err.to_string(), "Error loading code file: ../secret.txt");
    }

    #[test]
    fn test_expanded_only_has_header() {
        let sec = section(None, Some("Full.cs"));
        let code = SectionCode {
            preview: None,
            expanded: Some(Ok("class Full {}".into())),
        };
        let html = render_code(&sec, &code);
        assert!(html.contains("Full.cs"));
        assert!(html.contains("class Full {}"));
    }
}
