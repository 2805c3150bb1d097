//! Markdown to HTML for overview and section bodies.

use super::directive::expand_directives;
use pulldown_cmark::{Options, Parser, html};

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Render markdown without directive expansion.
pub fn to_html(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(markdown, options()));
    out
}

/// Render a body and expand `{{image:..}}`-style directives in the result.
pub fn render_body(markdown: &str) -> String {
    if markdown.trim().is_empty() {
        return String::new();
    }
    expand_directives(&to_html(markdown))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_code_gets_language_class() {
        let html = to_html("```csharp\nvar x = 1 < 2;\n```");
        assert!(html.contains(r#"<code class="language-csharp">"#));
        assert!(html.contains("1 &lt; 2"));
    }

    #[test]
    fn test_tables_enabled() {
        let html = to_html("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_render_body_expands_directives() {
        let html = render_body("Intro text.\n\n{{image:assets/a.png|Diagram}}\n");
        assert!(html.contains("<p>Intro text.</p>"));
        assert!(html.contains(r#"<figure class="content-image content-image--center">"#));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_directive_inside_code_span_is_kept() {
        let html = render_body("Use `{{image:x.png}}` in markdown.");
        assert!(html.contains("<code>{{image:x.png}}</code>"));
    }

    #[test]
    fn test_blank_body() {
        assert_eq!(render_body("  \n"), "");
    }
}
