//! Full pages: card index, project detail, not-found and error panels.

use super::{
    Layout,
    code::{SectionCode, render_code},
    escape_html,
    markdown::render_body,
    site_url,
    video::video_embed,
};
use crate::{
    config::SlugMode,
    log,
    project::{
        InfoBox, Links, ProjectDetail, ProjectError, ProjectSummary, project_url,
        summary::card_order,
    },
    utils::slug::Anchors,
};
use std::fmt::Write;

const EXTERNAL: &str = r#"target="_blank" rel="noopener noreferrer""#;

// ============================================================================
// Shared fragments
// ============================================================================

fn flairs(flairs: &[String], class: &str) -> String {
    if flairs.is_empty() {
        return String::new();
    }
    let items: String = flairs
        .iter()
        .map(|f| format!(r#"<li class="flair">{}</li>"#, escape_html(f)))
        .collect();
    format!(r#"<ul class="{class}">{items}</ul>"#)
}

fn links(links: &Links, class: &str) -> String {
    links
        .labelled()
        .into_iter()
        .map(|(label, url)| {
            format!(
                r#"<a class="{class}" href="{}" {EXTERNAL}>{label}</a>"#,
                escape_html(url)
            )
        })
        .collect()
}

fn id_list(available: &[String]) -> String {
    if available.is_empty() {
        return r#"<p class="error-panel__hint">No projects are published yet.</p>"#.to_owned();
    }
    let items: String = available
        .iter()
        .map(|id| {
            format!(
                r#"<li><a href="{}">{}</a></li>"#,
                escape_html(&project_url(id)),
                escape_html(id)
            )
        })
        .collect();
    format!(
        r#"<p class="error-panel__hint">Available projects:</p><ul class="error-panel__ids">{items}</ul>"#
    )
}

// ============================================================================
// Index
// ============================================================================

fn card(summary: &ProjectSummary) -> String {
    let href = escape_html(&summary.detail_url());
    let mut html = String::new();

    let modifier = if summary.highlighted {
        " summary_container--highlighted"
    } else {
        ""
    };
    let _ = write!(
        html,
        r#"<article class="summary_container{modifier}" id="project-{}">"#,
        escape_html(&summary.id)
    );
    let _ = write!(
        html,
        r#"<h2 class="summary_title"><a href="{href}">{}</a></h2>"#,
        escape_html(&summary.title)
    );

    if let Some(src) = &summary.image_src {
        let caption = summary.image_caption.as_deref().unwrap_or(&summary.title);
        let _ = write!(
            html,
            r#"<figure class="summary_figure"><a href="{href}"><img src="{}" alt="{}" loading="lazy"></a>"#,
            escape_html(&site_url(src)),
            escape_html(caption)
        );
        if let Some(caption) = &summary.image_caption {
            let _ = write!(html, "<figcaption>{}</figcaption>", escape_html(caption));
        }
        html.push_str("</figure>");
    }

    if let Some(kind) = &summary.project_type {
        let _ = write!(html, r#"<p class="summary_type">{}</p>"#, escape_html(kind));
    }
    if !summary.description.is_empty() {
        let _ = write!(
            html,
            r#"<p class="summary_description">{}</p>"#,
            escape_html(&summary.description)
        );
    }
    html.push_str(&flairs(&summary.flairs, "flairs"));

    let _ = write!(
        html,
        r#"<div class="summary_links">{}<a class="summary_link summary_link--details" href="{href}">View Details</a></div>"#,
        links(&summary.links, "summary_link")
    );
    html.push_str("</article>");
    html
}

/// The card grid, in display order.
pub fn render_index(layout: &Layout, summaries: &[ProjectSummary]) -> String {
    let cards: String = card_order(summaries).into_iter().map(card).collect();
    let grid = if cards.is_empty() {
        r#"<p class="projects-empty">No projects yet.</p>"#.to_owned()
    } else {
        format!(r#"<div class="projects-grid">{cards}</div>"#)
    };

    let body = format!(
        r#"<section class="projects"><h1 class="projects-title">{}</h1>{grid}</section>"#,
        escape_html(layout.site_title())
    );
    layout.page(layout.site_title(), "index-page", &body)
}

// ============================================================================
// Detail
// ============================================================================

fn info_box(info: &InfoBox) -> String {
    let rows: String = info
        .entries
        .iter()
        .map(|(label, value)| {
            format!(
                "<dt>{}</dt><dd>{}</dd>",
                escape_html(label),
                escape_html(value)
            )
        })
        .collect();
    format!(
        r#"<section class="info-box"><h3 class="info-box__title">{}</h3><dl>{rows}</dl></section>"#,
        escape_html(&info.title)
    )
}

fn hero(detail: &ProjectDetail) -> String {
    let style = detail
        .hero_image
        .as_deref()
        .map(|src| format!(r#" style="--hero-bg-image: url('{}')""#, escape_html(&site_url(src))))
        .unwrap_or_default();
    let kind = detail
        .project_type
        .as_deref()
        .map(|t| format!(r#"<p id="project-type">{}</p>"#, escape_html(t)))
        .unwrap_or_default();
    format!(
        r#"<section id="hero" class="project-hero"{style}><div class="wrapper"><h1 id="project-name">{}</h1>{kind}{}</div></section>"#,
        escape_html(&detail.project_name),
        flairs(&detail.flairs, "project-flairs")
    )
}

/// Page section with its TOC entry.
struct Part {
    anchor: String,
    title: String,
    html: String,
}

/// Render a parsed project; `code` is in `detailed_sections` order.
pub fn render_detail(
    layout: &Layout,
    detail: &ProjectDetail,
    code: &[SectionCode],
    slug: SlugMode,
) -> String {
    let mut anchors = Anchors::new(slug);
    let mut parts = Vec::with_capacity(detail.detailed_sections.len() + 2);

    if !detail.overview.is_empty() {
        parts.push(Part {
            anchor: anchors.anchor("Overview"),
            title: "Overview".into(),
            html: render_body(&detail.overview),
        });
    }

    if !detail.contributions.is_empty() {
        let items: String = detail
            .contributions
            .iter()
            .map(|c| format!("<li>{}</li>", escape_html(c)))
            .collect();
        parts.push(Part {
            anchor: anchors.anchor("Contributions"),
            title: "Contributions".into(),
            html: format!(r#"<ul class="contributions">{items}</ul>"#),
        });
    }

    let no_code = SectionCode::default();
    for (i, section) in detail.detailed_sections.iter().enumerate() {
        let code = code.get(i).unwrap_or(&no_code);
        parts.push(Part {
            anchor: anchors.anchor(&section.heading),
            title: section.heading.clone(),
            html: format!("{}{}", render_body(&section.body), render_code(section, code)),
        });
    }

    let mut content = String::new();
    for part in &parts {
        let _ = write!(
            content,
            r#"<section id="{}" class="project-section"><h2>{}</h2>{}</section>"#,
            escape_html(&part.anchor),
            escape_html(&part.title),
            part.html
        );
    }

    if !detail.project_info.is_empty() {
        let boxes: String = detail.project_info.iter().map(info_box).collect();
        let _ = write!(content, r#"<div id="project-details-container" class="project-info">{boxes}</div>"#);
    }

    if !detail.gallery_images.is_empty() {
        let images: String = detail
            .gallery_images
            .iter()
            .enumerate()
            .map(|(i, src)| {
                let src = escape_html(&site_url(src));
                format!(
                    r#"<a href="{src}" {EXTERNAL}><img src="{src}" alt="{} screenshot {}" loading="lazy"></a>"#,
                    escape_html(&detail.project_name),
                    i + 1
                )
            })
            .collect();
        let _ = write!(
            content,
            r#"<section class="project-gallery"><h2>Gallery</h2><div class="gallery-grid">{images}</div></section>"#
        );
    }

    if let Some(url) = &detail.video_url {
        match video_embed(url) {
            Some(embed) => {
                let _ = write!(
                    content,
                    r#"<section class="project-video"><h2>Video</h2>{embed}</section>"#
                );
            }
            None => log!("warn"; "project `{}`: unsupported video source `{}`", detail.id, url),
        }
    }

    let project_links = links(&detail.links, "project-link");
    if !project_links.is_empty() {
        let _ = write!(content, r#"<div class="project-links">{project_links}</div>"#);
    }

    let toc = if parts.is_empty() {
        String::new()
    } else {
        let entries: String = parts
            .iter()
            .map(|p| {
                format!(
                    r##"<li><a href="#{}">{}</a></li>"##,
                    escape_html(&p.anchor),
                    escape_html(&p.title)
                )
            })
            .collect();
        format!(r#"<nav class="project-toc" aria-label="Contents"><h2>Contents</h2><ol>{entries}</ol></nav>"#)
    };

    let body = format!(
        r#"{}<div class="wrapper project-layout">{toc}<article class="project-content">{content}</article></div>"#,
        hero(detail)
    );
    layout.page(&detail.page_title, "project-detail-page", &body)
}

// ============================================================================
// Panels
// ============================================================================

/// "Project Not Found" panel; `id` is `None` for the generic 404 page.
pub fn render_not_found(layout: &Layout, id: Option<&str>, available: &[String]) -> String {
    let message = match id {
        Some(id) => format!(
            "<p>No project with id <code>{}</code> exists.</p>",
            escape_html(id)
        ),
        None => "<p>The page you requested does not exist.</p>".to_owned(),
    };
    let body = format!(
        r#"<section class="error-panel error-panel--not-found"><h1>Project Not Found</h1>{message}{}<p><a href="/">Back to all projects</a></p></section>"#,
        id_list(available)
    );
    layout.page("Project Not Found", "error-page", &body)
}

/// Generic "Error" panel with the failure message.
pub fn render_error(layout: &Layout, message: &str, available: &[String]) -> String {
    let body = format!(
        r#"<section class="error-panel"><h1>Error</h1><p class="error-panel__message">{}</p>{}<p><a href="/">Back to all projects</a></p></section>"#,
        escape_html(message),
        id_list(available)
    );
    layout.page("Error", "error-page", &body)
}

/// Panel for a failed project page.
pub fn render_failure(layout: &Layout, err: &ProjectError, available: &[String]) -> String {
    match err {
        ProjectError::NotFound { id, available } => {
            render_not_found(layout, Some(id.as_str()), available)
        }
        other => render_error(layout, &other.to_string(), available),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{project::parse_project, render::code::SectionCode};

    const INVENTORY: &str = r#"---
title: Inventory | Jane
projectName: Networked Inventory
projectType: Team Project
heroImage: assets/images/inv.png
flairs: [Unity, C#]
projectInfo:
  Duration: 8 weeks
galleryImages: [assets/images/1.png, assets/images/2.png]
videoURL: https://youtu.be/dQw4w9WgXcQ
links:
  github: https://github.com/jane/inv
---
Server authoritative inventory.

## Design
Slots are {{image:assets/images/slots.png|Slot layout|right}} synced.

## Design
Second design section.

```csharp-preview:assets/code/Inv.cs
```

## Contributions
- Built the sync layer
"#;

    fn summary(id: &str, highlighted: bool) -> ProjectSummary {
        ProjectSummary {
            id: id.into(),
            title: format!("Title {id}"),
            highlighted,
            ..Default::default()
        }
    }

    #[test]
    fn test_index_orders_highlighted_first() {
        let html = render_index(&Layout::default(), &[summary("a", false), summary("b", true)]);
        let a = html.find(r#"id="project-a""#).unwrap();
        let b = html.find(r#"id="project-b""#).unwrap();
        assert!(b < a);
        assert!(html.contains(r#"<article class="summary_container summary_container--highlighted" id="project-b">"#));
        assert!(html.contains(r#"href="/projects/a/">View Details</a>"#));
    }

    #[test]
    fn test_index_skips_hidden_and_handles_empty() {
        let mut hidden = summary("h", false);
        hidden.hidden = true;
        let html = render_index(&Layout::default(), &[hidden]);
        assert!(!html.contains("project-h"));
        assert!(html.contains("No projects yet."));
    }

    #[test]
    fn test_card_href_matches_panel_href() {
        let card = card(&summary("a#b", false));
        assert!(card.contains(r#"<a href="/projects/a%23b/">Title a#b</a>"#));

        let panel = render_not_found(&Layout::default(), None, &["a#b".to_owned()]);
        assert!(panel.contains(r#"<a href="/projects/a%23b/">a#b</a>"#));
    }

    #[test]
    fn test_card_links_and_image() {
        let mut s = summary("pool", false);
        s.image_src = Some("assets/pool.png".into());
        s.image_caption = Some("Pool <demo>".into());
        s.flairs = vec!["Unity".into()];
        s.links.demo = Some("https://jane.itch.io/pool".into());
        let html = card(&s);
        assert!(html.contains(r#"<img src="/assets/pool.png" alt="Pool &lt;demo&gt;" loading="lazy">"#));
        assert!(html.contains("<figcaption>Pool &lt;demo&gt;</figcaption>"));
        assert!(html.contains(r#"<li class="flair">Unity</li>"#));
        assert!(html.contains(r#"href="https://jane.itch.io/pool" target="_blank" rel="noopener noreferrer">Play Demo</a>"#));
    }

    #[test]
    fn test_detail_page() {
        let detail = parse_project("inventory", INVENTORY).unwrap();
        let code = vec![
            SectionCode::default(),
            SectionCode {
                preview: Some(Ok("class Inv {}".into())),
                expanded: None,
            },
        ];
        let html = render_detail(&Layout::default(), &detail, &code, SlugMode::On);

        assert!(html.contains("<title>Inventory | Jane</title>"));
        assert!(html.contains(r#"style="--hero-bg-image: url('/assets/images/inv.png')""#));
        assert!(html.contains(r#"<h1 id="project-name">Networked Inventory</h1>"#));
        assert!(html.contains(r##"<a href="#overview">Overview</a>"##));
        assert!(html.contains(r##"<a href="#design">Design</a>"##));
        assert!(html.contains(r##"<a href="#design-2">Design</a>"##));
        assert!(html.contains(r#"<section id="design-2" class="project-section">"#));
        assert!(html.contains(r#"content-image--right"#));
        assert!(html.contains(r#"alt="Slot layout""#));
        assert!(html.contains(r#"<code class="language-csharp">class Inv {}</code>"#));
        assert!(html.contains("<li>Built the sync layer</li>"));
        assert!(html.contains("<dt>Duration</dt><dd>8 weeks</dd>"));
        assert!(html.contains(r#"alt="Networked Inventory screenshot 2""#));
        assert!(html.contains("youtube.com/embed/dQw4w9WgXcQ"));
        assert!(html.contains(">View on GitHub</a>"));
    }

    #[test]
    fn test_not_found_panel_shows_literal_id() {
        let available = vec!["inventory".to_owned(), "pool".to_owned()];
        let html = render_not_found(&Layout::default(), Some("<unknown>"), &available);
        assert!(html.contains("<h1>Project Not Found</h1>"));
        assert!(html.contains("<code>&lt;unknown&gt;</code>"));
        assert!(html.contains(r#"<a href="/projects/inventory/">inventory</a>"#));
        assert!(html.contains(r#"<a href="/projects/pool/">pool</a>"#));
    }

    #[test]
    fn test_failure_dispatch() {
        let not_found = ProjectError::NotFound {
            id: "nope".into(),
            available: vec!["pool".into()],
        };
        let html = render_failure(&Layout::default(), &not_found, &[]);
        assert!(html.contains("Project Not Found"));
        assert!(html.contains("/projects/pool/"));

        let format = ProjectError::MissingClosingDelimiter { id: "pool".into() };
        let html = render_failure(&Layout::default(), &format, &["pool".to_owned()]);
        assert!(html.contains("<h1>Error</h1>"));
        assert!(html.contains("project `pool`: frontmatter is not closed"));
    }
}
