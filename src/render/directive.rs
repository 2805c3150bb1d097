//! `{{kind:args}}` directives in rendered section HTML.
//!
//! ```text
//! {{image:path|caption|position}}
//! {{gallery:a.png,b.png|caption}}
//! {{video:url|caption}}
//! ```
//!
//! Expansion runs on HTML, after markdown rendering. Text inside `<code>` is
//! left alone so directives can be documented in code spans.

use super::{escape_html, site_url, unescape_html, video::video_embed};
use crate::log;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// A directive alone in its paragraph; the `<p>` wrapper is replaced too.
static RE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<p>\s*\{\{\s*(image|gallery|video)\s*:([^{}<>]*)\}\}\s*</p>").unwrap()
});

static RE_INLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*(image|gallery|video)\s*:([^{}<>]*)\}\}").unwrap());

static RE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<code[^>]*>.*?</code>").unwrap());

/// Image placement keyword.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Position {
    Inline,
    Left,
    Right,
    #[default]
    Center,
}

impl Position {
    /// Exact keyword match; anything else is not a position.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "inline" => Some(Self::Inline),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "center" => Some(Self::Center),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Left => "left",
            Self::Right => "right",
            Self::Center => "center",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Image {
        src: String,
        caption: Option<String>,
        position: Position,
    },
    Gallery {
        images: Vec<String>,
        caption: Option<String>,
    },
    Video {
        src: String,
        caption: Option<String>,
    },
}

impl Directive {
    /// Parse the decoded argument text of a directive.
    ///
    /// Returns `None` for unknown kinds or a missing source.
    pub fn parse(kind: &str, args: &str) -> Option<Self> {
        let args: Vec<&str> = args.split('|').map(str::trim).collect();
        let src = args.first().copied().filter(|s| !s.is_empty())?;
        let arg = |i: usize| args.get(i).copied().filter(|s| !s.is_empty());

        match kind {
            "image" => {
                let (caption, position) = match arg(1) {
                    Some(second) => match Position::from_keyword(second) {
                        Some(position) => (None, position),
                        None => (
                            Some(second.to_owned()),
                            arg(2).and_then(Position::from_keyword).unwrap_or_default(),
                        ),
                    },
                    None => (None, Position::default()),
                };
                Some(Self::Image {
                    src: src.to_owned(),
                    caption,
                    position,
                })
            }
            "gallery" => {
                let images: Vec<String> = src
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect();
                (!images.is_empty()).then(|| Self::Gallery {
                    images,
                    caption: arg(1).map(str::to_owned),
                })
            }
            "video" => Some(Self::Video {
                src: src.to_owned(),
                caption: arg(1).map(str::to_owned),
            }),
            _ => None,
        }
    }

    pub fn to_html(&self) -> String {
        match self {
            Self::Image {
                src,
                caption,
                position,
            } => {
                let alt = caption.as_deref().unwrap_or_default();
                format!(
                    r#"<figure class="content-image content-image--{}"><img src="{}" alt="{}" loading="lazy">{}</figure>"#,
                    position.as_str(),
                    escape_html(&site_url(src)),
                    escape_html(alt),
                    figcaption(caption.as_deref())
                )
            }
            Self::Gallery { images, caption } => {
                let alt = escape_html(caption.as_deref().unwrap_or_default());
                let items: String = images
                    .iter()
                    .map(|src| {
                        let src = escape_html(&site_url(src));
                        format!(
                            r#"<a href="{src}" target="_blank" rel="noopener noreferrer"><img src="{src}" alt="{alt}" loading="lazy"></a>"#
                        )
                    })
                    .collect();
                format!(
                    r#"<figure class="content-gallery"><div class="content-gallery__grid">{items}</div>{}</figure>"#,
                    figcaption(caption.as_deref())
                )
            }
            Self::Video { src, caption } => match video_embed(src) {
                Some(embed) => format!(
                    r#"<figure class="content-video">{embed}{}</figure>"#,
                    figcaption(caption.as_deref())
                ),
                None => {
                    log!("warn"; "unsupported video source `{}`", src);
                    String::new()
                }
            },
        }
    }
}

fn figcaption(caption: Option<&str>) -> String {
    caption
        .map(|c| format!("<figcaption>{}</figcaption>", escape_html(c)))
        .unwrap_or_default()
}

/// Expand every directive in `html` outside `<code>` elements.
pub fn expand_directives(html: &str) -> String {
    if !html.contains("{{") {
        return html.to_owned();
    }

    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for code in RE_CODE.find_iter(html) {
        out.push_str(&expand_segment(&html[last..code.start()]));
        out.push_str(code.as_str());
        last = code.end();
    }
    out.push_str(&expand_segment(&html[last..]));
    out
}

fn expand_segment(html: &str) -> String {
    let replace = |caps: &Captures| {
        Directive::parse(&caps[1], &unescape_html(&caps[2]))
            .map_or_else(|| caps[0].to_owned(), |d| d.to_html())
    };
    let html = RE_BLOCK.replace_all(html, replace);
    RE_INLINE.replace_all(&html, replace).into_owned()
}
