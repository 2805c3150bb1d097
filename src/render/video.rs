//! Video embeds for YouTube, Vimeo and plain video files.

use super::{escape_html, site_url};
use url::Url;

const YOUTUBE_EMBED: &str = "https://www.youtube.com/embed/";
const VIMEO_EMBED: &str = "https://player.vimeo.com/video/";

/// File extensions served with a `<video>` element.
const VIDEO_TYPES: &[(&str, &str)] = &[
    (".mp4", "video/mp4"),
    (".webm", "video/webm"),
    (".ogg", "video/ogg"),
];

#[derive(Debug, PartialEq, Eq)]
enum VideoSource<'a> {
    YouTube(String),
    Vimeo(String),
    File { src: &'a str, mime: &'static str },
}

/// Render an embed for `src`, or `None` if the source is not recognized.
pub fn video_embed(src: &str) -> Option<String> {
    let inner = match classify(src.trim())? {
        VideoSource::YouTube(id) => format!(
            r#"<iframe src="{YOUTUBE_EMBED}{id}" title="YouTube video player" frameborder="0" allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture" allowfullscreen></iframe>"#
        ),
        VideoSource::Vimeo(id) => format!(
            r#"<iframe src="{VIMEO_EMBED}{id}" title="Vimeo video player" frameborder="0" allow="autoplay; fullscreen; picture-in-picture" allowfullscreen></iframe>"#
        ),
        VideoSource::File { src, mime } => format!(
            r#"<video controls preload="metadata"><source src="{}" type="{mime}">Your browser does not support the video tag.</video>"#,
            escape_html(&site_url(src))
        ),
    };
    Some(format!(r#"<div class="video-container">{inner}</div>"#))
}

fn classify(src: &str) -> Option<VideoSource<'_>> {
    if src.is_empty() {
        return None;
    }

    // Site-relative paths fail to parse as URLs; only a file extension can match them.
    let Ok(url) = Url::parse(src) else {
        return video_file(src, src);
    };

    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");
    match host {
        "youtu.be" => first_segment(&url).and_then(video_id).map(VideoSource::YouTube),
        "youtube.com" | "youtube-nocookie.com" => youtube_id(&url).map(VideoSource::YouTube),
        "vimeo.com" | "player.vimeo.com" => url
            .path_segments()?
            .filter(|seg| !seg.is_empty())
            .last()
            .filter(|seg| seg.chars().all(|c| c.is_ascii_digit()))
            .map(|id| VideoSource::Vimeo(id.to_owned())),
        _ => video_file(src, url.path()),
    }
}

fn youtube_id(url: &Url) -> Option<String> {
    if let Some((_, v)) = url.query_pairs().find(|(key, _)| key == "v") {
        return video_id(&v);
    }
    let mut segments = url.path_segments()?;
    match segments.next()? {
        "embed" | "shorts" | "live" | "v" => segments.next().and_then(video_id),
        _ => None,
    }
}

fn first_segment(url: &Url) -> Option<&str> {
    url.path_segments()?.next()
}

/// YouTube ids are short `[A-Za-z0-9_-]` tokens.
fn video_id(id: &str) -> Option<String> {
    let valid = !id.is_empty()
        && id.len() <= 32
        && id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
    valid.then(|| id.to_owned())
}

fn video_file<'a>(src: &'a str, path: &str) -> Option<VideoSource<'a>> {
    let path = path.to_ascii_lowercase();
    VIDEO_TYPES
        .iter()
        .find(|(ext, _)| path.ends_with(ext))
        .map(|&(_, mime)| VideoSource::File { src, mime })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_variants() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?t=42",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://m.youtube.com/shorts/dQw4w9WgXcQ",
        ] {
            assert_eq!(
                classify(url),
                Some(VideoSource::YouTube("dQw4w9WgXcQ".into())),
                "{url}"
            );
        }
    }

    #[test]
    fn test_youtube_embed_html() {
        let html = video_embed("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert!(html.starts_with(r#"<div class="video-container"><iframe"#));
        assert!(html.contains(r#"src="https://www.youtube.com/embed/dQw4w9WgXcQ""#));
        assert!(html.contains("allowfullscreen"));
    }

    #[test]
    fn test_vimeo() {
        let html = video_embed("https://vimeo.com/76979871").unwrap();
        assert!(html.contains(r#"src="https://player.vimeo.com/video/76979871""#));
        assert_eq!(classify("https://vimeo.com/channels/staffpicks"), None);
    }

    #[test]
    fn test_video_files() {
        let html = video_embed("assets/videos/demo.MP4").unwrap();
        assert!(html.contains(r#"<source src="/assets/videos/demo.MP4" type="video/mp4">"#));
        assert!(html.contains("<video controls"));

        let html = video_embed("https://cdn.example.com/clip.webm?sig=1&x=2").unwrap();
        assert!(html.contains(r#"type="video/webm""#));
        assert!(html.contains("sig=1&amp;x=2"));

        assert!(video_embed("/media/trailer.ogg").unwrap().contains("video/ogg"));
    }

    #[test]
    fn test_unrecognized_sources() {
        assert_eq!(video_embed(""), None);
        assert_eq!(video_embed("assets/videos/demo.avi"), None);
        assert_eq!(video_embed("https://example.com/watch?v=abc"), None);
        assert_eq!(video_embed("https://www.youtube.com/watch?v=<script>"), None);
    }
}
