//! Output minification for rendered pages and the sitemap.

use std::borrow::Cow;

/// Minifier configured once per build and shared by rayon workers.
///
/// Disabled minifiers hand the input back borrowed.
pub struct Minifier {
    cfg: Option<minify_html::Cfg>,
}

impl Minifier {
    pub fn new(enabled: bool) -> Self {
        let cfg = enabled.then(|| {
            let mut cfg = minify_html::Cfg::new();
            cfg.keep_closing_tags = true;
            cfg.keep_html_and_head_opening_tags = true;
            cfg.keep_comments = false;
            cfg.minify_css = true;
            // Theme scripts are external files; nothing inline to shrink.
            cfg.minify_js = false;
            cfg.remove_bangs = true;
            cfg.remove_processing_instructions = true;
            cfg
        });
        Self { cfg }
    }

    pub const fn is_enabled(&self) -> bool {
        self.cfg.is_some()
    }

    pub fn html<'a>(&self, html: &'a str) -> Cow<'a, str> {
        match &self.cfg {
            Some(cfg) => Cow::Owned(into_string(minify_html::minify(html.as_bytes(), cfg))),
            None => Cow::Borrowed(html),
        }
    }

    /// Strip indentation and blank lines; XML is never restructured.
    pub fn xml<'a>(&self, xml: &'a str) -> Cow<'a, str> {
        if !self.is_enabled() {
            return Cow::Borrowed(xml);
        }
        Cow::Owned(xml.lines().map(str::trim).filter(|l| !l.is_empty()).collect())
    }
}

fn into_string(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}
