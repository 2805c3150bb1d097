//! Heading anchor slugification.

use crate::config::SlugMode;
use rustc_hash::{FxHashMap, FxHashSet};

/// Characters forbidden in fragments
const FORBIDDEN_CHARS: &[char] = &[
    '<', '>', ':', '|', '?', '*', '#', '\\', '(', ')', '[', ']', '"', '\'', '\t', '\r', '\n',
];

/// Anchor used when a heading slugifies to nothing
const FALLBACK_ANCHOR: &str = "section";

// ============================================================================
// Slugification
// ============================================================================

/// Convert fragment text to an anchor according to `mode`.
pub fn slugify_fragment(text: &str, mode: SlugMode) -> String {
    match mode {
        SlugMode::Safe => sanitize_text(text),
        SlugMode::On => slugify(text),
        SlugMode::No => text.trim().to_owned(),
    }
}

/// ASCII-fold, lowercase and join alphanumeric runs with `-`.
///
/// `"Über Networking & Sync"` becomes `"uber-networking-sync"`.
fn slugify(text: &str) -> String {
    let ascii = deunicode::deunicode(text).to_ascii_lowercase();
    let mut slug = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Remove forbidden characters and replace whitespace with underscores
fn sanitize_text(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

// ============================================================================
// Unique anchors
// ============================================================================

/// Hands out page-unique anchors; repeats get `-2`, `-3`, ...
#[derive(Debug)]
pub struct Anchors {
    mode: SlugMode,
    counts: FxHashMap<String, usize>,
    used: FxHashSet<String>,
}

impl Anchors {
    pub fn new(mode: SlugMode) -> Self {
        Self {
            mode,
            counts: FxHashMap::default(),
            used: FxHashSet::default(),
        }
    }

    pub fn anchor(&mut self, text: &str) -> String {
        let mut base = slugify_fragment(text, self.mode);
        if base.is_empty() {
            base = FALLBACK_ANCHOR.to_owned();
        }

        // A literal heading "x 2" may already own `x-2`, so keep counting.
        let count = self.counts.entry(base.clone()).or_insert(0);
        loop {
            *count += 1;
            let candidate = if *count == 1 {
                base.clone()
            } else {
                format!("{base}-{count}")
            };
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}
