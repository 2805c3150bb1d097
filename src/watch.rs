//! File system watcher for live rebuilds.
//!
//! Monitors the data directory, assets, partials and the config file, and
//! rebuilds the whole site after a burst of changes settles.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐    ┌───────────┐    ┌──────────────────┐
//! │ notify   │───▶│ Debouncer │───▶│ handle_changes() │──▶ build_site()
//! │ events   │    │ (300ms)   │    │ (800ms cooldown) │
//! └──────────┘    └───────────┘    └──────────────────┘
//! ```

use crate::{build::build_site, config::SiteConfig, log};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    sync::{Arc, mpsc::RecvTimeoutError},
    time::{Duration, Instant},
};

const DEBOUNCE_MS: u64 = 300;
const REBUILD_COOLDOWN_MS: u64 = 800;

/// What a changed path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Config,
    Partial,
    Data,
    Asset,
    Unknown,
}

impl Source {
    fn of(path: &Path, config: &SiteConfig) -> Self {
        let partials = [&config.build.header, &config.build.footer];
        if path == config.config_path {
            Self::Config
        } else if partials.iter().any(|p| p.as_deref() == Some(path)) {
            Self::Partial
        } else if path.starts_with(&config.build.data) {
            Self::Data
        } else if path.starts_with(&config.build.assets) {
            Self::Asset
        } else {
            Self::Unknown
        }
    }
}

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// `/site/data/projects/pool.md` → `data/projects/pool.md`
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events with debouncing and rebuild cooldown.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    last_rebuild: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
            last_rebuild: None,
        }
    }

    fn in_cooldown(&self) -> bool {
        self.last_rebuild
            .is_some_and(|t| t.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS))
    }

    fn add(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        let before = self.pending.len();
        self.pending
            .extend(paths.into_iter().filter(|p| !is_temp_file(p)));
        if self.pending.len() != before {
            self.last_event = Some(Instant::now());
        }
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        let mut paths: Vec<_> = self.pending.drain().collect();
        paths.sort();
        paths
    }

    fn mark_rebuild(&mut self) {
        self.last_rebuild = Some(Instant::now());
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

// =============================================================================
// Event Handler
// =============================================================================

/// Rebuild for a batch of changes. Returns true if a rebuild ran.
fn handle_changes(paths: &[PathBuf], config: &SiteConfig) -> bool {
    let relevant: Vec<_> = paths
        .iter()
        .map(|p| (p, Source::of(p, config)))
        .filter(|(_, source)| *source != Source::Unknown)
        .collect();
    if relevant.is_empty() {
        return false;
    }

    if relevant.iter().any(|(_, s)| *s == Source::Config) {
        log!("warn"; "config changed, restart `serve` to apply it");
    }

    let root = config.get_root();
    let trigger = relevant
        .iter()
        .map(|(p, _)| rel_path(p, root))
        .collect::<Vec<_>>()
        .join(", ");
    log!("watch"; "{} changed, rebuilding...", trigger);

    match build_site(config) {
        Ok(report) if report.failed.is_empty() => {
            log!("watch"; "rebuilt {} pages, {} assets", report.pages, report.assets)
        }
        Ok(report) => log!("watch"; "rebuilt with {} failed project(s)", report.failed.len()),
        Err(e) => log!("watch"; "build failed: {:#}", e),
    }
    eprintln!();
    true
}

// =============================================================================
// Watcher Setup
// =============================================================================

/// Paths to watch with their recursion mode.
fn watch_targets(config: &SiteConfig) -> Vec<(PathBuf, RecursiveMode)> {
    let build = &config.build;
    let dirs = [&build.data, &build.assets]
        .into_iter()
        .map(|p| (p.clone(), RecursiveMode::Recursive));
    let files = [Some(&config.config_path), build.header.as_ref(), build.footer.as_ref()]
        .into_iter()
        .flatten()
        .map(|p| (p.clone(), RecursiveMode::NonRecursive));
    dirs.chain(files).filter(|(p, _)| p.exists()).collect()
}

fn setup_watchers(watcher: &mut impl Watcher, config: &SiteConfig) -> Result<()> {
    let root = config.get_root();
    let targets = watch_targets(config);
    for (path, mode) in &targets {
        watcher
            .watch(path, *mode)
            .with_context(|| format!("Failed to watch {}", path.display()))?;
    }

    let names: Vec<_> = targets.iter().map(|(p, _)| rel_path(p, root)).collect();
    log!("watch"; "watching {}", names.join(", "));
    eprintln!();
    Ok(())
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

// =============================================================================
// Public API
// =============================================================================

/// Start blocking file watcher with debouncing and live rebuild.
pub fn watch_for_changes_blocking(config: Arc<SiteConfig>) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    setup_watchers(&mut watcher, &config)?;

    let mut debouncer = Debouncer::new();

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) && !debouncer.in_cooldown() => {
                debouncer.add(event.paths);
            }
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(RecvTimeoutError::Timeout) if debouncer.ready() => {
                if handle_changes(&debouncer.take(), &config) {
                    debouncer.mark_rebuild();
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }

    Ok(())
}
