//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── prepare_output()       clean + create output dir
//!     ├── load_summaries()       data/projects.yaml
//!     │
//!     ├── rayon::join ─┬── render_projects() ──► public/projects/<id>/index.html
//!     │                └── copy_assets()     ──► public/assets/...
//!     │
//!     ├── index.html + 404.html
//!     └── build_sitemap()
//! ```

use crate::{
    config::SiteConfig,
    log,
    logger::ProgressBars,
    project::{
        ProjectSummary,
        summary::{listed_ids, load_summaries},
    },
    render::{
        Layout,
        pages::{render_failure, render_index, render_not_found},
        render_project,
    },
    sitemap::build_sitemap,
    utils::minify::Minifier,
};
use anyhow::{Context, Result, anyhow, bail};
use rayon::prelude::*;
use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};
use walkdir::WalkDir;

/// Files never copied to the output
const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// Subdirectory of the output holding detail pages
const PROJECTS_DIR: &str = "projects";

/// Outcome of a successful build.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub pages: usize,
    pub assets: usize,
    /// Projects rendered as error panels
    pub failed: Vec<String>,
}

/// Build the whole site, rendering projects and copying assets in parallel.
///
/// A project that fails to load is logged and written as an error panel,
/// unless `build.strict` is set, in which case the build fails after all
/// pages were attempted.
pub fn build_site(config: &SiteConfig) -> Result<BuildReport> {
    let output = &config.build.output;
    prepare_output(output, config.build.clean)?;

    let layout = Layout::from_config(config)?;
    let summaries = load_summaries(&config.summaries_path())
        .with_context(|| "Failed to load project summaries")?;
    let listed = listed_ids(&summaries);
    let minifier = Minifier::new(config.build.minify);

    let asset_files = collect_all_files(&config.build.assets);
    log!("build"; "{} projects, {} assets", summaries.len(), asset_files.len());

    let progress = ProgressBars::new_filtered(&[
        ("projects", summaries.len()),
        ("assets", asset_files.len()),
    ]);
    let tick = |name: &str| {
        if let Some(progress) = &progress {
            progress.inc_by_name(name);
        }
    };

    let has_error = AtomicBool::new(false);
    let failed = Mutex::new(Vec::new());
    let clean = config.build.clean;

    let (projects_result, assets_result) = rayon::join(
        || {
            summaries.par_iter().try_for_each(|summary| {
                if has_error.load(Ordering::Relaxed) {
                    return Err(anyhow!("Aborted"));
                }
                let html = match render_project(config, &layout, &summary.id, &summaries) {
                    Ok(html) => html,
                    Err(e) => {
                        let level = if e.is_format_error() { "error" } else { "warn" };
                        log!(level; "{}", e);
                        if let Ok(mut failed) = failed.lock() {
                            failed.push(summary.id.clone());
                        }
                        render_failure(&layout, &e, &listed)
                    }
                };
                let dest = project_output(output, summary);
                if let Err(e) = write_page(&dest, &html, &minifier) {
                    if !has_error.swap(true, Ordering::Relaxed) {
                        log!("error"; "{:#}", e);
                    }
                    return Err(anyhow!("Build failed"));
                }
                tick("projects");
                Ok(())
            })
        },
        || {
            asset_files.par_iter().try_for_each(|path| {
                if has_error.load(Ordering::Relaxed) {
                    return Err(anyhow!("Aborted"));
                }
                if let Err(e) = copy_asset(path, config, clean) {
                    if !has_error.swap(true, Ordering::Relaxed) {
                        log!("error"; "{}: {:#}", path.display(), e);
                    }
                    return Err(anyhow!("Build failed"));
                }
                tick("assets");
                Ok(())
            })
        },
    );

    if let Some(progress) = &progress {
        progress.finish();
    }
    projects_result?;
    assets_result?;

    write_page(&output.join("index.html"), &render_index(&layout, &summaries), &minifier)?;
    write_page(
        &output.join("404.html"),
        &render_not_found(&layout, None, &listed),
        &minifier,
    )?;
    build_sitemap(config, &summaries, &minifier)?;

    let mut failed = failed.into_inner().unwrap_or_default();
    failed.sort();
    if config.build.strict && !failed.is_empty() {
        bail!("{} project(s) failed to render: {}", failed.len(), failed.join(", "));
    }

    log_build_result(output, &failed)?;

    Ok(BuildReport {
        pages: summaries.len() + 2,
        assets: asset_files.len(),
        failed,
    })
}

/// Output file of a project's detail page.
pub fn project_output(output: &Path, summary: &ProjectSummary) -> PathBuf {
    output.join(PROJECTS_DIR).join(&summary.id).join("index.html")
}

/// Create the output directory, clearing it first when `clean` is set.
fn prepare_output(output: &Path, clean: bool) -> Result<()> {
    if clean && output.exists() {
        fs::remove_dir_all(output).with_context(|| {
            format!("Failed to clear output directory: {}", output.display())
        })?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))
}

fn write_page(path: &Path, html: &str, minifier: &Minifier) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, minifier.html(html).as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Collect all files from a directory recursively
pub fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(|e| e.into_path())
        .collect()
}

/// Copy one asset to `<output>/<assets dir name>/<relative path>`.
fn copy_asset(path: &Path, config: &SiteConfig, clean: bool) -> Result<()> {
    let assets = &config.build.assets;
    let relative = path.strip_prefix(assets)?;
    let mount = assets.file_name().unwrap_or(OsStr::new("assets"));
    let dest = config.build.output.join(mount).join(relative);

    if !clean && is_up_to_date(path, &dest) {
        return Ok(());
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(path, &dest)?;
    Ok(())
}

/// Whether `dst` exists and is not older than `src`.
fn is_up_to_date(src: &Path, dst: &Path) -> bool {
    let modified = |p: &Path| p.metadata().and_then(|m| m.modified()).ok();
    match (modified(src), modified(dst)) {
        (Some(src), Some(dst)) => src <= dst,
        _ => false,
    }
}

/// Log build result based on output directory contents
fn log_build_result(output: &Path, failed: &[String]) -> Result<()> {
    let file_count = fs::read_dir(output)?.filter_map(Result::ok).count();

    if file_count == 0 {
        log!("warn"; "output is empty");
    } else if failed.is_empty() {
        log!("build"; "done");
    } else {
        log!("warn"; "done, {} project(s) rendered as error pages: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}
