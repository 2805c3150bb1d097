//! Site initialization module.
//!
//! Creates a new portfolio with default configuration and one sample project.

use crate::config::SiteConfig;
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Default config filename
pub const CONFIG_FILE: &str = "folio.toml";

/// Default site directory structure
const SITE_DIRS: &[&str] = &[
    "data/projects",
    "assets/images",
    "assets/code",
    "assets/scripts",
    "assets/styles",
];

/// Sample files, relative to the site root
const SAMPLE_FILES: &[(&str, &str)] = &[
    ("data/projects.yaml", include_str!("embed/init/projects.yaml")),
    ("data/projects/sample.md", include_str!("embed/init/sample.md")),
    ("assets/code/Sample.cs", include_str!("embed/init/Sample.cs")),
    ("assets/styles/main.css", include_str!("embed/init/main.css")),
];

const STYLESHEET: &str = "/assets/styles/main.css";

/// Create a new site at the config root.
pub fn new_site(config: &SiteConfig) -> Result<()> {
    let root = config.get_root();

    if !is_dir_empty(root)? {
        bail!(
            "`{}` is not empty. Use `folio init <SITE_NAME>` to create in a new subdirectory.",
            root.display()
        );
    }

    init_site_structure(root)?;
    init_default_config(root)?;
    for (path, content) in SAMPLE_FILES {
        let path = root.join(path);
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    }
    init_ignored_files(root, &config.build.output)?;

    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Write default configuration file
fn init_default_config(root: &Path) -> Result<()> {
    let mut config = SiteConfig::default();
    config.base.stylesheets = vec![STYLESHEET.to_owned()];
    let content = toml::to_string_pretty(&config)?;
    fs::write(root.join(CONFIG_FILE), content)?;
    Ok(())
}

/// Create site directory structure
fn init_site_structure(root: &Path) -> Result<()> {
    for dir in SITE_DIRS {
        let path = root.join(dir);
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(())
}

/// Write a `.gitignore` excluding the output directory.
fn init_ignored_files(root: &Path, output: &Path) -> Result<()> {
    let output = output.strip_prefix(root).unwrap_or(output);
    let path = root.join(".gitignore");
    if !path.exists() {
        fs::write(&path, format!("/{}\n", output.display()))?;
    }
    Ok(())
}
