//! Folio - a static portfolio generator for markdown project pages.

mod build;
mod cli;
mod config;
mod init;
mod logger;
mod project;
mod render;
mod serve;
mod sitemap;
mod utils;
mod watch;

use anyhow::{Result, bail};
use build::build_site;
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use init::new_site;
use project::{ProjectError, parse_project};
use serve::serve_site;
use std::{fs, path::Path, sync::Arc};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Arc::new(load_config(&cli)?);

    match &cli.command {
        Commands::Init { .. } => new_site(&config),
        Commands::Build { .. } => build_site(&config).map(|_| ()),
        Commands::Serve { .. } => {
            build_site(&config)?;
            serve_site(config)
        }
        Commands::Inspect { id } => inspect(&config, id),
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if config_path.exists() {
        SiteConfig::from_path(&config_path)?
    } else {
        SiteConfig::default()
    };
    config.update_with_cli(cli);

    let config_exists = config.config_path.exists();
    match (cli.is_init(), config_exists) {
        (true, true) => {
            bail!("Config file already exists. Remove it manually or init in a different path.")
        }
        (false, false) => bail!("Config file not found."),
        _ => {}
    }

    if !cli.is_init() {
        config.validate()?;
    }

    Ok(config)
}

/// Parse one project and print it as pretty JSON.
fn inspect(config: &SiteConfig, id: &str) -> Result<()> {
    let path = config.project_path(id);
    let text = fs::read_to_string(&path).map_err(|source| ProjectError::Fetch { path, source })?;
    let detail = parse_project(id, &text)?;
    println!("{}", serde_json::to_string_pretty(&detail)?);
    Ok(())
}
