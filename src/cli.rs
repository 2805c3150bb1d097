//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Folio portfolio generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Site root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Output directory path (relative to site root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Data directory path holding summaries and project markdown (relative to site root)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Assets directory path (relative to site root)
    #[arg(short, long)]
    pub assets: Option<PathBuf>,

    /// Config file name (default: folio.toml)
    #[arg(short = 'C', long, default_value = "folio.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Shared build arguments for Build and Serve commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Clean output directory completely before building
    #[arg(long)]
    pub clean: bool,

    /// Minify the html content
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,

    /// enable sitemap generation
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub sitemap: Option<bool>,

    /// Override base URL for the site.
    ///
    /// Useful when the production URL differs from local development,
    /// without editing folio.toml.
    #[arg(long = "base-url")]
    pub base_url: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Init a template site
    Init {
        /// the name(path) of site directory, related to `root`
        name: Option<PathBuf>,
    },

    /// Render every project page, the card index and copy assets
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Serve the site. Rebuild on change automatically
    Serve {
        #[command(flatten)]
        build_args: BuildArgs,

        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port you should provide
        #[arg(short, long)]
        port: Option<u16>,

        /// enable watch
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,
    },

    /// Parse one project's markdown and print it as JSON
    Inspect {
        /// Project id, i.e. the markdown file stem under the projects directory
        id: String,
    },
}

impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init { .. })
    }

    /// Build arguments of `build` and `serve`, if any.
    pub const fn build_args(&self) -> Option<&BuildArgs> {
        match &self.command {
            Commands::Build { build_args } | Commands::Serve { build_args, .. } => Some(build_args),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_flags() {
        let cli = Cli::parse_from(["folio", "build", "--clean", "--minify=false", "--sitemap"]);
        let args = cli.build_args().unwrap();
        assert!(args.clean);
        assert_eq!(args.minify, Some(false));
        assert_eq!(args.sitemap, Some(true));
        assert_eq!(cli.config, PathBuf::from("folio.toml"));
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["folio", "--root", "site", "serve", "-p", "8080", "-w", "false"]);
        assert_eq!(cli.root, Some(PathBuf::from("site")));
        match cli.command {
            Commands::Serve { port, watch, .. } => {
                assert_eq!(port, Some(8080));
                assert_eq!(watch, Some(false));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_inspect() {
        let cli = Cli::parse_from(["folio", "inspect", "inventory"]);
        assert!(!cli.is_init());
        assert!(cli.build_args().is_none());
        assert!(matches!(cli.command, Commands::Inspect { ref id } if id == "inventory"));
    }
}
