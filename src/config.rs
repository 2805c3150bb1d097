//! Site configuration management.
//!
//! Handles loading, parsing, and validating the `folio.toml` configuration file.

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Default values for serde deserialization
pub mod config_defaults {
    pub fn r#true() -> bool {
        true
    }

    pub fn r#false() -> bool {
        false
    }

    pub mod base {
        pub fn title() -> String {
            "Portfolio".into()
        }
        pub fn url() -> Option<String> {
            None
        }
        pub fn author() -> String {
            "<YOUR_NAME>".into()
        }
        pub fn language() -> String {
            "en".into()
        }
        pub fn copyright() -> String {
            "© {year}".into()
        }
    }

    pub mod build {
        use std::path::PathBuf;

        pub fn root() -> Option<PathBuf> {
            None
        }
        pub fn data() -> PathBuf {
            "data".into()
        }
        pub fn summaries() -> PathBuf {
            "projects.yaml".into()
        }
        pub fn projects() -> PathBuf {
            "projects".into()
        }
        pub fn assets() -> PathBuf {
            "assets".into()
        }
        pub fn output() -> PathBuf {
            "public".into()
        }
        pub fn detail_route() -> String {
            "project.html".into()
        }

        pub mod sitemap {
            use std::path::PathBuf;

            pub fn path() -> PathBuf {
                "sitemap.xml".into()
            }
        }

        pub mod slug {
            use crate::config::SlugMode;

            pub fn on() -> SlugMode {
                SlugMode::On
            }
        }
    }

    pub mod serve {
        pub fn interface() -> String {
            "127.0.0.1".into()
        }
        pub fn port() -> u16 {
            5277
        }
    }
}

/// Heading anchor slug mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugMode {
    /// Always slugify (default)
    #[default]
    On,
    /// Only strip characters that are unsafe in a fragment
    Safe,
    /// No slugification
    No,
}

/// `[base]` section in folio.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title, shown on the card index and as a title suffix
    #[serde(default = "config_defaults::base::title")]
    #[educe(Default = config_defaults::base::title())]
    pub title: String,

    /// Author name, e.g.: "Bob"
    #[serde(default = "config_defaults::base::author")]
    #[educe(Default = config_defaults::base::author())]
    pub author: String,

    /// Site description
    #[serde(default)]
    pub description: String,

    /// Base URL for sitemap generation, e.g.: "https://example.com"
    #[serde(default = "config_defaults::base::url")]
    #[educe(Default = config_defaults::base::url())]
    pub url: Option<String>,

    /// Language code, e.g.: "en", "de"
    #[serde(default = "config_defaults::base::language")]
    #[educe(Default = config_defaults::base::language())]
    pub language: String,

    /// Copyright notice, `{year}` is replaced with the current year
    #[serde(default = "config_defaults::base::copyright")]
    #[educe(Default = config_defaults::base::copyright())]
    pub copyright: String,

    /// Stylesheet URLs linked from every page
    #[serde(default)]
    pub stylesheets: Vec<String>,

    /// Script URLs loaded (deferred) on every page, e.g. a syntax highlighter
    #[serde(default)]
    pub scripts: Vec<String>,
}

/// `[build]` section in folio.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Root directory path
    #[serde(default = "config_defaults::build::root")]
    #[educe(Default = config_defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Data directory (relative to root)
    #[serde(default = "config_defaults::build::data")]
    #[educe(Default = config_defaults::build::data())]
    pub data: PathBuf,

    /// Summaries file (relative to data)
    #[serde(default = "config_defaults::build::summaries")]
    #[educe(Default = config_defaults::build::summaries())]
    pub summaries: PathBuf,

    /// Project markdown directory (relative to data)
    #[serde(default = "config_defaults::build::projects")]
    #[educe(Default = config_defaults::build::projects())]
    pub projects: PathBuf,

    /// Assets directory path (relative to root)
    #[serde(default = "config_defaults::build::assets")]
    #[educe(Default = config_defaults::build::assets())]
    pub assets: PathBuf,

    /// Output directory path (relative to root)
    #[serde(default = "config_defaults::build::output")]
    #[educe(Default = config_defaults::build::output())]
    pub output: PathBuf,

    /// Header partial inserted at the top of every page (relative to root)
    #[serde(default)]
    pub header: Option<PathBuf>,

    /// Footer partial inserted at the bottom of every page (relative to root)
    #[serde(default)]
    pub footer: Option<PathBuf>,

    /// Route answering `?id=<project>` on the dev server
    #[serde(default = "config_defaults::build::detail_route")]
    #[educe(Default = config_defaults::build::detail_route())]
    pub detail_route: String,

    /// Minify HTML output
    #[serde(default = "config_defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,

    /// Clear output directory before building
    #[serde(default = "config_defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,

    /// Fail the build when a project cannot be rendered
    #[serde(default = "config_defaults::r#false")]
    #[educe(Default = false)]
    pub strict: bool,

    /// Sitemap configuration
    #[serde(default)]
    pub sitemap: SitemapConfig,

    /// Heading anchor settings
    #[serde(default)]
    pub slug: SlugConfig,
}

/// `[build.sitemap]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SitemapConfig {
    /// Enable sitemap generation
    #[serde(default = "config_defaults::r#false")]
    #[educe(Default = config_defaults::r#false())]
    pub enable: bool,

    /// Output path for sitemap file
    #[serde(default = "config_defaults::build::sitemap::path")]
    #[educe(Default = config_defaults::build::sitemap::path())]
    pub path: PathBuf,
}

/// `[build.slug]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SlugConfig {
    /// Slugify section anchors
    #[serde(default = "config_defaults::build::slug::on")]
    #[educe(Default = config_defaults::build::slug::on())]
    pub fragment: SlugMode,
}

/// `[serve]` section in folio.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Network interface to bind (e.g.: "127.0.0.1", "0.0.0.0")
    #[serde(default = "config_defaults::serve::interface")]
    #[educe(Default = config_defaults::serve::interface())]
    pub interface: String,

    /// Port number to listen on
    #[serde(default = "config_defaults::serve::port")]
    #[educe(Default = config_defaults::serve::port())]
    pub port: u16,

    /// Enable file watching and rebuild
    #[serde(default = "config_defaults::r#true")]
    #[educe(Default = true)]
    pub watch: bool,
}

/// Root configuration structure representing folio.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Resolved path of the config file
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// User-defined extra fields
    #[serde(default)]
    pub extra: HashMap<String, toml::Value>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content)?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Resolved summaries file, i.e. `<data>/<summaries>`
    pub fn summaries_path(&self) -> PathBuf {
        self.build.data.join(&self.build.summaries)
    }

    /// Resolved markdown path for a project id, i.e. `<data>/<projects>/<id>.md`
    pub fn project_path(&self, id: &str) -> PathBuf {
        self.build.data.join(&self.build.projects).join(format!("{id}.md"))
    }

    /// Copyright line with `{year}` substituted
    pub fn copyright(&self) -> String {
        let year = chrono::Local::now().format("%Y").to_string();
        self.base.copyright.replace("{year}", &year)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli.root.clone().unwrap_or_else(|| self.get_root().to_owned());
        self.config_path = root.join(&cli.config);

        Self::update_option(&mut self.build.data, cli.data.as_ref());
        Self::update_option(&mut self.build.assets, cli.assets.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        if let Some(args) = cli.build_args() {
            self.build.clean |= args.clean;
            Self::update_option(&mut self.build.minify, args.minify.as_ref());
            Self::update_option(&mut self.build.sitemap.enable, args.sitemap.as_ref());
            if let Some(url) = &args.base_url {
                self.base.url = Some(url.clone());
            }
        }

        match &cli.command {
            Commands::Init { name: Some(name) } => {
                self.update_path_with_root(&root.join(name));
                self.config_path = root.join(name).join(&cli.config);
            }
            Commands::Serve {
                interface,
                port,
                watch,
                ..
            } => {
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.serve.watch, watch.as_ref());
                self.update_path_with_root(&root);
            }
            _ => self.update_path_with_root(&root),
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Update all paths relative to root directory
    pub fn update_path_with_root(&mut self, root: &Path) {
        self.set_root(root);

        self.build.data = root.join(&self.build.data);
        self.build.assets = root.join(&self.build.assets);
        self.build.output = root.join(&self.build.output);
        self.build.sitemap.path = self.build.output.join(&self.build.sitemap.path);
        self.build.header = self.build.header.take().map(|p| root.join(p));
        self.build.footer = self.build.footer.take().map(|p| root.join(p));
    }

    /// Validate configuration for the current command
    pub fn validate(&self) -> Result<()> {
        if !self.config_path.exists() {
            bail!("Config file not found");
        }

        if let Some(base_url) = &self.base.url
            && !base_url.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into()
            ));
        }

        if self.build.sitemap.enable && self.base.url.is_none() {
            bail!("[base.url] is required for sitemap generation");
        }

        if !self.build.data.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[build.data] directory not found: {}",
                self.build.data.display()
            )));
        }

        let route = &self.build.detail_route;
        if route.is_empty() || route.contains('?') {
            bail!(ConfigError::Validation(
                "[build.detail_route] must be a plain path without a query".into()
            ));
        }

        for (field, partial) in [
            ("[build.header]", &self.build.header),
            ("[build.footer]", &self.build.footer),
        ] {
            if let Some(path) = partial
                && !path.is_file()
            {
                bail!(ConfigError::Validation(format!("{field} not found")));
            }
        }

        Ok(())
    }
}

#[test]
fn validate_base_config() {
    let config = r#"
        [base]
        title = "Jane Doe"
        description = "Games and tools"
        url = "https://jane.dev"
        language = "en_GB"
        copyright = "{year} Jane Doe"
        stylesheets = ["/assets/styles/main.css"]
    "#;
    let config: SiteConfig = toml::from_str(config).unwrap();

    assert_eq!(config.base.title, "Jane Doe");
    assert_eq!(config.base.description, "Games and tools");
    assert_eq!(config.base.url, Some("https://jane.dev".to_string()));
    assert_eq!(config.base.language, "en_GB");
    assert_eq!(config.base.copyright, "{year} Jane Doe");
    assert_eq!(config.base.stylesheets, vec!["/assets/styles/main.css".to_string()]);
}

#[test]
fn test_base_config_defaults() {
    let config: SiteConfig = toml::from_str("[base]\n").unwrap();

    assert_eq!(config.base.title, "Portfolio");
    assert_eq!(config.base.author, "<YOUR_NAME>");
    assert_eq!(config.base.language, "en");
    assert_eq!(config.base.url, None);
    assert!(config.base.scripts.is_empty());
}

#[test]
fn test_build_config_defaults() {
    let config: SiteConfig = toml::from_str("").unwrap();

    assert_eq!(config.build.data, PathBuf::from("data"));
    assert_eq!(config.build.summaries, PathBuf::from("projects.yaml"));
    assert_eq!(config.build.projects, PathBuf::from("projects"));
    assert_eq!(config.build.assets, PathBuf::from("assets"));
    assert_eq!(config.build.output, PathBuf::from("public"));
    assert_eq!(config.build.detail_route, "project.html");
    assert!(config.build.minify);
    assert!(!config.build.clean);
    assert!(!config.build.strict);
    assert!(!config.build.sitemap.enable);
    assert_eq!(config.build.slug.fragment, SlugMode::On);
}

#[test]
fn test_build_slug_config() {
    let config = r#"
        [build.slug]
        fragment = "safe"
    "#;
    let config: SiteConfig = toml::from_str(config).unwrap();
    assert_eq!(config.build.slug.fragment, SlugMode::Safe);
}

#[test]
fn test_serve_config() {
    let config = r#"
        [serve]
        interface = "0.0.0.0"
        port = 8080
        watch = false
    "#;
    let config: SiteConfig = toml::from_str(config).unwrap();

    assert_eq!(config.serve.interface, "0.0.0.0");
    assert_eq!(config.serve.port, 8080);
    assert!(!config.serve.watch);
}

#[test]
fn test_serve_config_defaults() {
    let config: SiteConfig = toml::from_str("").unwrap();

    assert_eq!(config.serve.interface, "127.0.0.1");
    assert_eq!(config.serve.port, 5277);
    assert!(config.serve.watch);
}

#[test]
fn test_extra_fields() {
    let config = r#"
        [extra]
        custom_field = "custom_value"
        number_field = 42
    "#;
    let config: SiteConfig = toml::from_str(config).unwrap();

    assert_eq!(
        config.extra.get("custom_field").and_then(|v| v.as_str()),
        Some("custom_value")
    );
    assert_eq!(
        config.extra.get("number_field").and_then(|v| v.as_integer()),
        Some(42)
    );
}

#[test]
fn test_unknown_field_rejection_in_base() {
    let config = r#"
        [base]
        title = "Test"
        unknown_field = "should_fail"
    "#;
    let result: Result<SiteConfig, _> = toml::from_str(config);

    assert!(result.is_err());
    let err = result.unwrap_err().to_string();
    assert!(err.contains("unknown field"));
}

#[test]
fn test_unknown_field_rejection_in_build() {
    let result: Result<SiteConfig, _> = toml::from_str("[build]\nunknown_field = 1\n");
    assert!(result.is_err());
}

#[test]
fn test_from_str_invalid_toml() {
    let result = SiteConfig::from_str("[base\ntitle = \"x\"");
    assert!(result.is_err());
}

#[test]
fn test_update_path_with_root() {
    let mut config = SiteConfig::default();
    config.build.header = Some(PathBuf::from("partials/header.html"));
    config.update_path_with_root(Path::new("/site"));

    assert_eq!(config.get_root(), Path::new("/site"));
    assert_eq!(config.build.data, PathBuf::from("/site/data"));
    assert_eq!(config.build.output, PathBuf::from("/site/public"));
    assert_eq!(config.build.sitemap.path, PathBuf::from("/site/public/sitemap.xml"));
    assert_eq!(
        config.build.header,
        Some(PathBuf::from("/site/partials/header.html"))
    );
    assert_eq!(
        config.summaries_path(),
        PathBuf::from("/site/data/projects.yaml")
    );
    assert_eq!(
        config.project_path("inventory"),
        PathBuf::from("/site/data/projects/inventory.md")
    );
}

#[test]
fn test_copyright_substitutes_year() {
    let mut config = SiteConfig::default();
    config.base.copyright = "© {year} Jane".into();
    let line = config.copyright();
    assert!(!line.contains("{year}"));
    assert!(line.ends_with(" Jane"));
}

#[test]
fn test_config_error_display() {
    let io_err = ConfigError::Io(
        PathBuf::from("folio.toml"),
        std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
    );
    let display = format!("{}", io_err);
    assert!(display.contains("IO error"));
    assert!(display.contains("folio.toml"));

    let validation_err = ConfigError::Validation("Test validation error".to_string());
    assert!(validation_err.to_string().contains("Test validation error"));
}
