//! Site configuration management.
//!
//! Handles loading, parsing, and validating the `quire.toml` configuration file.

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
        pub fn url() -> Option<String> {
            None
        }
        pub fn author() -> String {
            "<YOUR_NAME>".into()
        }
        pub fn email() -> String {
            "user@noreply.quire".into()
        }
        pub fn language() -> String {
            "en".into()
        }
    }

    pub mod build {
        use std::path::PathBuf;

        pub fn root() -> Option<PathBuf> {
            None
        }
        pub fn content() -> PathBuf {
            "posts".into()
        }
        pub fn output() -> PathBuf {
            "public".into()
        }
        pub fn templates() -> PathBuf {
            "templates".into()
        }
        pub fn assets() -> PathBuf {
            "assets".into()
        }
        pub fn default_layout() -> String {
            "post".into()
        }

        pub mod rss {
            use std::path::PathBuf;

            pub fn path() -> PathBuf {
                "feed.xml".into()
            }
        }

        pub mod sitemap {
            use std::path::PathBuf;

            pub fn path() -> PathBuf {
                "sitemap.xml".into()
            }
        }
    }

    pub mod serve {
        pub fn interface() -> String {
            "127.0.0.1".into()
        }
        pub fn port() -> u16 {
            4141
        }
    }
}

/// URL slug generation mode
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugMode {
    /// Always slugify
    On,
    /// Only sanitize forbidden/whitespace characters (default)
    #[default]
    Safe,
    /// No slugification
    No,
}

/// `[base]` section in quire.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title
    #[serde(default)]
    pub title: String,

    /// Author name, e.g.: "Bob"
    #[serde(default = "config_defaults::base::author")]
    #[educe(Default = config_defaults::base::author())]
    pub author: String,

    /// Author email, e.g.: "bob@example.com"
    #[serde(default = "config_defaults::base::email")]
    #[educe(Default = config_defaults::base::email())]
    pub email: String,

    /// Site description
    #[serde(default)]
    pub description: String,

    /// Base URL for RSS/sitemap generation, e.g.: "https://example.com"
    #[serde(default = "config_defaults::base::url")]
    #[educe(Default = config_defaults::base::url())]
    pub url: Option<String>,

    /// Language code, e.g.: "en", "zh-Hans"
    #[serde(default = "config_defaults::base::language")]
    #[educe(Default = config_defaults::base::language())]
    pub language: String,

    /// Copyright notice
    #[serde(default)]
    pub copyright: String,
}

/// `[build]` section in quire.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Root directory path
    #[serde(default = "config_defaults::build::root")]
    #[educe(Default = config_defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Content directory path (relative to root)
    #[serde(default = "config_defaults::build::content")]
    #[educe(Default = config_defaults::build::content())]
    pub content: PathBuf,

    /// Output directory path (relative to root)
    #[serde(default = "config_defaults::build::output")]
    #[educe(Default = config_defaults::build::output())]
    pub output: PathBuf,

    /// Layout templates directory path (relative to root)
    #[serde(default = "config_defaults::build::templates")]
    #[educe(Default = config_defaults::build::templates())]
    pub templates: PathBuf,

    /// Static assets directory path (relative to root)
    #[serde(default = "config_defaults::build::assets")]
    #[educe(Default = config_defaults::build::assets())]
    pub assets: PathBuf,

    /// Layout used when a document names none
    #[serde(default = "config_defaults::build::default_layout")]
    #[educe(Default = config_defaults::build::default_layout())]
    pub default_layout: String,

    /// Minify HTML output
    #[serde(default = "config_defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,

    /// Clean output directory before building
    #[serde(default = "config_defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,

    /// Include documents marked `draft: true`
    #[serde(default = "config_defaults::r#false")]
    #[educe(Default = false)]
    pub drafts: bool,

    /// Slugification mode for output paths and tag URLs
    #[serde(default)]
    pub slug: SlugMode,

    /// RSS feed configuration
    #[serde(default)]
    pub rss: RssConfig,

    /// Sitemap configuration
    #[serde(default)]
    pub sitemap: SitemapConfig,
}

/// `[build.rss]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RssConfig {
    /// Enable RSS feed generation
    #[serde(default = "config_defaults::r#false")]
    #[educe(Default = config_defaults::r#false())]
    pub enable: bool,

    /// Output path for the feed, relative to the output directory
    #[serde(default = "config_defaults::build::rss::path")]
    #[educe(Default = config_defaults::build::rss::path())]
    pub path: PathBuf,
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

    /// Output path for the sitemap, relative to the output directory
    #[serde(default = "config_defaults::build::sitemap::path")]
    #[educe(Default = config_defaults::build::sitemap::path())]
    pub path: PathBuf,
}

/// `[serve]` section in quire.toml
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

    /// Enable file watching for auto-rebuild
    #[serde(default = "config_defaults::r#true")]
    #[educe(Default = true)]
    pub watch: bool,
}

/// Root configuration structure representing quire.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// CLI arguments reference
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// User-defined extra fields, exposed to layouts as `{extra_<key>}`
    #[serde(default)]
    pub extra: HashMap<String, toml::Value>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Get CLI arguments reference
    pub fn get_cli(&self) -> &'static Cli {
        self.cli.expect("cli is set in update_with_cli before any use")
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &'static Cli) {
        self.cli = Some(cli);

        let root = cli
            .root
            .as_ref()
            .cloned()
            .unwrap_or_else(|| self.get_root().to_owned());
        self.update_path_with_root(&root);

        let args = cli.build_args();
        Self::update_option(&mut self.build.minify, args.minify.as_ref());
        Self::update_option(&mut self.build.rss.enable, args.rss.as_ref());
        Self::update_option(&mut self.build.sitemap.enable, args.sitemap.as_ref());
        if args.clean {
            self.build.clean = true;
        }
        if args.drafts {
            self.build.drafts = true;
        }
        if let Some(url) = &args.base_url {
            self.base.url = Some(url.clone());
        }

        if let Commands::Serve { interface, port, watch, .. } = &cli.command {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            Self::update_option(&mut self.serve.watch, watch.as_ref());
            self.base.url = Some(format!("http://{}:{}", self.serve.interface, self.serve.port));
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Update all paths relative to root directory
    fn update_path_with_root(&mut self, root: &Path) {
        let cli = self.get_cli();

        self.set_root(root);
        Self::update_option(&mut self.build.content, cli.content.as_ref());
        Self::update_option(&mut self.build.templates, cli.templates.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        self.build.content = root.join(&self.build.content);
        self.build.templates = root.join(&self.build.templates);
        self.build.assets = root.join(&self.build.assets);
        self.build.output = root.join(&self.build.output);
    }

    /// Validate configuration for the current command
    pub fn validate(&self) -> Result<()> {
        if !self.build.content.exists() {
            bail!(ConfigError::Validation(format!(
                "content directory not found: {}",
                self.build.content.display()
            )));
        }

        if let Some(base_url) = &self.base.url
            && !base_url.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into()
            ));
        }

        if self.build.rss.enable && self.base.url.is_none() {
            bail!("[base.url] is required for RSS generation");
        }
        if self.build.sitemap.enable && self.base.url.is_none() {
            bail!("[base.url] is required for sitemap generation");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_base_section() {
        let config = r#"
            [base]
            title = "Scratch Notes"
            description = "niche language behaviors"
            url = "https://example.com"
            language = "en"
            copyright = "2026"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.base.title, "Scratch Notes");
        assert_eq!(config.base.description, "niche language behaviors");
        assert_eq!(config.base.url, Some("https://example.com".to_string()));
        assert_eq!(config.base.language, "en");
        assert_eq!(config.base.copyright, "2026");
    }

    #[test]
    fn base_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.base.author, "<YOUR_NAME>");
        assert_eq!(config.base.email, "user@noreply.quire");
        assert_eq!(config.base.language, "en");
        assert_eq!(config.base.url, None);
        assert_eq!(config.base.copyright, "");
    }

    #[test]
    fn build_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.build.content, PathBuf::from("posts"));
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert_eq!(config.build.templates, PathBuf::from("templates"));
        assert_eq!(config.build.assets, PathBuf::from("assets"));
        assert_eq!(config.build.default_layout, "post");
        assert!(config.build.minify);
        assert!(!config.build.clean);
        assert!(!config.build.drafts);
        assert!(matches!(config.build.slug, SlugMode::Safe));
    }

    #[test]
    fn rss_section() {
        let config = r#"
            [build.rss]
            enable = true
            path = "custom-feed.xml"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert!(config.build.rss.enable);
        assert_eq!(config.build.rss.path, PathBuf::from("custom-feed.xml"));
    }

    #[test]
    fn sitemap_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();
        assert!(!config.build.sitemap.enable);
        assert_eq!(config.build.sitemap.path, PathBuf::from("sitemap.xml"));
    }

    #[test]
    fn slug_mode_parsing() {
        for (s, expected) in [("on", "On"), ("safe", "Safe"), ("no", "No")] {
            let config = format!("[build]\nslug = \"{s}\"");
            let config: SiteConfig = toml::from_str(&config).unwrap();
            assert_eq!(format!("{:?}", config.build.slug), expected);
        }
    }

    #[test]
    fn serve_section() {
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
    fn serve_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.serve.interface, "127.0.0.1");
        assert_eq!(config.serve.port, 4141);
        assert!(config.serve.watch);
    }

    #[test]
    fn extra_fields_preserved() {
        let config = r#"
            [extra]
            github = "https://github.com/someone"
            show_comments = true
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(
            config.extra.get("github").and_then(|v| v.as_str()),
            Some("https://github.com/someone")
        );
        assert_eq!(
            config.extra.get("show_comments").and_then(|v| v.as_bool()),
            Some(true)
        );
    }

    #[test]
    fn unknown_field_rejected_in_base() {
        let config = r#"
            [base]
            unknown_field = "should_fail"
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("unknown field"));
    }

    #[test]
    fn unknown_field_rejected_in_build() {
        let result: Result<SiteConfig, _> = toml::from_str("[build]\nbogus = 1");
        assert!(result.is_err());
    }

    #[test]
    fn from_str_invalid_toml() {
        let invalid = r#"
            [base
            title = "My Blog"
        "#;
        assert!(SiteConfig::from_str(invalid).is_err());
    }

    #[test]
    fn get_root_default() {
        let config = SiteConfig::default();
        assert_eq!(config.get_root(), Path::new("./"));
    }

    #[test]
    fn set_root() {
        let mut config = SiteConfig::default();
        config.set_root(Path::new("/custom/path"));
        assert_eq!(config.get_root(), Path::new("/custom/path"));
    }

    #[test]
    fn validate_rejects_non_http_url() {
        let mut config = SiteConfig::default();
        config.build.content = PathBuf::from("./");
        config.base.url = Some("example.com".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rss_requires_url() {
        let mut config = SiteConfig::default();
        config.build.content = PathBuf::from("./");
        config.build.rss.enable = true;
        assert!(config.validate().is_err());

        config.base.url = Some("https://example.com".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_missing_content_dir() {
        let mut config = SiteConfig::default();
        config.build.content = PathBuf::from("/nonexistent/posts");
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("quire.toml"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        );
        assert!(format!("{io_err}").contains("quire.toml"));

        let validation_err = ConfigError::Validation("bad value".to_string());
        assert!(format!("{validation_err}").contains("bad value"));
    }
}
