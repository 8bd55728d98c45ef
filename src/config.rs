// src/config.rs
//! Service configuration: `config/catalog.toml` plus `CATALOG_*` env overrides.
//!
//! Resolution order for the file: `$CATALOG_CONFIG_PATH`, then
//! `config/catalog.toml`. A missing default file means built-in defaults; a
//! missing explicit path is an error.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::catalog::DEFAULT_PAGE_SIZE;
use crate::content::file::JsonFileSource;
use crate::content::sanity::SanitySource;
use crate::content::ContentSource;

pub const DEFAULT_CATALOG_CONFIG_PATH: &str = "config/catalog.toml";
pub const DEFAULT_CONTENT_PATH: &str = "content/catalog.json";

pub const ENV_CATALOG_CONFIG_PATH: &str = "CATALOG_CONFIG_PATH";
pub const ENV_PAGE_SIZE: &str = "CATALOG_PAGE_SIZE";
pub const ENV_CONTENT_SOURCE: &str = "CATALOG_CONTENT_SOURCE";
pub const ENV_CONTENT_PATH: &str = "CATALOG_CONTENT_PATH";
pub const ENV_SANITY_URL: &str = "CATALOG_SANITY_URL";

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
fn default_featured_articles() -> usize {
    2
}
fn default_related_limit() -> usize {
    3
}
fn default_content_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONTENT_PATH)
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub catalog: ListingSection,
    #[serde(default)]
    pub content: ContentSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingSection {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_featured_articles")]
    pub featured_articles: usize,
    #[serde(default = "default_related_limit")]
    pub related_limit: usize,
}

impl Default for ListingSection {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            featured_articles: default_featured_articles(),
            related_limit: default_related_limit(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    File,
    Sanity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentSection {
    #[serde(default)]
    pub source: SourceKind,
    #[serde(default = "default_content_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub sanity_url: Option<String>,
}

impl Default for ContentSection {
    fn default() -> Self {
        Self {
            source: SourceKind::File,
            path: default_content_path(),
            sanity_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_true")]
    pub metrics: bool,
    #[serde(default)]
    pub admin_routes: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            metrics: true,
            admin_routes: false,
        }
    }
}

impl CatalogConfig {
    /// Resolve the config file, apply env overrides, sanitize.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CATALOG_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(anyhow!(
                        "{ENV_CATALOG_CONFIG_PATH} points to non-existent path {}",
                        pb.display()
                    ));
                }
                Self::from_path(&pb)?
            }
            Err(_) => {
                let pb = PathBuf::from(DEFAULT_CATALOG_CONFIG_PATH);
                if pb.exists() {
                    Self::from_path(&pb)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env_overrides();
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading catalog config at {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing catalog config at {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: CatalogConfig = toml::from_str(s)?;
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(n) = parse_page_size_env(std::env::var(ENV_PAGE_SIZE).ok()) {
            self.catalog.page_size = n;
        }
        if let Ok(kind) = std::env::var(ENV_CONTENT_SOURCE) {
            match kind.trim().to_ascii_lowercase().as_str() {
                "file" => self.content.source = SourceKind::File,
                "sanity" => self.content.source = SourceKind::Sanity,
                _ => {}
            }
        }
        if let Ok(p) = std::env::var(ENV_CONTENT_PATH) {
            if !p.trim().is_empty() {
                self.content.path = PathBuf::from(p);
            }
        }
        if let Ok(u) = std::env::var(ENV_SANITY_URL) {
            if !u.trim().is_empty() {
                self.content.sanity_url = Some(u);
            }
        }
    }

    fn sanitize(&mut self) {
        if self.catalog.page_size == 0 {
            self.catalog.page_size = DEFAULT_PAGE_SIZE;
        }
    }

    /// Build the configured content source.
    pub fn content_source(&self) -> Result<Arc<dyn ContentSource>> {
        match self.content.source {
            SourceKind::File => Ok(Arc::new(JsonFileSource::new(self.content.path.clone()))),
            SourceKind::Sanity => {
                let url = self
                    .content
                    .sanity_url
                    .as_deref()
                    .ok_or_else(|| anyhow!("content.source = \"sanity\" requires sanity_url"))?;
                Ok(Arc::new(SanitySource::new(url)?))
            }
        }
    }
}

// positive integer or nothing
fn parse_page_size_env(raw: Option<String>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = CatalogConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.catalog.page_size, 6);
        assert_eq!(cfg.catalog.featured_articles, 2);
        assert_eq!(cfg.catalog.related_limit, 3);
        assert_eq!(cfg.content.source, SourceKind::File);
        assert!(cfg.server.metrics);
        assert!(!cfg.server.admin_routes);
    }

    #[test]
    fn zero_page_size_is_hardened() {
        let cfg = CatalogConfig::from_toml_str("[catalog]\npage_size = 0\n").unwrap();
        assert_eq!(cfg.catalog.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn page_size_env_parsing() {
        assert_eq!(parse_page_size_env(Some(" 12 ".into())), Some(12));
        assert_eq!(parse_page_size_env(Some("0".into())), None);
        assert_eq!(parse_page_size_env(Some("-3".into())), None);
        assert_eq!(parse_page_size_env(None), None);
    }

    #[test]
    fn sanity_without_url_fails_to_build_source() {
        let cfg = CatalogConfig::from_toml_str("[content]\nsource = \"sanity\"\n").unwrap();
        assert!(cfg.content_source().is_err());
    }

    #[test]
    fn wrong_value_types_are_errors() {
        assert!(CatalogConfig::from_toml_str("[catalog]\npage_size = \"six\"\n").is_err());
    }
}
