// src/content/file.rs
//! JSON export of the CMS on disk: `{ "articles": [...], "products": [...], "categories": [...] }`.
//! The file is re-read on every fetch so edits show up on the next load.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use serde::Deserialize;

use super::{scope, Collection, ContentQuery, ContentSource};
use crate::model::{Article, Category, Product, Record};

#[derive(Debug, Default, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    articles: Vec<Article>,
    #[serde(default)]
    products: Vec<Product>,
    #[serde(default)]
    categories: Vec<Category>,
}

pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<CatalogDocument> {
        let t0 = std::time::Instant::now();
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading catalog from {}", self.path.display()))?;
        let doc = serde_json::from_str(&raw)
            .with_context(|| format!("parsing catalog JSON in {}", self.path.display()))?;
        histogram!("content_parse_ms", "source" => "file").record(t0.elapsed().as_secs_f64() * 1000.0);
        Ok(doc)
    }
}

#[async_trait]
impl ContentSource for JsonFileSource {
    async fn fetch(&self, query: &ContentQuery) -> Result<Vec<Record>> {
        let doc = self.read().await?;
        let term = query.term.as_deref();
        Ok(match query.collection {
            Collection::Articles => scope(&doc.articles, term)
                .into_iter()
                .map(Record::from)
                .collect(),
            Collection::Products => scope(&doc.products, term)
                .into_iter()
                .map(Record::from)
                .collect(),
        })
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        Ok(self.read().await?.categories)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
