// src/content/mod.rs
//! Content Source: where the listings get their records from.
//!
//! A source answers one query shape (collection + optional search term) and
//! lists categories. The service fetches everything once into a
//! [`CatalogSnapshot`] and serves listings from it; only the search endpoint
//! goes back to the source per request.

pub mod file;
pub mod sanity;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::{self, Listable};
use crate::model::{Article, Category, Product, Record};
use crate::query::{ArticleSort, ALL_CATEGORIES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Articles,
    Products,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Articles => "articles",
            Collection::Products => "products",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentQuery {
    pub collection: Collection,
    /// Word-prefix search scope; `None` fetches the whole collection.
    pub term: Option<String>,
}

impl ContentQuery {
    pub fn all(collection: Collection) -> Self {
        Self {
            collection,
            term: None,
        }
    }

    /// Blank terms are treated as "no scope".
    pub fn search(collection: Collection, term: &str) -> Self {
        let t = term.trim();
        Self {
            collection,
            term: (!t.is_empty()).then(|| t.to_string()),
        }
    }
}

#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, query: &ContentQuery) -> Result<Vec<Record>>;
    async fn fetch_categories(&self) -> Result<Vec<Category>>;
    fn name(&self) -> &'static str;
}

static WORD_RE: Lazy<Regex> = Lazy::new(|| {
    // \w with Unicode enabled
    Regex::new(r"(?u)\w+").expect("word regex")
});

fn words(s: &str) -> Vec<String> {
    WORD_RE
        .find_iter(s)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Every word of `term` must start some word of `text`. A term without words matches.
pub fn prefix_match(text: &str, term: &str) -> bool {
    let wanted = words(term);
    if wanted.is_empty() {
        return true;
    }
    let have = words(text);
    wanted
        .iter()
        .all(|w| have.iter().any(|h| h.starts_with(w.as_str())))
}

/// Word-prefix match over a record's search fields (any field may satisfy any word).
pub fn matches_prefix<T: Listable>(record: &T, term: &str) -> bool {
    let joined = record.search_fields().join(" ");
    prefix_match(&joined, term)
}

/// Apply a [`ContentQuery`] term to an in-memory collection.
pub(crate) fn scope<T: Listable + Clone>(records: &[T], term: Option<&str>) -> Vec<T> {
    match term {
        Some(t) => records
            .iter()
            .filter(|r| matches_prefix(*r, t))
            .cloned()
            .collect(),
        None => records.to_vec(),
    }
}

/// Everything fetched for one load, held immutably.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub articles: Vec<Article>,
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub source: &'static str,
    pub loaded_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    pub fn new(articles: Vec<Article>, products: Vec<Product>, categories: Vec<Category>) -> Self {
        Self {
            articles,
            products,
            categories,
            source: "memory",
            loaded_at: Utc::now(),
        }
    }

    /// Fetch articles, products and categories concurrently.
    pub async fn load(source: &dyn ContentSource) -> Result<Self> {
        let articles_q = ContentQuery::all(Collection::Articles);
        let products_q = ContentQuery::all(Collection::Products);
        let res = tokio::try_join!(
            source.fetch(&articles_q),
            source.fetch(&products_q),
            source.fetch_categories(),
        );
        let (a, p, categories) = match res {
            Ok(v) => v,
            Err(e) => {
                counter!("content_fetch_errors_total", "source" => source.name()).increment(1);
                warn!(target: "catalog", source = source.name(), error = %e, "catalog load failed");
                return Err(e).with_context(|| format!("loading catalog from {}", source.name()));
            }
        };

        // Sources may hand back mixed batches; keep only what each query asked for.
        let (articles, _) = Record::partition(a);
        let (_, products) = Record::partition(p);

        gauge!("catalog_records", "kind" => "articles").set(articles.len() as f64);
        gauge!("catalog_records", "kind" => "products").set(products.len() as f64);
        info!(
            target: "catalog",
            source = source.name(),
            articles = articles.len(),
            products = products.len(),
            categories = categories.len(),
            "catalog loaded"
        );

        Ok(Self {
            articles,
            products,
            categories,
            source: source.name(),
            loaded_at: Utc::now(),
        })
    }

    /// `"All"` followed by every category title, in source order, without duplicates.
    pub fn category_options(&self) -> Vec<String> {
        let mut out = vec![ALL_CATEGORIES.to_string()];
        for c in &self.categories {
            if !out.contains(&c.title) {
                out.push(c.title.clone());
            }
        }
        out
    }

    pub fn featured_articles(&self, limit: usize) -> Vec<&Article> {
        self.articles.iter().filter(|a| a.featured).take(limit).collect()
    }

    pub fn featured_products(&self) -> Vec<&Product> {
        self.products.iter().filter(|p| p.featured).collect()
    }

    /// Other articles in the same category, newest first. `None` for an unknown id.
    pub fn related_articles(&self, id: &str, limit: usize) -> Option<Vec<&Article>> {
        let current = self.articles.iter().find(|a| a.id == id)?;
        let Some(cat) = current.category.as_ref() else {
            return Some(Vec::new());
        };
        let same: Vec<&Article> = self
            .articles
            .iter()
            .filter(|a| a.id != id)
            .filter(|a| a.category.as_ref().is_some_and(|c| c.same_category(cat)))
            .collect();
        let mut out = catalog::sort(same, ArticleSort::Newest);
        out.truncate(limit);
        Some(out)
    }

    /// Other products in the same category, in source order. `None` for an unknown id.
    pub fn related_products(&self, id: &str, limit: usize) -> Option<Vec<&Product>> {
        let current = self.products.iter().find(|p| p.id == id)?;
        let Some(cat) = current.category.as_ref() else {
            return Some(Vec::new());
        };
        Some(
            self.products
                .iter()
                .filter(|p| p.id != id)
                .filter(|p| p.category.as_ref().is_some_and(|c| c.same_category(cat)))
                .take(limit)
                .collect(),
        )
    }
}
