// src/content/sanity.rs
//! Sanity query-API adapter. Issues GROQ queries over HTTP GET and unwraps the
//! `{ "result": ... }` envelope. Search terms travel as a `$term` parameter,
//! never spliced into the query text.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{Collection, ContentQuery, ContentSource};
use crate::model::{Article, Category, Product, Record};

const ARTICLE_FIELDS: &str = "_id, title, slug, excerpt, category->{_id, title}, publishedAt, readTime, featured";
const PRODUCT_FIELDS: &str = "_id, name, slug, description, brand, category->{_id, title}, price, originalPrice, rating, reviews, featured, affiliateUrl";

#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: Option<T>,
}

/// GROQ text for a collection query; scoped queries reference `$term`.
pub fn groq_for(query: &ContentQuery) -> String {
    match (query.collection, query.term.is_some()) {
        (Collection::Articles, false) => {
            format!(r#"*[_type == "article"] | order(publishedAt desc) {{{ARTICLE_FIELDS}}}"#)
        }
        (Collection::Articles, true) => format!(
            r#"*[_type == "article" && (title match $term || excerpt match $term)] | order(publishedAt desc) {{{ARTICLE_FIELDS}}}"#
        ),
        (Collection::Products, false) => format!(r#"*[_type == "product"] {{{PRODUCT_FIELDS}}}"#),
        (Collection::Products, true) => format!(
            r#"*[_type == "product" && (name match $term || description match $term || brand match $term)] {{{PRODUCT_FIELDS}}}"#
        ),
    }
}

const CATEGORIES_GROQ: &str = r#"*[_type == "category"] | order(title asc) {_id, title, slug}"#;

pub struct SanitySource {
    endpoint: Url,
    client: reqwest::Client,
}

impl SanitySource {
    /// `endpoint` is the dataset query URL, e.g.
    /// `https://<project>.api.sanity.io/v2023-05-03/data/query/production`.
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("invalid Sanity endpoint `{endpoint}`"))?;
        Ok(Self {
            endpoint,
            client: reqwest::Client::new(),
        })
    }

    /// Full request URL for a GROQ query and optional prefix term.
    pub fn query_url(&self, groq: &str, term: Option<&str>) -> Result<Url> {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", groq);
            if let Some(t) = term {
                // GROQ `match` treats a trailing `*` as a prefix wildcard.
                let value = serde_json::to_string(&format!("{t}*"))?;
                pairs.append_pair("$term", &value);
            }
        }
        Ok(url)
    }

    async fn run<T: DeserializeOwned + Default>(&self, url: Url) -> Result<T> {
        let t0 = std::time::Instant::now();
        debug!(target: "catalog", %url, "sanity query");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("sending Sanity query")?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("Sanity query failed with HTTP {status}"));
        }
        let body = resp.text().await.context("reading Sanity response")?;
        let out = parse_result(&body)?;
        histogram!("content_parse_ms", "source" => "sanity").record(t0.elapsed().as_secs_f64() * 1000.0);
        Ok(out)
    }
}

/// Unwrap the `result` envelope; a `null` result reads as an empty/default value.
pub fn parse_result<T: DeserializeOwned + Default>(body: &str) -> Result<T> {
    let env: QueryResponse<T> = serde_json::from_str(body).context("parsing Sanity response")?;
    Ok(env.result.unwrap_or_default())
}

#[async_trait]
impl ContentSource for SanitySource {
    async fn fetch(&self, query: &ContentQuery) -> Result<Vec<Record>> {
        debug!(
            target: "catalog",
            collection = query.collection.as_str(),
            scoped = query.term.is_some(),
            "sanity fetch"
        );
        let url = self.query_url(&groq_for(query), query.term.as_deref())?;
        Ok(match query.collection {
            Collection::Articles => self
                .run::<Vec<Article>>(url)
                .await?
                .into_iter()
                .map(Record::from)
                .collect(),
            Collection::Products => self
                .run::<Vec<Product>>(url)
                .await?
                .into_iter()
                .map(Record::from)
                .collect(),
        })
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        let url = self.query_url(CATEGORIES_GROQ, None)?;
        self.run(url).await
    }

    fn name(&self) -> &'static str {
        "sanity"
    }
}
