//! # Catalog records
//! Articles and products as delivered by the headless CMS, plus the category
//! dimension used for filtering.
//!
//! Field names follow the CMS documents (`_id`, camelCase). Everything that the
//! CMS may omit is either an `Option` or defaults to an empty/zero value, so a
//! sparse document never fails the whole batch.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Reference to a category embedded in an article or product.
/// Listing projections do not always carry the `_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
}

impl CategoryRef {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Two refs point at the same category when ids match, or (without ids) titles match.
    pub fn same_category(&self, other: &CategoryRef) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => self.title == other.title,
        }
    }
}

/// A category document. Flat, no hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<Slug>,
}

/// URL slug. The CMS sends either `"slug"` or `{ "current": "slug" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Slug(pub String);

impl Slug {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Slug {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Plain(String),
            Object { current: String },
        }
        Ok(match Raw::deserialize(d)? {
            Raw::Plain(s) => Slug(s),
            Raw::Object { current } => Slug(current),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<Slug>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_time: Option<String>,
}

impl Article {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            excerpt: String::new(),
            category: None,
            published_at: None,
            featured: false,
            slug: None,
            read_time: None,
        }
    }

    pub fn excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = excerpt.into();
        self
    }

    pub fn category(mut self, category: CategoryRef) -> Self {
        self.category = Some(category);
        self
    }

    pub fn published(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    pub fn featured(mut self, featured: bool) -> Self {
        self.featured = featured;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub original_price: f64,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub reviews: u32,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<Slug>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliate_url: Option<String>,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            brand: String::new(),
            category: None,
            price: 0.0,
            original_price: 0.0,
            rating: None,
            reviews: 0,
            featured: false,
            slug: None,
            affiliate_url: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    pub fn category(mut self, category: CategoryRef) -> Self {
        self.category = Some(category);
        self
    }

    /// Sets `price`; `original_price` is raised to at least `price`.
    pub fn priced(mut self, price: f64, original_price: f64) -> Self {
        self.price = price;
        self.original_price = original_price.max(price);
        self
    }

    pub fn rated(mut self, rating: f64, reviews: u32) -> Self {
        self.rating = Some(rating);
        self.reviews = reviews;
        self
    }

    /// Discount versus the list price, rounded to whole percent.
    /// `None` when there is no usable list price.
    pub fn savings_percent(&self) -> Option<u32> {
        if self.original_price.is_nan() || self.original_price <= 0.0 || !self.price.is_finite() {
            return None;
        }
        let pct = ((self.original_price - self.price) / self.original_price * 100.0).round();
        Some(pct.max(0.0) as u32)
    }
}

/// Tagged union of everything the listings can show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type", rename_all = "lowercase")]
pub enum Record {
    Article(Article),
    Product(Product),
}

impl Record {
    pub fn id(&self) -> &str {
        match self {
            Record::Article(a) => &a.id,
            Record::Product(p) => &p.id,
        }
    }

    /// Split a mixed batch by kind, keeping relative order within each kind.
    pub fn partition(records: Vec<Record>) -> (Vec<Article>, Vec<Product>) {
        let mut articles = Vec::new();
        let mut products = Vec::new();
        for r in records {
            match r {
                Record::Article(a) => articles.push(a),
                Record::Product(p) => products.push(p),
            }
        }
        (articles, products)
    }
}

impl From<Article> for Record {
    fn from(a: Article) -> Self {
        Record::Article(a)
    }
}

impl From<Product> for Record {
    fn from(p: Product) -> Self {
        Record::Product(p)
    }
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` date. Anything else becomes `None`.
fn lenient_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
