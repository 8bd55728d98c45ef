//! # Catalog Engine
//! Maps `(records, query)` to a `ResultPage`. Nothing here touches I/O or keeps
//! state between calls, so equal inputs always produce equal pages.
//!
//! Pipeline: filter (term AND category) → stable sort → paginate. Articles and
//! products share the pipeline through [`Listable`], which supplies the
//! searchable text fields, the category title and the sort table of a kind.

use std::cmp::Ordering;

use serde::Serialize;

use crate::model::{Article, Product};
use crate::pagination::{self, PaginationControls};
use crate::query::{ArticleSort, CategoryFilter, ProductSort, QueryState, SortKey};

/// Records per page in both listings.
pub const DEFAULT_PAGE_SIZE: usize = 6;

/// Per-kind accessors the engine is parameterized by.
pub trait Listable {
    type Sort: SortKey;

    /// Text fields the search term is matched against.
    fn search_fields(&self) -> Vec<&str>;

    fn category_title(&self) -> Option<&str>;

    /// Ordering under `key`; `Equal` keeps input order.
    fn compare(&self, other: &Self, key: Self::Sort) -> Ordering;
}

impl Listable for Article {
    type Sort = ArticleSort;

    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.excerpt.as_str()]
    }

    fn category_title(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.title.as_str())
    }

    fn compare(&self, other: &Self, key: ArticleSort) -> Ordering {
        match key {
            ArticleSort::Newest => other.published_at.cmp(&self.published_at),
            ArticleSort::Oldest => self.published_at.cmp(&other.published_at),
            ArticleSort::Popular => self.id.cmp(&other.id),
            ArticleSort::Category => self
                .category_title()
                .unwrap_or("")
                .cmp(other.category_title().unwrap_or("")),
        }
    }
}

impl Listable for Product {
    type Sort = ProductSort;

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.description.as_str(),
            self.brand.as_str(),
        ]
    }

    fn category_title(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.title.as_str())
    }

    fn compare(&self, other: &Self, key: ProductSort) -> Ordering {
        match key {
            ProductSort::Popularity => other.reviews.cmp(&self.reviews),
            ProductSort::PriceLow => self.price.total_cmp(&other.price),
            ProductSort::PriceHigh => other.price.total_cmp(&self.price),
            ProductSort::Rating => cmp_missing_smallest(other.rating, self.rating),
            ProductSort::Newest => self.id.cmp(&other.id),
        }
    }
}

/// `None` orders below every value.
fn cmp_missing_smallest(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.total_cmp(&y),
    }
}

/// Case-insensitive substring match against any search field. Empty term matches.
pub fn matches_term<T: Listable>(record: &T, term: &str) -> bool {
    let needle = term.to_lowercase();
    matches_lowered(record, &needle)
}

fn matches_lowered<T: Listable>(record: &T, needle: &str) -> bool {
    needle.is_empty()
        || record
            .search_fields()
            .iter()
            .any(|f| f.to_lowercase().contains(needle))
}

/// Records matching `term` AND `category`, in input order.
pub fn filter<'a, T: Listable>(records: &'a [T], term: &str, category: &CategoryFilter) -> Vec<&'a T> {
    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|r| matches_lowered(*r, &needle) && category.matches(r.category_title()))
        .collect()
}

/// Stable sort under `key`.
pub fn sort<'a, T: Listable>(mut records: Vec<&'a T>, key: T::Sort) -> Vec<&'a T> {
    records.sort_by(|a, b| a.compare(b, key));
    records
}

/// The visible slice of an already filtered and sorted sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage<'a, T> {
    pub items: Vec<&'a T>,
    pub total_matching: usize,
    pub total_pages: usize,
    pub page: u32,
    pub page_size: usize,
}

impl<'a, T> ResultPage<'a, T> {
    /// Nothing matched the query (distinct from a page past the end).
    pub fn is_empty(&self) -> bool {
        self.total_matching == 0
    }

    pub fn controls(&self) -> PaginationControls {
        pagination::controls(self.page, self.total_pages)
    }
}

/// Slice page `page` (1-based) out of `records`. Pages outside `1..=total_pages`
/// come back with no items; a zero page size yields zero pages.
pub fn paginate<'a, T>(records: Vec<&'a T>, page: u32, page_size: usize) -> ResultPage<'a, T> {
    let total_matching = records.len();
    let total_pages = if page_size == 0 {
        0
    } else {
        total_matching.div_ceil(page_size)
    };

    let window = (page as usize)
        .checked_sub(1)
        .and_then(|p| p.checked_mul(page_size))
        .filter(|&start| start < total_matching)
        .map(|start| start..start.saturating_add(page_size).min(total_matching));

    let items = match window {
        Some(range) => records[range].to_vec(),
        None => Vec::new(),
    };

    ResultPage {
        items,
        total_matching,
        total_pages,
        page,
        page_size,
    }
}

/// filter → sort → paginate for one listing query.
pub fn compute_result_page<'a, T: Listable>(
    records: &'a [T],
    query: &QueryState<T::Sort>,
    page_size: usize,
) -> ResultPage<'a, T> {
    let matching = filter(records, &query.search_term, &query.category);
    let sorted = sort(matching, query.sort);
    paginate(sorted, query.page, page_size)
}
