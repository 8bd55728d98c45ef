//! # Query state
//! The user-controlled half of a listing: search term, category filter, sort key
//! and page number. Held as an immutable value; UI events produce a new state
//! through [`QueryState::apply`].

use serde::{Deserialize, Serialize};

/// Sentinel label for "no category filter".
pub const ALL_CATEGORIES: &str = "All";

/// Category filter: everything, or records whose category title equals the label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Title(String),
}

impl CategoryFilter {
    pub fn matches(&self, title: Option<&str>) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Title(want) => title == Some(want.as_str()),
        }
    }
}

impl From<String> for CategoryFilter {
    fn from(s: String) -> Self {
        if s == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Title(s)
        }
    }
}

impl From<&str> for CategoryFilter {
    fn from(s: &str) -> Self {
        CategoryFilter::from(s.to_string())
    }
}

impl From<CategoryFilter> for String {
    fn from(f: CategoryFilter) -> Self {
        match f {
            CategoryFilter::All => ALL_CATEGORIES.to_string(),
            CategoryFilter::Title(t) => t,
        }
    }
}

/// A kind-specific sort key table.
pub trait SortKey: Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Every key with its UI label, default first.
    const OPTIONS: &'static [(Self, &'static str)];

    fn as_str(&self) -> &'static str;

    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::OPTIONS
            .iter()
            .map(|(k, _)| *k)
            .find(|k| k.as_str().eq_ignore_ascii_case(raw))
    }

    /// Unknown keys select the default ordering.
    fn parse_or_default(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArticleSort {
    #[default]
    Newest,
    Oldest,
    /// Ordered by id; there is no popularity signal for articles.
    Popular,
    Category,
}

impl SortKey for ArticleSort {
    const OPTIONS: &'static [(Self, &'static str)] = &[
        (ArticleSort::Newest, "Newest First"),
        (ArticleSort::Oldest, "Oldest First"),
        (ArticleSort::Popular, "Most Popular"),
        (ArticleSort::Category, "By Category"),
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ArticleSort::Newest => "newest",
            ArticleSort::Oldest => "oldest",
            ArticleSort::Popular => "popular",
            ArticleSort::Category => "category",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    #[default]
    Popularity,
    PriceLow,
    PriceHigh,
    Rating,
    /// Ordered by id; products carry no creation date.
    Newest,
}

impl SortKey for ProductSort {
    const OPTIONS: &'static [(Self, &'static str)] = &[
        (ProductSort::Popularity, "Most Popular"),
        (ProductSort::PriceLow, "Price: Low to High"),
        (ProductSort::PriceHigh, "Price: High to Low"),
        (ProductSort::Rating, "Highest Rated"),
        (ProductSort::Newest, "Newest First"),
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ProductSort::Popularity => "popularity",
            ProductSort::PriceLow => "price-low",
            ProductSort::PriceHigh => "price-high",
            ProductSort::Rating => "rating",
            ProductSort::Newest => "newest",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState<S> {
    pub search_term: String,
    pub category: CategoryFilter,
    pub sort: S,
    /// 1-based. Not clamped: pages past the end come back empty.
    pub page: u32,
}

impl<S: SortKey> Default for QueryState<S> {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            category: CategoryFilter::All,
            sort: S::default(),
            page: 1,
        }
    }
}

impl<S: SortKey> QueryState<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn category(mut self, category: impl Into<CategoryFilter>) -> Self {
        self.category = category.into();
        self
    }

    pub fn sort(mut self, sort: S) -> Self {
        self.sort = sort;
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Pure reducer for UI events. Any change to what matches or how it is
    /// ordered returns to page 1.
    pub fn apply(self, event: QueryEvent<S>) -> Self {
        match event {
            QueryEvent::Search(term) => Self {
                search_term: term,
                page: 1,
                ..self
            },
            QueryEvent::SelectCategory(category) => Self {
                category,
                page: 1,
                ..self
            },
            QueryEvent::SortBy(sort) => Self {
                sort,
                page: 1,
                ..self
            },
            QueryEvent::GoToPage(page) => Self { page, ..self },
            QueryEvent::ClearFilters => Self {
                search_term: String::new(),
                category: CategoryFilter::All,
                page: 1,
                ..self
            },
        }
    }
}

/// Input events forwarded by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEvent<S> {
    Search(String),
    SelectCategory(CategoryFilter),
    SortBy(S),
    GoToPage(u32),
    ClearFilters,
}

/// Raw listing parameters as they arrive on a query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
}

impl ListingParams {
    pub fn to_query<S: SortKey>(&self) -> QueryState<S> {
        QueryState {
            search_term: self.q.clone().unwrap_or_default(),
            category: self
                .category
                .as_deref()
                .map(CategoryFilter::from)
                .unwrap_or_default(),
            sort: self
                .sort
                .as_deref()
                .map(S::parse_or_default)
                .unwrap_or_default(),
            page: self.page.unwrap_or(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_the_sentinel_and_roundtrips() {
        assert_eq!(CategoryFilter::from("All"), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::from("Security"),
            CategoryFilter::Title("Security".into())
        );
        let json = serde_json::to_string(&CategoryFilter::All).unwrap();
        assert_eq!(json, "\"All\"");
    }

    #[test]
    fn title_filter_never_matches_missing_category() {
        let f = CategoryFilter::from("Security");
        assert!(!f.matches(None));
        assert!(f.matches(Some("Security")));
        assert!(!f.matches(Some("security")));
        assert!(CategoryFilter::All.matches(None));
    }

    #[test]
    fn sort_keys_parse_and_fall_back() {
        assert_eq!(ProductSort::parse("price-low"), Some(ProductSort::PriceLow));
        assert_eq!(ProductSort::parse_or_default("bogus"), ProductSort::Popularity);
        assert_eq!(ArticleSort::parse_or_default("OLDEST"), ArticleSort::Oldest);
        assert_eq!(ArticleSort::parse_or_default(""), ArticleSort::Newest);
        assert_eq!(ProductSort::OPTIONS[0].0, ProductSort::default());
        assert_eq!(ArticleSort::OPTIONS[0].0, ArticleSort::default());
    }

    #[test]
    fn serde_names_match_as_str() {
        for (k, _) in ProductSort::OPTIONS {
            let json = serde_json::to_string(k).unwrap();
            assert_eq!(json, format!("\"{}\"", k.as_str()));
        }
        for (k, _) in ArticleSort::OPTIONS {
            let json = serde_json::to_string(k).unwrap();
            assert_eq!(json, format!("\"{}\"", k.as_str()));
        }
    }

    #[test]
    fn filter_changes_reset_page() {
        let q = QueryState::<ProductSort>::new().page(4);
        assert_eq!(q.clone().apply(QueryEvent::Search("lock".into())).page, 1);
        assert_eq!(
            q.clone().apply(QueryEvent::SortBy(ProductSort::Rating)).page,
            1
        );
        assert_eq!(q.clone().apply(QueryEvent::GoToPage(7)).page, 7);

        let cleared = q
            .term("cam")
            .category("Security")
            .sort(ProductSort::PriceHigh)
            .apply(QueryEvent::ClearFilters);
        assert_eq!(cleared.search_term, "");
        assert_eq!(cleared.category, CategoryFilter::All);
        assert_eq!(cleared.sort, ProductSort::PriceHigh);
        assert_eq!(cleared.page, 1);
    }

    #[test]
    fn params_default_to_no_op_query() {
        let q: QueryState<ArticleSort> = ListingParams::default().to_query();
        assert_eq!(q, QueryState::default());

        let p = ListingParams {
            q: Some("hub".into()),
            category: Some("Energy".into()),
            sort: Some("category".into()),
            page: Some(2),
        };
        let q: QueryState<ArticleSort> = p.to_query();
        assert_eq!(q.sort, ArticleSort::Category);
        assert_eq!(q.category, CategoryFilter::Title("Energy".into()));
        assert_eq!(q.page, 2);
    }
}
