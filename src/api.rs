//! HTTP surface for the storefront UI. Every listing endpoint is a thin wrapper:
//! parse params → `QueryState` → engine → JSON.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::catalog::{self, Listable, ResultPage};
use crate::config::CatalogConfig;
use crate::content::{CatalogSnapshot, Collection, ContentQuery, ContentSource};
use crate::metrics::Metrics;
use crate::model::{Article, Product, Record};
use crate::pagination::PaginationControls;
use crate::query::{CategoryFilter, ListingParams, QueryState, SortKey};

#[derive(Clone)]
pub struct AppState {
    config: Arc<CatalogConfig>,
    source: Arc<dyn ContentSource>,
    snapshot: Arc<RwLock<Arc<CatalogSnapshot>>>,
}

impl AppState {
    pub fn new(
        config: CatalogConfig,
        source: Arc<dyn ContentSource>,
        snapshot: CatalogSnapshot,
    ) -> Self {
        Self {
            config: Arc::new(config),
            source,
            snapshot: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    /// Build the configured source and take the initial snapshot.
    pub async fn load(config: CatalogConfig) -> anyhow::Result<Self> {
        let source = config.content_source()?;
        let snapshot = CatalogSnapshot::load(source.as_ref()).await?;
        Ok(Self::new(config, source, snapshot))
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Current snapshot; the lock is released before the caller computes anything.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace_snapshot(&self, fresh: CatalogSnapshot) {
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(fresh);
    }
}

pub fn router(state: AppState) -> Router {
    let mut routes = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/articles", get(list_articles))
        .route("/api/products", get(list_products))
        .route("/api/categories", get(list_categories))
        .route("/api/search", get(search))
        .route("/api/featured/products", get(featured_products))
        .route("/api/articles/{id}/related", get(related_articles))
        .route("/api/products/{id}/related", get(related_products));

    if state.config.server.admin_routes {
        routes = routes.route("/admin/reload-content", post(reload_content));
    }

    let mut app = routes
        .layer(CorsLayer::very_permissive())
        .with_state(state.clone());

    if state.config.server.metrics {
        match Metrics::init() {
            Ok(m) => app = app.merge(m.router()),
            Err(e) => warn!(target: "catalog", error = %e, "metrics disabled"),
        }
    }
    app
}

/* ----------------------------
Response shapes
---------------------------- */

/// Product plus its computed discount, as shown on product cards.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductCard<'a> {
    #[serde(flatten)]
    product: &'a Product,
    savings_percent: Option<u32>,
}

impl<'a> From<&'a Product> for ProductCard<'a> {
    fn from(product: &'a Product) -> Self {
        Self {
            product,
            savings_percent: product.savings_percent(),
        }
    }
}

#[derive(Serialize)]
struct SortOption {
    value: &'static str,
    label: &'static str,
}

#[derive(Serialize)]
struct QueryEcho {
    q: String,
    category: CategoryFilter,
    sort: &'static str,
    page: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Listing<I> {
    items: Vec<I>,
    total_matching: usize,
    total_pages: usize,
    page: u32,
    page_size: usize,
    /// No record matched: the UI offers "clear filters".
    empty: bool,
    pagination: PaginationControls,
    query: QueryEcho,
    category_options: Vec<String>,
    sort_options: Vec<SortOption>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    featured: Vec<I>,
}

impl<I> Listing<I> {
    fn build<'a, T, F>(
        page: ResultPage<'a, T>,
        query: &QueryState<T::Sort>,
        category_options: Vec<String>,
        featured: Vec<&'a T>,
        to_item: F,
    ) -> Self
    where
        T: Listable,
        F: Fn(&'a T) -> I,
    {
        Self {
            empty: page.is_empty(),
            pagination: page.controls(),
            total_matching: page.total_matching,
            total_pages: page.total_pages,
            page: page.page,
            page_size: page.page_size,
            items: page.items.into_iter().map(&to_item).collect(),
            query: QueryEcho {
                q: query.search_term.clone(),
                category: query.category.clone(),
                sort: query.sort.as_str(),
                page: query.page,
            },
            category_options,
            sort_options: <T::Sort as SortKey>::OPTIONS
                .iter()
                .map(|(k, label)| SortOption {
                    value: k.as_str(),
                    label: *label,
                })
                .collect(),
            featured: featured.into_iter().map(&to_item).collect(),
        }
    }
}

/// Run the engine for one listing and record metrics.
fn compute<'a, T: Listable>(
    kind: &'static str,
    records: &'a [T],
    query: &QueryState<T::Sort>,
    page_size: usize,
) -> ResultPage<'a, T> {
    let t0 = Instant::now();
    let page = catalog::compute_result_page(records, query, page_size);
    histogram!("catalog_compute_ms", "kind" => kind).record(t0.elapsed().as_secs_f64() * 1000.0);
    counter!("catalog_queries_total", "kind" => kind).increment(1);
    if page.is_empty() {
        counter!("catalog_empty_results_total", "kind" => kind).increment(1);
    }
    page
}

/* ----------------------------
Handlers
---------------------------- */

async fn list_articles(State(state): State<AppState>, Query(params): Query<ListingParams>) -> Response {
    let snap = state.snapshot();
    let cfg = &state.config.catalog;
    let query = params.to_query();
    let page = compute("articles", &snap.articles, &query, cfg.page_size);
    let featured = snap.featured_articles(cfg.featured_articles);
    let body = Listing::build(page, &query, snap.category_options(), featured, |a| a);
    Json(body).into_response()
}

async fn list_products(State(state): State<AppState>, Query(params): Query<ListingParams>) -> Response {
    let snap = state.snapshot();
    let query = params.to_query();
    let page = compute("products", &snap.products, &query, state.config.catalog.page_size);
    let body = Listing::build(
        page,
        &query,
        snap.category_options(),
        Vec::new(),
        ProductCard::from,
    );
    Json(body).into_response()
}

async fn list_categories(State(state): State<AppState>) -> Response {
    let snap = state.snapshot();
    Json(&snap.categories).into_response()
}

async fn featured_products(State(state): State<AppState>) -> Response {
    let snap = state.snapshot();
    let cards: Vec<ProductCard> = snap
        .featured_products()
        .into_iter()
        .map(ProductCard::from)
        .collect();
    Json(cards).into_response()
}

async fn related_articles(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let snap = state.snapshot();
    match snap.related_articles(&id, state.config.catalog.related_limit) {
        Some(list) => Json(list).into_response(),
        None => (StatusCode::NOT_FOUND, format!("unknown article '{id}'")).into_response(),
    }
}

async fn related_products(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let snap = state.snapshot();
    match snap.related_products(&id, state.config.catalog.related_limit) {
        Some(list) => {
            let cards: Vec<ProductCard> = list.into_iter().map(ProductCard::from).collect();
            Json(cards).into_response()
        }
        None => (StatusCode::NOT_FOUND, format!("unknown product '{id}'")).into_response(),
    }
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    page: Option<u32>,
}

#[derive(Serialize)]
struct SearchResponse<'a> {
    term: String,
    articles: Listing<&'a Article>,
    products: Listing<ProductCard<'a>>,
}

/// Search page: the source scopes by word prefix, the engine then lists the
/// hits with the default query.
async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let term = params.q.as_deref().unwrap_or("").trim().to_string();
    let page_no = params.page.unwrap_or(1);

    let (articles, products) = if term.is_empty() {
        (Vec::new(), Vec::new())
    } else {
        let aq = ContentQuery::search(Collection::Articles, &term);
        let pq = ContentQuery::search(Collection::Products, &term);
        match tokio::try_join!(state.source.fetch(&aq), state.source.fetch(&pq)) {
            Ok((a, p)) => (Record::partition(a).0, Record::partition(p).1),
            Err(e) => {
                counter!("content_fetch_errors_total", "source" => state.source.name()).increment(1);
                warn!(target: "catalog", source = state.source.name(), error = %e, "search fetch failed");
                return (StatusCode::BAD_GATEWAY, format!("content source error: {e}")).into_response();
            }
        }
    };
    info!(
        target: "catalog",
        articles = articles.len(),
        products = products.len(),
        "search fetched"
    );

    let snap = state.snapshot();
    let options = snap.category_options();
    let size = state.config.catalog.page_size;

    let aq = QueryState::new().page(page_no);
    let apage = compute("search_articles", &articles, &aq, size);
    let pq = QueryState::new().page(page_no);
    let ppage = compute("search_products", &products, &pq, size);

    let body = SearchResponse {
        term: term.clone(),
        articles: Listing::build(apage, &aq, options.clone(), Vec::new(), |a| a),
        products: Listing::build(ppage, &pq, options, Vec::new(), ProductCard::from),
    };
    Json(body).into_response()
}

async fn reload_content(State(state): State<AppState>) -> Response {
    match CatalogSnapshot::load(state.source.as_ref()).await {
        Ok(fresh) => {
            let msg = format!(
                "reloaded: {} articles, {} products, {} categories from {} at {}",
                fresh.articles.len(),
                fresh.products.len(),
                fresh.categories.len(),
                fresh.source,
                fresh.loaded_at.to_rfc3339()
            );
            info!(target: "catalog", source = fresh.source, loaded_at = %fresh.loaded_at, "content reloaded");
            state.replace_snapshot(fresh);
            (StatusCode::OK, msg).into_response()
        }
        Err(e) => (StatusCode::BAD_GATEWAY, format!("failed: {e:#}")).into_response(),
    }
}
