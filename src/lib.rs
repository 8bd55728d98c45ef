// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod catalog;
pub mod config;
pub mod content;
pub mod metrics;
pub mod model;
pub mod pagination;
pub mod query;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::catalog::{compute_result_page, filter, paginate, sort, Listable, ResultPage, DEFAULT_PAGE_SIZE};
pub use crate::content::{CatalogSnapshot, Collection, ContentQuery, ContentSource};
pub use crate::model::{Article, Category, CategoryRef, Product, Record};
pub use crate::query::{ArticleSort, CategoryFilter, ProductSort, QueryEvent, QueryState};

use tracing::info;

/// Build the full in-process app from `config/catalog.toml` + env: content
/// source, initial snapshot, router. The binary and the HTTP tests share this.
pub async fn app() -> anyhow::Result<axum::Router> {
    let config = config::CatalogConfig::load()?;
    let state = AppState::load(config).await?;
    let snap = state.snapshot();
    info!(
        target: "catalog",
        source = snap.source,
        page_size = state.config().catalog.page_size,
        "catalog app ready"
    );
    Ok(router(state))
}
