// tests/content_sanity.rs
//
// SanitySource against a local axum stand-in for the query API. Failed loads
// must show up exactly once in `content_fetch_errors_total`.

use axum::{http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;

use echofex_catalog::content::sanity::SanitySource;
use echofex_catalog::metrics::Metrics;
use echofex_catalog::{CatalogSnapshot, Collection, ContentQuery, ContentSource};

const QUERY_PATH: &str = "/v2023-05-03/data/query/production";

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}{QUERY_PATH}")
}

fn error_count(rendered: &str) -> Option<u64> {
    rendered
        .lines()
        .find(|l| l.starts_with(r#"content_fetch_errors_total{source="sanity"}"#))
        .and_then(|l| l.rsplit(' ').next())
        .and_then(|v| v.parse().ok())
}

#[tokio::test]
async fn fetches_unwrap_result_envelope() {
    let body = r#"{"ms":2,"result":[{"_id":"p1","name":"Smart Plug","price":19.0}]}"#;
    let url = serve(Router::new().route(QUERY_PATH, get(move || async move { body }))).await;
    let source = SanitySource::new(&url).expect("endpoint");

    let records = source
        .fetch(&ContentQuery::all(Collection::Products))
        .await
        .expect("fetch");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id(), "p1");
}

#[tokio::test]
async fn failed_loads_are_counted_once() {
    let metrics = Metrics::init().expect("recorder");

    let down = serve(Router::new().route(
        QUERY_PATH,
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
    ))
    .await;
    let err = CatalogSnapshot::load(&SanitySource::new(&down).expect("endpoint"))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("503"), "unexpected error: {err:#}");
    assert_eq!(error_count(&metrics.handle.render()), Some(1));

    let garbage = serve(Router::new().route(QUERY_PATH, get(|| async { "<html>" }))).await;
    assert!(CatalogSnapshot::load(&SanitySource::new(&garbage).expect("endpoint"))
        .await
        .is_err());
    assert_eq!(error_count(&metrics.handle.render()), Some(2));
}
