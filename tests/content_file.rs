// tests/content_file.rs
//
// JsonFileSource against real files: the bundled export and temp fixtures.

use std::io::Write;

use echofex_catalog::content::file::JsonFileSource;
use echofex_catalog::{CatalogSnapshot, Collection, ContentQuery, ContentSource, Record};

fn write_fixture(json: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().expect("tempfile");
    f.write_all(json.as_bytes()).expect("write fixture");
    f
}

const SMALL: &str = r#"{
  "categories": [{ "_id": "c1", "title": "Security", "slug": "security" }],
  "articles": [
    { "_id": "a1", "title": "Door Locks", "excerpt": "Smart entry", "publishedAt": "2024-01-10" },
    { "_id": "a2", "title": "Bulbs", "excerpt": "Light scenes" }
  ],
  "products": [
    { "_id": "p1", "name": "Smart Lock", "brand": "Acme", "price": 99.5, "originalPrice": 120,
      "category": { "title": "Security" } },
    { "_id": "p2", "name": "Bulb", "brand": "Nova", "price": 12 }
  ]
}"#;

#[tokio::test]
async fn loads_snapshot_from_file() {
    let f = write_fixture(SMALL);
    let source = JsonFileSource::new(f.path());

    let snap = CatalogSnapshot::load(&source).await.expect("load");
    assert_eq!(snap.source, "file");
    assert_eq!(snap.articles.len(), 2);
    assert_eq!(snap.products.len(), 2);
    assert_eq!(snap.categories[0].title, "Security");
    assert!(snap.articles[0].published_at.is_some());
    assert!(snap.articles[1].published_at.is_none());
    assert_eq!(snap.products[1].rating, None);
}

#[tokio::test]
async fn search_scopes_records_by_word_prefix() {
    let f = write_fixture(SMALL);
    let source = JsonFileSource::new(f.path());

    let hits = source
        .fetch(&ContentQuery::search(Collection::Products, "sma"))
        .await
        .expect("fetch");
    let ids: Vec<&str> = hits.iter().map(Record::id).collect();
    assert_eq!(ids, vec!["p1"]);

    // prefix, not substring
    let hits = source
        .fetch(&ContentQuery::search(Collection::Articles, "ocks"))
        .await
        .expect("fetch");
    assert!(hits.is_empty());

    let all = source
        .fetch(&ContentQuery::all(Collection::Articles))
        .await
        .expect("fetch");
    assert!(all.iter().all(|r| matches!(r, Record::Article(_))));
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn missing_file_is_an_error_with_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.json");
    let source = JsonFileSource::new(&path);
    assert_eq!(source.path(), path.as_path());

    let err = source.fetch_categories().await.unwrap_err();
    assert!(format!("{err:#}").contains("absent.json"));
}

#[tokio::test]
async fn malformed_json_is_an_error() {
    let f = write_fixture("{ \"articles\": [ { \"_id\": ");
    let source = JsonFileSource::new(f.path());
    assert!(source
        .fetch(&ContentQuery::all(Collection::Articles))
        .await
        .is_err());
}

#[tokio::test]
async fn bundled_catalog_export_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/content/catalog.json");
    let snap = CatalogSnapshot::load(&JsonFileSource::new(path))
        .await
        .expect("bundled catalog loads");

    assert!(!snap.articles.is_empty());
    assert!(!snap.products.is_empty());
    assert_eq!(snap.category_options()[0], "All");
    assert!(!snap.featured_products().is_empty());
    assert!(snap
        .products
        .iter()
        .any(|p| p.category.is_none() || p.rating.is_none()));
}
