//! HTTP API tests.
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot` against a
//! scripted seller page and a temporary database.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use pricewise::aggregate::{FetchOrchestrator, FetchPermits};
use pricewise::models::Product;
use pricewise::repository::DbContext;
use pricewise::scrapers::{FetchError, PageFetcher};
use pricewise::sellers::{FieldRule, SellerDescriptor, SellerRules};
use pricewise::server::{create_router, AppState};
use pricewise::services::SearchService;

const PAGE: &str = r#"
    <div class="item">
      <a href="https://shop.test/p/eggs-12">Eggs</a>
      <h2>Free Range Eggs 12 Pack</h2>
      <span class="price">€4.80</span>
      <span class="unit">€0.40/each</span>
    </div>
    <div class="item">
      <a href="https://shop.test/p/eggs-6">Eggs</a>
      <h2>Free Range Eggs 6 Pack</h2>
      <span class="price">€2.10</span>
      <span class="unit">€0.35/each</span>
    </div>
"#;

struct StaticFetcher(&'static str);

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        Ok(self.0.to_string())
    }
}

fn orchestrator(page: &'static str) -> FetchOrchestrator {
    let descriptor = SellerDescriptor {
        id: "shop".to_string(),
        name: "Shop".to_string(),
        base_url: "https://shop.test".to_string(),
        search_path: "/search?q={query}".to_string(),
        listing: "div.item".to_string(),
        product_name: FieldRule::text("h2"),
        price: FieldRule::text(".price"),
        price_per_unit: FieldRule::text(".unit"),
        was_price: None,
        discount: None,
        link: FieldRule::attr("a", "href"),
        link_prefix: None,
        image: None,
    };
    FetchOrchestrator::new(
        Arc::new(StaticFetcher(page)),
        vec![Arc::new(SellerRules::compile(descriptor).unwrap())],
        FetchPermits::new(1),
    )
}

async fn persistent_app(page: &'static str) -> (Router, DbContext, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = DbContext::new(&dir.path().join("api.db"));
    ctx.init_schema().await.unwrap();
    let search = SearchService::new(orchestrator(page), ctx.searches(), 7);
    let state = AppState::new(search, Some(ctx.baskets()));
    (create_router(state), ctx, dir)
}

fn scrape_only_app() -> Router {
    let search = SearchService::scrape_only(orchestrator(PAGE));
    create_router(AppState::new(search, None))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn basket_request(method: &str, uri: &str, client: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(client) = client {
        builder = builder.header("x-client-id", client);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn first_result(app: &Router) -> Value {
    let (status, body) = send(app, get("/api/search?search_term=eggs")).await;
    assert_eq!(status, StatusCode::OK);
    body["results"][0].clone()
}

#[tokio::test]
async fn test_health() {
    let response = scrape_only_app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_search_returns_ranked_results_and_rates() {
    let (app, _ctx, _dir) = persistent_app(PAGE).await;

    let (status, body) = send(&app, get("/api/search?search_term=Free%20Range%20Eggs")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fresh");
    assert_eq!(body["results"][0]["name"], "Free Range Eggs 6 Pack");
    assert_eq!(body["results"][0]["unit_type"], "each");
    assert!(body["results"][0]["id"].is_i64());
    assert_eq!(body["currency"]["Euro"]["rate"], 1.0);

    let (_, body) = send(&app, get("/api/search?search_term=free+range+eggs")).await;
    assert_eq!(body["source"], "cache");
}

#[tokio::test]
async fn test_search_converts_currency() {
    let app = scrape_only_app();

    let (status, body) = send(&app, get("/api/search?search_term=eggs&currency=GBP")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["currency"], "£");

    let (status, body) = send(&app, get("/api/search?search_term=eggs&currency=XYZ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("XYZ"));
}

#[tokio::test]
async fn test_search_errors() {
    let app = scrape_only_app();
    let (status, _) = send(&app, get("/api/search?search_term=%20%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let empty = create_router(AppState::new(
        SearchService::scrape_only(orchestrator("<html></html>")),
        None,
    ));
    let (status, body) = send(&empty, get("/api/search?search_term=unicorn")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No products found for 'unicorn'");
}

#[tokio::test]
async fn test_basket_add_list_remove() {
    let (app, _ctx, _dir) = persistent_app(PAGE).await;
    let product = first_result(&app).await;

    let (status, body) = send(
        &app,
        basket_request("POST", "/api/add_item", Some("client-a"), product.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Product added to basket: Free Range Eggs 6 Pack"
    );

    // Adding twice keeps one entry
    send(
        &app,
        basket_request("POST", "/api/add_item", Some("client-a"), product.clone()),
    )
    .await;

    let list = |client: &'static str| {
        Request::builder()
            .uri("/api/get_items")
            .header("x-client-id", client)
            .body(Body::empty())
            .unwrap()
    };
    let (status, body) = send(&app, list("client-a")).await;
    assert_eq!(status, StatusCode::OK);
    let items: Vec<Product> = serde_json::from_value(body["results"].clone()).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, product["id"].as_i64());

    let (_, body) = send(&app, list("client-b")).await;
    assert_eq!(body["results"], json!([]));

    let (status, _) = send(
        &app,
        basket_request("POST", "/api/remove_item", Some("client-a"), product.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        basket_request("POST", "/api/remove_item", Some("client-a"), product),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_basket_rejects_bad_requests() {
    let (app, _ctx, _dir) = persistent_app(PAGE).await;
    let product = first_result(&app).await;

    let (status, _) = send(
        &app,
        basket_request("POST", "/api/add_item", None, product.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut without_id = product.clone();
    without_id.as_object_mut().unwrap().remove("id");
    let (status, _) = send(
        &app,
        basket_request("POST", "/api/add_item", Some("client-a"), without_id),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut unknown = product;
    unknown["id"] = json!(9999);
    let (status, _) = send(
        &app,
        basket_request("POST", "/api/add_item", Some("client-a"), unknown),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_basket_unavailable_without_persistence() {
    let app = scrape_only_app();
    let product = json!({
        "id": 1,
        "seller": "shop",
        "name": "Free Range Eggs 6 Pack",
        "url": "https://shop.test/p/eggs-6"
    });

    let (status, _) = send(
        &app,
        basket_request("POST", "/api/add_item", Some("client-a"), product),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
