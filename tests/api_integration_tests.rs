//! Integration Tests for API Endpoints
//!
//! Drives the full router against an in-memory log source.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use parking_lot::Mutex;
use raid_meter::{
    api::create_router,
    cache::CacheStore,
    error::FetchError,
    remote::{GuildRef, LogRequest, LogSource},
    AppState, Config,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Fake Source ==

#[derive(Default)]
struct FakeSource {
    listing: Mutex<Option<Result<String, FetchError>>>,
    logs: Mutex<HashMap<String, Result<String, FetchError>>>,
    log_calls: Mutex<usize>,
}

#[async_trait]
impl LogSource for FakeSource {
    async fn fetch_reports(&self, _guild: &GuildRef) -> Result<String, FetchError> {
        self.listing
            .lock()
            .clone()
            .unwrap_or_else(|| Err(FetchError::Transport("connection refused".to_string())))
    }

    async fn fetch_log(&self, request: &LogRequest) -> Result<String, FetchError> {
        *self.log_calls.lock() += 1;
        self.logs
            .lock()
            .get(&request.log_id)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Transport("connection refused".to_string())))
    }
}

// == Helper Functions ==

fn create_test_app(source: Arc<FakeSource>) -> Router {
    let cache = Arc::new(CacheStore::new(100));
    let state = AppState::new(source, cache, &Config::default());
    create_router(state)
}

fn listing() -> String {
    json!([
        {"id": "a1", "title": "Molten Core", "zone": 1000, "start": 1_577_836_800_000i64, "end": 1_577_840_400_000i64},
        {"id": "b2", "title": "Blackwing Lair", "zone": 1002, "start": 1_580_515_200_000i64, "end": 1_580_518_800_000i64}
    ])
    .to_string()
}

fn log_body(totals: &[(&str, &str, u64)]) -> String {
    let entries: Vec<Value> = totals
        .iter()
        .map(|(name, class, total)| json!({"name": name, "type": class, "total": total}))
        .collect();
    json!({ "entries": entries }).to_string()
}

fn report_json(id: &str) -> Value {
    json!({"id": id, "title": format!("raid {}", id), "zone": 1000, "start": 0, "end": 3_600_000})
}

fn aggregate_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/aggregate")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(Arc::new(FakeSource::default()));

    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}

// == Reports Endpoint Tests ==

#[tokio::test]
async fn test_reports_endpoint_lists_and_filters() {
    let source = Arc::new(FakeSource::default());
    *source.listing.lock() = Some(Ok(listing()));
    let app = create_test_app(source);

    let response = app
        .clone()
        .oneshot(get_request("/reports?guild=Inheritance&server=Razorgore&region=EU"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["guild"], "<Inheritance>-<Razorgore>-<EU>");
    assert_eq!(json["reports"].as_array().unwrap().len(), 2);

    let response = app
        .oneshot(get_request(
            "/reports?guild=Inheritance&server=Razorgore&region=EU&zone=1002&since=2020-01-15",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    let reports = json["reports"].as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["id"], "b2");
}

#[tokio::test]
async fn test_reports_endpoint_rejects_empty_guild() {
    let app = create_test_app(Arc::new(FakeSource::default()));

    let response = app
        .oneshot(get_request("/reports?guild=&server=Razorgore&region=EU"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("guild"));
}

#[tokio::test]
async fn test_reports_endpoint_rejects_bad_date() {
    let app = create_test_app(Arc::new(FakeSource::default()));

    let response = app
        .oneshot(get_request("/reports?guild=g&server=s&region=r&since=last-week"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reports_endpoint_transport_failure() {
    let app = create_test_app(Arc::new(FakeSource::default()));

    let response = app
        .oneshot(get_request("/reports?guild=g&server=s&region=r"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_reports_endpoint_upstream_error_body_is_empty_list() {
    let source = Arc::new(FakeSource::default());
    *source.listing.lock() = Some(Ok(r#"{"status": 401, "error": "Invalid key"}"#.to_string()));
    let app = create_test_app(source);

    let response = app
        .oneshot(get_request("/reports?guild=g&server=s&region=r"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert!(json["reports"].as_array().unwrap().is_empty());
}

// == Aggregate Endpoint Tests ==

#[tokio::test]
async fn test_aggregate_endpoint_ranks_entities() {
    let source = Arc::new(FakeSource::default());
    source.logs.lock().insert(
        "r1".to_string(),
        Ok(log_body(&[
            ("Tank", "Warrior", 100),
            ("Healer", "Priest", 300),
            ("Mage", "Mage", 600),
        ])),
    );
    let app = create_test_app(source);

    let response = app
        .oneshot(aggregate_request(json!({
            "reports": [report_json("r1")],
            "view": "damage-done"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["title"], "Percentage of total damage-done");
    assert_eq!(json["logs_requested"], 1);
    assert_eq!(json["logs_used"], 1);
    assert_eq!(json["all_failed"], false);

    let entities = json["entities"].as_array().unwrap();
    let names: Vec<&str> = entities.iter().map(|e| e["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Tank", "Healer", "Mage"]);
    assert_eq!(entities[2]["mean"], 60.0);
    assert_eq!(entities[2]["color"], "#69CCF0");
    assert!(entities[2]["std"].is_null());
}

#[tokio::test]
async fn test_aggregate_endpoint_class_filter() {
    let source = Arc::new(FakeSource::default());
    source.logs.lock().insert(
        "r1".to_string(),
        Ok(log_body(&[("Tank", "Warrior", 400), ("Mage", "Mage", 600)])),
    );
    let app = create_test_app(source);

    let response = app
        .oneshot(aggregate_request(json!({
            "reports": [report_json("r1")],
            "view": "healing",
            "classes": ["Warrior"]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    let entities = json["entities"].as_array().unwrap();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0]["name"], "Tank");
    assert_eq!(entities[0]["class"], "Warrior");
}

#[tokio::test]
async fn test_aggregate_endpoint_all_failed() {
    let app = create_test_app(Arc::new(FakeSource::default()));

    let response = app
        .oneshot(aggregate_request(json!({
            "reports": [report_json("gone"), report_json("missing")],
            "view": "damage-taken"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["all_failed"], true);
    assert_eq!(json["logs_used"], 0);
    assert_eq!(json["skipped"].as_array().unwrap().len(), 2);
    assert!(json["entities"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_aggregate_endpoint_rejects_empty_reports() {
    let app = create_test_app(Arc::new(FakeSource::default()));

    let response = app
        .oneshot(aggregate_request(json!({
            "reports": [],
            "view": "damage-done"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_aggregate_endpoint_rejects_unknown_view() {
    let app = create_test_app(Arc::new(FakeSource::default()));

    let response = app
        .oneshot(aggregate_request(json!({
            "reports": [report_json("r1")],
            "view": "threat"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("threat"));
}

#[tokio::test]
async fn test_aggregate_endpoint_rejects_invalid_json() {
    let app = create_test_app(Arc::new(FakeSource::default()));

    let request = Request::builder()
        .method("POST")
        .uri("/aggregate")
        .header("Content-Type", "application/json")
        .body(Body::from("not valid json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_client_error());
}

// == Stats Endpoint Tests ==

#[tokio::test]
async fn test_stats_reflect_cached_logs() {
    let source = Arc::new(FakeSource::default());
    source.logs.lock().insert(
        "r1".to_string(),
        Ok(log_body(&[("A", "Rogue", 50), ("B", "Druid", 50)])),
    );
    let app = create_test_app(Arc::clone(&source));

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(aggregate_request(json!({
                "reports": [report_json("r1")],
                "view": "damage-done"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(*source.log_calls.lock(), 1);

    let response = app.oneshot(get_request("/stats")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    let namespaces = json["namespaces"].as_array().unwrap();
    let names: Vec<&str> = namespaces
        .iter()
        .map(|ns| ns["namespace"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["logs", "reports"]);

    let logs = &namespaces[0];
    assert_eq!(logs["total_entries"], 1);
    assert!(logs["hits"].as_u64().unwrap() >= 1);
    assert_eq!(logs["limit"], 500);
}

// == Routing Tests ==

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = create_test_app(Arc::new(FakeSource::default()));

    let response = app.oneshot(get_request("/nonexistent")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
