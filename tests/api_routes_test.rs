use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use live_tv::{
    catalog::{CatalogStore, DemoCatalogSource, PreferenceStore},
    config::Config,
    relay::StreamResolver,
    web::{create_router, AppState},
};

// Helper function to send requests to the app
async fn send_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request_builder = Request::builder().method(method).uri(uri);

    let request = if let Some(body) = body {
        request_builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    } else {
        request_builder.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(json!({}))
    };

    (status, json)
}

async fn demo_app(refresh: bool) -> Router {
    let config = Config::default();
    let catalog = CatalogStore::new(Arc::new(DemoCatalogSource::new(Some(7))));
    if refresh {
        catalog.refresh().await;
    }
    let preferences = PreferenceStore::new(config.preferences.clone());
    let resolver = StreamResolver::from_config(&config.relay).unwrap();

    create_router(AppState::new(config, catalog, preferences, resolver))
}

fn names(channels: &Value) -> Vec<String> {
    channels
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = demo_app(false).await;
    let (status, response) = send_request(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "healthy");
    assert!(response.get("timestamp").is_some());
}

#[tokio::test]
async fn test_catalog_before_first_refresh_is_empty() {
    let app = demo_app(false).await;
    let (status, response) = send_request(&app, Method::GET, "/api/catalog", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], true);
    assert_eq!(response["data"]["channels"], json!([]));
    assert_eq!(response["data"]["is_loading"], false);
    assert!(response["data"]["error"].is_null());
}

#[tokio::test]
async fn test_refresh_then_filter_by_category() {
    let app = demo_app(false).await;

    let (status, response) =
        send_request(&app, Method::POST, "/api/catalog/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["replaced"], true);
    assert_eq!(response["data"]["channel_count"], 24);

    let (_, response) = send_request(&app, Method::GET, "/api/catalog?category=news", None).await;
    assert_eq!(
        names(&response["data"]["channels"]),
        vec!["CNN", "Fox News", "BBC News", "NBC", "CBS", "ABC"]
    );
    assert_eq!(response["data"]["total"], 24);

    let first = &response["data"]["channels"][0];
    assert_eq!(first["id"], "ch-1");
    assert_eq!(first["number"], "101");
    assert_eq!(first["stream_type"], "application/x-mpegURL");
    assert_eq!(first["programs"].as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn test_unknown_category_is_rejected() {
    let app = demo_app(true).await;
    let (status, response) =
        send_request(&app, Method::GET, "/api/catalog?category=weather", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["success"], false);
}

#[tokio::test]
async fn test_search_matches_names_and_program_titles() {
    let app = demo_app(true).await;

    let (_, response) = send_request(&app, Method::GET, "/api/channels/search?q=ESPN", None).await;
    assert_eq!(names(&response["data"]), vec!["ESPN"]);

    // Every News channel airs "News Program N"
    let (_, response) = send_request(&app, Method::GET, "/api/channels/search?q=news", None).await;
    assert_eq!(response["data"].as_array().unwrap().len(), 6);

    let (_, response) = send_request(&app, Method::GET, "/api/channels/search?q=", None).await;
    assert_eq!(response["data"], json!([]));
}

#[tokio::test]
async fn test_channel_lookup_and_related() {
    let app = demo_app(true).await;

    let (status, response) = send_request(&app, Method::GET, "/api/channels/ch-4", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["name"], "ESPN");

    let (_, response) =
        send_request(&app, Method::GET, "/api/channels/ch-4/related", None).await;
    assert_eq!(names(&response["data"]), vec!["Fox Sports"]);

    let (status, _) = send_request(&app, Method::GET, "/api/channels/ch-999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        send_request(&app, Method::GET, "/api/channels/ch-999/related", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_featured_draws_from_news_and_sports() {
    let app = demo_app(true).await;
    let (_, response) = send_request(&app, Method::GET, "/api/channels/featured", None).await;

    let featured = response["data"].as_array().unwrap();
    assert_eq!(featured.len(), 5);
    for channel in featured {
        let category = channel["category"].as_str().unwrap();
        assert!(category == "News" || category == "Sports", "{category}");
    }
}

#[tokio::test]
async fn test_grouped_channels() {
    let app = demo_app(true).await;
    let (_, response) = send_request(&app, Method::GET, "/api/channels/grouped", None).await;

    let groups = response["data"].as_array().unwrap();
    let categories: Vec<&str> = groups
        .iter()
        .map(|g| g["category"].as_str().unwrap())
        .collect();
    assert_eq!(
        categories,
        vec!["News", "Sports", "Entertainment", "Movies", "Kids"]
    );
    assert_eq!(groups[0]["channels"].as_array().unwrap().len(), 4);
    assert_eq!(groups[1]["channels"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_favorites_recent_and_settings() {
    let app = demo_app(true).await;

    let (_, response) = send_request(&app, Method::POST, "/api/favorites/ch-1", None).await;
    assert_eq!(response["data"]["is_favorite"], true);
    let (_, response) = send_request(&app, Method::POST, "/api/favorites/ch-5", None).await;
    assert_eq!(response["data"]["is_favorite"], true);
    let (_, response) = send_request(&app, Method::POST, "/api/favorites/ch-1", None).await;
    assert_eq!(response["data"]["is_favorite"], false);

    send_request(&app, Method::POST, "/api/recent/ch-2", None).await;
    let (_, response) = send_request(&app, Method::POST, "/api/recent/ch-3", None).await;
    assert_eq!(response["data"]["recent_channels"], json!(["ch-3", "ch-2"]));

    let (status, response) = send_request(
        &app,
        Method::PATCH,
        "/api/settings",
        Some(json!({ "data_saver": true, "quality": "720p" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["data_saver"], true);
    assert_eq!(response["data"]["quality"], "720p");
    assert_eq!(response["data"]["volume"], 1.0);

    let (_, response) = send_request(&app, Method::GET, "/api/preferences", None).await;
    let data = &response["data"];
    assert_eq!(data["favorites"], json!(["ch-5"]));
    assert_eq!(names(&data["favorite_channels"]), vec!["Fox Sports"]);
    assert_eq!(names(&data["recent"]), vec!["BBC News", "Fox News"]);
    assert_eq!(data["settings"]["quality"], "720p");
}
