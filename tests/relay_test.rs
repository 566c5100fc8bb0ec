use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures::StreamExt;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use live_tv::{
    catalog::{CatalogStore, DemoCatalogSource, PreferenceStore},
    config::Config,
    relay::{relay_url, StreamResolver},
    web::{create_router, AppState},
};

const PLAYLIST: &str = "#EXTM3U\n#EXT-X-VERSION:3\nsegment0.ts\n";

/// Throwaway upstream that only serves requests carrying its own origin as Referer
async fn spawn_upstream() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let origin = format!("http://{addr}");

    let app = Router::new()
        .route(
            "/live.m3u8",
            get(move |headers: HeaderMap| {
                let origin = origin.clone();
                async move {
                    let referer = headers.get(header::REFERER).and_then(|v| v.to_str().ok());
                    let agent = headers
                        .get(header::USER_AGENT)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("");
                    if referer != Some(origin.as_str()) || !agent.starts_with("Mozilla/5.0") {
                        return StatusCode::FORBIDDEN.into_response();
                    }
                    (
                        [(header::CONTENT_TYPE, "application/vnd.apple.mpegurl")],
                        PLAYLIST,
                    )
                        .into_response()
                }
            }),
        )
        .route("/raw", get(|| async { Response::new(Body::from("raw-bytes")) }))
        .route(
            "/live.ts",
            get(|| async {
                // Never-ending transport stream, one packet every 10ms
                let packets = futures::stream::unfold((), |()| async {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Some((Ok::<_, std::io::Error>(Bytes::from(vec![0x47u8; 188])), ()))
                });
                (
                    [(header::CONTENT_TYPE, "video/mp2t")],
                    Body::from_stream(packets),
                )
            }),
        )
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn relay_app() -> Router {
    let config = Config::default();
    let catalog = CatalogStore::new(Arc::new(DemoCatalogSource::new(Some(1))));
    let preferences = PreferenceStore::new(config.preferences.clone());
    let resolver = StreamResolver::from_config(&config.relay).unwrap();
    create_router(AppState::new(config, catalog, preferences, resolver))
}

async fn get_relay(app: &Router, uri: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body.to_vec())
}

fn error_message(body: &[u8]) -> String {
    let json: Value = serde_json::from_slice(body).unwrap();
    json["error"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_relay_passes_body_and_headers() {
    let upstream = spawn_upstream().await;
    let app = relay_app();

    let uri = relay_url("/api/proxy", &format!("http://{upstream}/live.m3u8"));
    let (status, headers, body) = get_relay(&app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, PLAYLIST.as_bytes());
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "application/vnd.apple.mpegurl"
    );
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    assert_eq!(
        headers.get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=60"
    );
}

#[tokio::test]
async fn test_endless_stream_is_relayed_as_it_arrives() {
    let upstream = spawn_upstream().await;
    let app = relay_app();

    let uri = relay_url("/api/proxy", &format!("http://{upstream}/live.ts"));
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = tokio::time::timeout(Duration::from_secs(5), app.oneshot(request))
        .await
        .expect("relay answered before the upstream body ended")
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "video/mp2t");
    assert_eq!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");

    let mut body = response.into_body().into_data_stream();
    let first = tokio::time::timeout(Duration::from_secs(5), body.next())
        .await
        .expect("first packet relayed")
        .unwrap()
        .unwrap();
    assert_eq!(first[0], 0x47);
}

#[tokio::test]
async fn test_missing_content_type_defaults_to_octet_stream() {
    let upstream = spawn_upstream().await;
    let app = relay_app();

    let uri = relay_url("/api/proxy", &format!("http://{upstream}/raw"));
    let (status, headers, body) = get_relay(&app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"raw-bytes");
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "application/octet-stream"
    );
}

#[tokio::test]
async fn test_missing_url_parameter() {
    let app = relay_app();

    for uri in ["/api/proxy", "/api/proxy?url="] {
        let (status, _, body) = get_relay(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_message(&body), "Missing URL parameter");
    }
}

#[tokio::test]
async fn test_unparsable_url_is_bad_request() {
    let app = relay_app();
    let (status, _, body) = get_relay(&app, "/api/proxy?url=not%20a%20url").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).starts_with("Invalid URL"));
}

#[tokio::test]
async fn test_upstream_status_is_forwarded() {
    let upstream = spawn_upstream().await;
    let app = relay_app();

    let uri = relay_url("/api/proxy", &format!("http://{upstream}/missing"));
    let (status, headers, body) = get_relay(&app, &uri).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "Upstream error: 404 Not Found");
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
}

#[tokio::test]
async fn test_network_failure_is_500() {
    // Reserve a port, then free it so nothing is listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let app = relay_app();
    let uri = relay_url("/api/proxy", &format!("http://{addr}/live.m3u8"));
    let (status, _, body) = get_relay(&app, &uri).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_message(&body), "Failed to fetch stream");
}
