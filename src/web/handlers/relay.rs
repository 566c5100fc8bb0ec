//! Relay endpoint
//!
//! Fetches a stream resource server-side and hands it back with permissive
//! CORS, for origins that refuse direct browser access. Errors are returned
//! as a bare `{"error": ...}` body rather than the API envelope.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{
        header::{ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE},
        StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::errors::RelayError;
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct RelayQuery {
    pub url: Option<String>,
}

pub async fn relay_stream(
    State(state): State<AppState>,
    Query(query): Query<RelayQuery>,
) -> Response {
    let target = query.url.unwrap_or_default();

    let relayed = match state.resolver.fetch(&target).await {
        Ok(relayed) => relayed,
        Err(e) => return relay_error(e),
    };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, relayed.content_type)
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(CACHE_CONTROL, state.resolver.cache_control());
    if let Some(length) = relayed.content_length {
        builder = builder.header(CONTENT_LENGTH, length);
    }

    match builder.body(Body::from_stream(relayed.body)) {
        Ok(response) => response,
        Err(e) => relay_error(RelayError::Network {
            message: e.to_string(),
        }),
    }
}

fn relay_error(error: RelayError) -> Response {
    let status = StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
    (
        status,
        [(ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(json!({ "error": error.public_message() })),
    )
        .into_response()
}
