//! Catalog and channel query handlers

use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::queries::{
    self, DEFAULT_FEATURED_LIMIT, DEFAULT_PER_CATEGORY, DEFAULT_RELATED_LIMIT,
};
use crate::errors::AppError;
use crate::models::{Category, Channel};
use crate::web::responses::{handle_error, handle_result, ok};
use crate::web::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub language: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
struct CatalogResponse<'a> {
    channels: Vec<&'a Channel>,
    total: usize,
    languages: Vec<&'a str>,
    is_loading: bool,
    error: Option<String>,
    refreshed_at: Option<DateTime<Utc>>,
}

/// Current catalog, optionally narrowed by language and category
pub async fn get_catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Response {
    let category = match query.category.as_deref() {
        Some(raw) => match raw.parse::<Category>() {
            Ok(category) => category,
            Err(e) => return handle_error(AppError::validation(e)),
        },
        None => Category::All,
    };

    let snapshot = state.catalog.snapshot().await;
    let channels = queries::filter(&snapshot.channels, query.language.as_deref(), category);

    ok(CatalogResponse {
        total: snapshot.channels.len(),
        languages: queries::languages(&snapshot.channels),
        channels,
        is_loading: snapshot.is_loading,
        error: snapshot.error.clone(),
        refreshed_at: snapshot.refreshed_at,
    })
}

/// Rebuild the catalog from its sources and report the outcome
pub async fn refresh_catalog(State(state): State<AppState>) -> Response {
    info!("Catalog refresh requested");
    let outcome = state.catalog.refresh().await;
    ok(outcome)
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

pub async fn search_channels(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let channels = state.catalog.channels().await;
    ok(queries::search(&channels, query.q.as_deref().unwrap_or("")))
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// Randomized hero selection
pub async fn featured_channels(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Response {
    let channels = state.catalog.channels().await;
    let limit = query.limit.unwrap_or(DEFAULT_FEATURED_LIMIT);
    let featured = queries::featured(&channels, &mut rand::rng(), limit);
    ok(featured)
}

pub async fn get_channel(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let channels = state.catalog.channels().await;
    let channel = queries::find(&channels, &id).ok_or_else(|| AppError::not_found("Channel", &id));
    handle_result(channel)
}

pub async fn related_channels(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Response {
    let channels = state.catalog.channels().await;
    if queries::find(&channels, &id).is_none() {
        return handle_error(AppError::not_found("Channel", id));
    }

    let limit = query.limit.unwrap_or(DEFAULT_RELATED_LIMIT);
    ok(queries::related(&channels, &id, limit))
}

#[derive(Debug, Deserialize)]
pub struct GroupedQuery {
    pub per_category: Option<usize>,
}

#[derive(Debug, Serialize)]
struct CategoryGroup<'a> {
    category: Category,
    channels: Vec<&'a Channel>,
}

/// Channels grouped per category for browse rows
pub async fn grouped_channels(
    State(state): State<AppState>,
    Query(query): Query<GroupedQuery>,
) -> Response {
    let channels = state.catalog.channels().await;
    let per_category = query.per_category.unwrap_or(DEFAULT_PER_CATEGORY);

    let groups: Vec<CategoryGroup> = queries::by_category(&channels, per_category)
        .into_iter()
        .map(|(category, channels)| CategoryGroup { category, channels })
        .collect();
    ok(groups)
}
