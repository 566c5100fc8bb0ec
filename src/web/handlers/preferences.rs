//! Favorites, recently viewed and settings handlers

use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde::Serialize;

use crate::catalog::queries;
use crate::models::{Channel, UserSettings, UserSettingsPatch};
use crate::web::responses::ok;
use crate::web::AppState;

#[derive(Debug, Serialize)]
struct PreferencesResponse<'a> {
    favorites: Vec<String>,
    recent_channels: Vec<String>,
    settings: UserSettings,
    /// Favorites resolved against the current catalog, unknown ids skipped
    favorite_channels: Vec<&'a Channel>,
    recent: Vec<&'a Channel>,
}

pub async fn get_preferences(State(state): State<AppState>) -> Response {
    let preferences = state.preferences.snapshot().await;
    let channels = state.catalog.channels().await;

    ok(PreferencesResponse {
        favorite_channels: queries::resolve_ids(&channels, &preferences.favorites),
        recent: queries::resolve_ids(&channels, &preferences.recent_channels),
        favorites: preferences.favorites,
        recent_channels: preferences.recent_channels,
        settings: preferences.settings,
    })
}

#[derive(Debug, Serialize)]
struct FavoriteToggled {
    channel_id: String,
    is_favorite: bool,
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Response {
    let is_favorite = state.preferences.toggle_favorite(&channel_id).await;
    ok(FavoriteToggled {
        channel_id,
        is_favorite,
    })
}

#[derive(Debug, Serialize)]
struct RecentChannels {
    recent_channels: Vec<String>,
}

pub async fn add_recent(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Response {
    let recent_channels = state.preferences.add_recent(&channel_id).await;
    ok(RecentChannels { recent_channels })
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(patch): Json<UserSettingsPatch>,
) -> Response {
    ok(state.preferences.update_settings(patch).await)
}
