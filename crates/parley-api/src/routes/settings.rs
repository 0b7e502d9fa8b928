use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use parley_types::{AppSettings, SettingsPatch};

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SettingsResponse {
    pub show_thread_sidebar: bool,
    pub show_threads_tab: bool,
    /// True when either surface shows the thread list
    pub listing_visible: bool,
}

impl From<AppSettings> for SettingsResponse {
    fn from(settings: AppSettings) -> Self {
        Self {
            show_thread_sidebar: settings.show_thread_sidebar,
            show_threads_tab: settings.show_threads_tab,
            listing_visible: settings.listing_visible(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    #[serde(default)]
    pub show_thread_sidebar: Option<bool>,
    #[serde(default)]
    pub show_threads_tab: Option<bool>,
}

impl From<UpdateSettingsRequest> for SettingsPatch {
    fn from(req: UpdateSettingsRequest) -> Self {
        Self {
            show_thread_sidebar: req.show_thread_sidebar,
            show_threads_tab: req.show_threads_tab,
        }
    }
}

/// Current display settings
#[utoipa::path(
    get,
    path = "/settings",
    responses(
        (status = 200, description = "Current settings", body = SettingsResponse)
    ),
    tag = "settings"
)]
pub async fn get_settings(State(state): State<Arc<AppState>>) -> ApiResult<Json<SettingsResponse>> {
    Ok(Json(state.settings.get().await.into()))
}

/// Update display settings; absent fields keep their value
#[utoipa::path(
    put,
    path = "/settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Updated settings", body = SettingsResponse)
    ),
    tag = "settings"
)]
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateSettingsRequest>,
) -> ApiResult<Json<SettingsResponse>> {
    let settings = state.settings.update(req.into()).await;
    Ok(Json(settings.into()))
}
