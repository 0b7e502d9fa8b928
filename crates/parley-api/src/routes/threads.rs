use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use parley_persist::Thread;
use parley_types::ThreadListing;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

const DEFAULT_LIST_LIMIT: usize = 20;
const MAX_LIST_LIMIT: usize = 100;

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateThreadRequest {
    /// Placeholder title is used when absent or blank
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RenameThreadRequest {
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ThreadResponse {
    pub thread_id: String,
    pub title: String,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl From<Thread> for ThreadResponse {
    fn from(thread: Thread) -> Self {
        Self {
            thread_id: thread.id,
            title: thread.title,
            archived: thread.archived,
            created_at: thread.created_at,
            last_activity_at: thread.last_activity_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ThreadListingResponse {
    pub thread_id: String,
    pub title: String,
    pub archived: bool,
    pub has_messages: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub last_activity_at: DateTime<Utc>,
}

impl From<ThreadListing> for ThreadListingResponse {
    fn from(listing: ThreadListing) -> Self {
        Self {
            thread_id: listing.id,
            title: listing.title,
            archived: listing.archived,
            has_messages: listing.has_messages,
            summary: listing.summary,
            last_activity_at: listing.last_activity_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListThreadsResponse {
    pub threads: Vec<ThreadListingResponse>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListThreadsQuery {
    pub limit: Option<usize>,
    #[serde(default)]
    pub include_archived: bool,
}

/// Create a new thread
#[utoipa::path(
    post,
    path = "/threads",
    request_body = CreateThreadRequest,
    responses(
        (status = 201, description = "Thread created", body = ThreadResponse)
    ),
    tag = "threads"
)]
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    body: Option<Json<CreateThreadRequest>>,
) -> ApiResult<(StatusCode, Json<ThreadResponse>)> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let thread = state.directory.create_thread(req.title.as_deref()).await?;

    tracing::info!(thread_id = %thread.id, "Thread created");
    Ok((StatusCode::CREATED, Json(thread.into())))
}

/// List recent threads, most recently active first
#[utoipa::path(
    get,
    path = "/threads",
    params(ListThreadsQuery),
    responses(
        (status = 200, description = "Thread listing", body = ListThreadsResponse)
    ),
    tag = "threads"
)]
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListThreadsQuery>,
) -> ApiResult<Json<ListThreadsResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
    let listings = state.directory.list_recent(limit, query.include_archived).await?;

    Ok(Json(ListThreadsResponse {
        threads: listings.into_iter().map(Into::into).collect(),
    }))
}

/// Get a thread by ID
#[utoipa::path(
    get,
    path = "/threads/{thread_id}",
    params(("thread_id" = String, Path, description = "Thread ID")),
    responses(
        (status = 200, description = "Thread found", body = ThreadResponse),
        (status = 404, description = "Thread not found")
    ),
    tag = "threads"
)]
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ThreadResponse>> {
    let thread = state.directory.get_thread(&thread_id).await?;
    Ok(Json(thread.into()))
}

/// Rename a thread
#[utoipa::path(
    patch,
    path = "/threads/{thread_id}",
    params(("thread_id" = String, Path, description = "Thread ID")),
    request_body = RenameThreadRequest,
    responses(
        (status = 200, description = "Thread renamed", body = ThreadResponse),
        (status = 400, description = "Blank title"),
        (status = 404, description = "Thread not found")
    ),
    tag = "threads"
)]
pub async fn rename_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    Json(req): Json<RenameThreadRequest>,
) -> ApiResult<Json<ThreadResponse>> {
    let thread = state.directory.rename_thread(&thread_id, &req.title).await?;
    Ok(Json(thread.into()))
}

/// Archive a thread (hidden from the default listing, messages kept)
#[utoipa::path(
    post,
    path = "/threads/{thread_id}/archive",
    params(("thread_id" = String, Path, description = "Thread ID")),
    responses(
        (status = 200, description = "Thread archived", body = ThreadResponse),
        (status = 404, description = "Thread not found")
    ),
    tag = "threads"
)]
pub async fn archive_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ThreadResponse>> {
    let thread = state.directory.archive_thread(&thread_id).await?;
    Ok(Json(thread.into()))
}

/// Purge a thread and its messages
#[utoipa::path(
    delete,
    path = "/threads/{thread_id}",
    params(("thread_id" = String, Path, description = "Thread ID")),
    responses(
        (status = 204, description = "Thread deleted"),
        (status = 404, description = "Thread not found")
    ),
    tag = "threads"
)]
pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.pipeline.cancel(&thread_id) {
        tracing::info!(thread_id = %thread_id, "Cancelled running generation before purge");
    }

    if state.directory.delete_thread(&thread_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::ThreadNotFound(thread_id))
    }
}
