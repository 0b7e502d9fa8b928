use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use utoipa::ToSchema;

use parley_pipeline::{PipelineEvent, Submission, Transcript};

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub text: String,
    /// Continue this thread; a new one is created on the first non-empty message otherwise
    #[serde(default)]
    pub thread_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CancelResponse {
    pub cancelled: bool,
}

/// Submit a chat message and stream the pipeline events using Server-Sent Events
///
/// Each SSE event is named after the pipeline event type and carries the
/// event as JSON.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Streaming pipeline events", content_type = "text/event-stream"),
        (status = 404, description = "Thread not found"),
        (status = 409, description = "A reply is already streaming on this thread"),
        (status = 503, description = "Too many runs in flight")
    ),
    tag = "chat"
)]
pub async fn chat_stream(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let mut submission = Submission::new(req.text);

    if let Some(thread_id) = req.thread_id {
        // The display transcript is rebuilt from what the store already holds
        let messages = state.directory.list_messages(&thread_id, None).await?;
        let transcript = Transcript::from_messages(
            messages.iter().map(|m| (m.role.as_str(), m.content.as_str())),
        );
        submission = submission.on_thread(thread_id).with_transcript(transcript);
    }

    let handle = state.pipeline.submit(submission).await?;
    tracing::info!(
        run_id = %handle.run_id,
        thread_id = ?handle.thread_id,
        "Chat run submitted"
    );

    let sse_stream = handle.into_stream().map(|event| Ok::<Event, Infallible>(to_sse_event(&event)));

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::default()))
}

fn to_sse_event(event: &PipelineEvent) -> Event {
    Event::default()
        .event(event.name())
        .json_data(event)
        .unwrap_or_else(|e| {
            tracing::error!("Failed to encode {} event: {}", event.name(), e);
            Event::default()
                .event("error")
                .data(format!("failed to encode {} event", event.name()))
        })
}

/// Stop the reply currently streaming on a thread
#[utoipa::path(
    post,
    path = "/chat/{thread_id}/cancel",
    params(("thread_id" = String, Path, description = "Thread ID")),
    responses(
        (status = 200, description = "Whether a running reply was cancelled", body = CancelResponse)
    ),
    tag = "chat"
)]
pub async fn cancel_chat(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<CancelResponse>> {
    let cancelled = state.pipeline.cancel(&thread_id);
    Ok(Json(CancelResponse { cancelled }))
}

