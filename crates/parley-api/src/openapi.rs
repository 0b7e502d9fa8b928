use utoipa::OpenApi;

use crate::{handlers::stream, routes};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Parley API",
        description = "Chat threads with streamed replies"
    ),
    paths(
        routes::health::health_check,
        routes::threads::create_thread,
        routes::threads::list_threads,
        routes::threads::get_thread,
        routes::threads::rename_thread,
        routes::threads::archive_thread,
        routes::threads::delete_thread,
        routes::messages::list_messages,
        routes::settings::get_settings,
        routes::settings::update_settings,
        stream::chat_stream,
        stream::cancel_chat,
    ),
    components(schemas(
        routes::health::HealthResponse,
        routes::threads::CreateThreadRequest,
        routes::threads::RenameThreadRequest,
        routes::threads::ThreadResponse,
        routes::threads::ThreadListingResponse,
        routes::threads::ListThreadsResponse,
        routes::messages::MessageResponse,
        routes::messages::ListMessagesResponse,
        routes::settings::SettingsResponse,
        routes::settings::UpdateSettingsRequest,
        stream::ChatRequest,
        stream::CancelResponse,
    )),
    tags(
        (name = "health", description = "Service status"),
        (name = "threads", description = "Thread management"),
        (name = "messages", description = "Stored messages"),
        (name = "chat", description = "Streaming chat pipeline"),
        (name = "settings", description = "Display settings"),
    )
)]
pub struct ApiDoc;
