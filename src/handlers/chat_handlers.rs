use crate::error::AppResult;
use crate::middleware::UserId;
use crate::models::TurnRequest;
use crate::services::ChatService;
use actix_web::{HttpResponse, get, post, web};
use log::info;
use uuid::Uuid;

/// Streaming chat turn. Admission failures (bad model, exhausted tokens,
/// missing credentials) abort with an HTTP status before any bytes are
/// streamed; afterwards the SSE stream itself carries errors.
#[post("/chat/stream")]
pub async fn stream_chat_turn(
    user: UserId,
    body: web::Json<TurnRequest>,
    chat_service: web::Data<ChatService>,
) -> AppResult<HttpResponse> {
    let request = body.into_inner();
    info!(
        "Chat turn for user {} (chat {}, model {})",
        user.0, request.chat_id, request.model
    );

    let stream = chat_service.handle_turn(user.0, request).await?;

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(stream))
}

#[get("/chats/{chat_id}/messages")]
pub async fn get_chat_messages(
    user: UserId,
    path: web::Path<Uuid>,
    chat_service: web::Data<ChatService>,
) -> AppResult<HttpResponse> {
    let chat_id = path.into_inner();
    let messages = chat_service.list_messages(&user.0, &chat_id).await?;
    Ok(HttpResponse::Ok().json(messages))
}
