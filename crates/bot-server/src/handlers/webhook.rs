use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use bot_clients::Update;

use crate::state::AppState;

/// Accepts one Telegram update and queues it on its chat's mailbox.
/// Responds as soon as the update is queued.
pub async fn handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
    body: web::Bytes,
) -> impl Responder {
    if path.into_inner() != state.bot_token {
        return HttpResponse::NotFound().finish();
    }
    if req.content_type() != "application/json" {
        return HttpResponse::UnsupportedMediaType().body("Unsupported Media Type");
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            log::warn!("Rejecting malformed update: {}", e);
            return HttpResponse::BadRequest().body(format!("Invalid update: {}", e));
        }
    };

    let update_id = update.update_id;
    match update.into_event() {
        Some(event) => {
            log::debug!("[{}] Queued update {}", event.chat, update_id);
            state.dispatcher.submit(event);
        }
        None => log::debug!("Ignoring update {}", update_id),
    }
    HttpResponse::Ok().body("!")
}
