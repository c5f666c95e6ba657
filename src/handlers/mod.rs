pub mod chat;
pub mod forms;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/chat/reply", post(chat::reply))
        .route("/api/chat/links", get(chat::links))
        .route("/api/chat/sessions", post(chat::create_session))
        .route(
            "/api/chat/sessions/:id",
            get(chat::get_session).delete(chat::delete_session),
        )
        .route("/api/chat/sessions/:id/messages", post(chat::post_message))
        .route("/api/chat/sessions/:id/open", post(chat::open_session))
        .route("/api/chat/sessions/:id/close", post(chat::close_session))
        .route("/api/chat/sessions/:id/events", get(chat::events_stream))
        .route("/api/contact", post(forms::contact))
        .route("/api/newsletter", post(forms::newsletter))
        .with_state(state)
}
