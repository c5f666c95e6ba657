use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::errors::AppError;
use crate::models::{ChatMessage, SessionView};
use crate::services::responder::Selection;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TextRequest {
    pub text: String,
}

// POST /api/chat/reply
pub async fn reply(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TextRequest>,
) -> Json<Selection> {
    let mut rng = state.sessions.randomness();
    Json(state.sessions.selector().select_response(&body.text, rng.as_mut()))
}

// POST /api/chat/sessions
pub async fn create_session(State(state): State<Arc<AppState>>) -> Response {
    (StatusCode::CREATED, Json(state.sessions.create())).into_response()
}

// GET /api/chat/sessions/:id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    state.sessions.view(&id).map(Json)
}

// POST /api/chat/sessions/:id/messages
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<TextRequest>,
) -> Result<Response, AppError> {
    if body.text.trim().is_empty() {
        return Err(AppError::Validation("message text is required".into()));
    }
    let view = state.sessions.submit(&id, &body.text)?;
    Ok((StatusCode::ACCEPTED, Json(view)).into_response())
}

// POST /api/chat/sessions/:id/open
pub async fn open_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    state.sessions.set_open(&id, true).map(Json)
}

// POST /api/chat/sessions/:id/close
pub async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    state.sessions.set_open(&id, false).map(Json)
}

// DELETE /api/chat/sessions/:id
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/chat/sessions/:id/events — SSE stream
#[derive(Deserialize)]
pub struct EventsQuery {
    /// Replay messages with a larger id before going live.
    pub after: Option<u64>,
}

fn message_event(message: &ChatMessage) -> Event {
    let data = serde_json::to_string(message).unwrap_or_default();
    Event::default()
        .data(data)
        .event("chat_message")
        .id(message.id.to_string())
}

pub async fn events_stream(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<EventsQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    // Subscribe first so nothing lands between the snapshot and going live
    let rx = state.sessions.subscribe();
    let snapshot = state.sessions.view(&id)?;

    let catchup: Vec<Event> = match query.after {
        Some(after) => snapshot
            .messages
            .iter()
            .filter(|m| m.id > after)
            .map(message_event)
            .collect(),
        None => Vec::new(),
    };
    let catchup_stream = tokio_stream::iter(catchup.into_iter().map(Ok::<_, Infallible>));

    let last_seen = snapshot.messages.last().map(|m| m.id).unwrap_or(0);
    let live_stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(event) if event.session_id == id && event.message.id > last_seen => {
            Some(Ok(message_event(&event.message)))
        }
        Ok(_) => None,
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(n)) => {
            tracing::warn!(skipped = n, "chat event stream lagged");
            None
        }
    });

    let keepalive_stream = tokio_stream::StreamExt::map(
        tokio_stream::wrappers::IntervalStream::new(tokio::time::interval(Duration::from_secs(30))),
        |_| Ok(Event::default().comment("keepalive")),
    );

    let combined = catchup_stream.chain(live_stream);
    let merged = StreamExt::merge(combined, keepalive_stream);

    Ok(Sse::new(merged))
}

// GET /api/chat/links
#[derive(Serialize)]
pub struct ContactLinks {
    pub whatsapp: String,
    pub email: String,
}

pub fn contact_links(whatsapp_number: &str, email: &str) -> ContactLinks {
    let digits: String = whatsapp_number
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    let greeting = "Hi! I'd like to know more about your digital marketing services.";
    ContactLinks {
        whatsapp: format!("https://wa.me/{digits}?text={}", urlencoding::encode(greeting)),
        email: format!(
            "mailto:{email}?subject={}",
            urlencoding::encode("Enquiry from website chat")
        ),
    }
}

pub async fn links(State(state): State<Arc<AppState>>) -> Json<ContactLinks> {
    Json(contact_links(
        &state.config.whatsapp_number,
        &state.config.contact_email,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_links() {
        let links = contact_links("+91 98765 43210", "hello@example.com");
        assert!(links.whatsapp.starts_with("https://wa.me/919876543210?text=Hi%21"));
        assert!(!links.whatsapp.contains(' '));
        assert_eq!(
            links.email,
            "mailto:hello@example.com?subject=Enquiry%20from%20website%20chat"
        );
    }
}
