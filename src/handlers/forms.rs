use axum::Json;

use crate::errors::AppError;
use crate::models::{ContactForm, NewsletterSignup};
use crate::services::forms;

// POST /api/contact
pub async fn contact(Json(form): Json<ContactForm>) -> Result<Json<serde_json::Value>, AppError> {
    forms::submit_contact(&form)?;
    Ok(Json(serde_json::json!({
        "ok": true,
        "message": "Thanks for reaching out! Our team will get back to you within 24 hours."
    })))
}

// POST /api/newsletter
pub async fn newsletter(
    Json(signup): Json<NewsletterSignup>,
) -> Result<Json<serde_json::Value>, AppError> {
    forms::submit_newsletter(&signup)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
