use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::Category;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("knowledge base error: {0}")]
    KnowledgeBase(#[from] KnowledgeBaseError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    Validation(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::KnowledgeBase(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

/// Problems with a reply table, caught before the selector is built.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeBaseError {
    #[error("failed to parse knowledge base: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no responses defined for category `{0}`")]
    MissingResponses(Category),

    #[error("category `{0}` has an empty response list")]
    EmptyResponses(Category),

    #[error("category `{0}` contains a blank response")]
    BlankResponse(Category),

    #[error("the `default` rule must be present and last")]
    DefaultNotLast,

    #[error("the `default` rule must not have triggers")]
    DefaultHasTriggers,

    #[error("rule for `{0}` has no triggers")]
    NoTriggers(Category),

    #[error("duplicate rule for `{0}`")]
    DuplicateRule(Category),

    #[error("rule for `{0}` has an empty trigger")]
    EmptyTrigger(Category),

    #[error("trigger `{trigger}` for `{category}` is not lower-case")]
    UppercaseTrigger { category: Category, trigger: String },

    #[error("nudge message is empty")]
    EmptyNudge,
}
