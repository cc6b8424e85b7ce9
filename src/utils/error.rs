use crate::prelude::*;

/// Semantic app error, always the caller's fault.
#[derive(Debug)]
pub enum AppError {
    NotFound,
    Forbidden(&'static str),
    Invalid(String),
    TooLarge,
}

impl AppError {
    pub fn message(&self) -> &str {
        match self {
            AppError::NotFound => "Not found.",
            AppError::Forbidden(message) => message,
            AppError::Invalid(message) => message,
            AppError::TooLarge => "Request body too large",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Invalid(_) => StatusCode::BAD_REQUEST,
            AppError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        JsonError::App(self).into_response()
    }
}

/// API-only JSON handler return type.
/// Returns either T as JSON, or `{"success": false, "error": "message"}`.
pub type JsonResult<T> = Result<Json<T>, JsonError>;

#[derive(Debug)]
pub enum JsonError {
    App(AppError),
    Any(anyhow::Error),
}

impl From<AppError> for JsonError {
    fn from(e: AppError) -> Self {
        Self::App(e)
    }
}

impl From<anyhow::Error> for JsonError {
    fn from(e: anyhow::Error) -> Self {
        Self::Any(e)
    }
}

impl IntoResponse for JsonError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            JsonError::App(e) => (e.status(), e.message()),
            JsonError::Any(e) => {
                tracing::error!("{e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
            }
        };

        (status, Json(json!({"success": false, "error": message}))).into_response()
    }
}

// Helpers
pub fn not_found() -> AppError {
    AppError::NotFound
}

pub fn invalid(message: impl Into<String>) -> AppError {
    AppError::Invalid(message.into())
}
