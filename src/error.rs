use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::routes::errors::{not_found_page, server_error_page};
use crate::routes::found;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    /// Anonymous access to a page that needs a user; `next` is where to
    /// come back to after logging in.
    #[error("Login required for {next}")]
    LoginRequired { next: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Where anonymous visitors are sent, keeping the page they asked for.
pub fn login_url(next: &str) -> String {
    format!("/auth/login/?next={next}")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::NotFound => not_found_page(),
            AppError::LoginRequired { next } => found(&login_url(next)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()).into_response(),
            AppError::Multipart(e) => {
                tracing::warn!("Multipart error: {}", e);
                (e.status(), e.body_text()).into_response()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                server_error_page()
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                server_error_page()
            }
            AppError::Io(e) => {
                tracing::error!("I/O error: {}", e);
                server_error_page()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                server_error_page()
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
