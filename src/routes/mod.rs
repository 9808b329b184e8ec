pub mod about;
pub mod admin;
pub mod assets;
pub mod errors;
pub mod follow;
pub mod home;
pub mod posts;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

/// `302 Found` to `location`; every successful mutation ends with one.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// `?page=` of listing pages, kept raw so garbage resolves to page one.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
}
