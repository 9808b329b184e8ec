use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::cache;
use crate::db::models::Post;
use crate::db::posts::{self, PostScope};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::pagination::Page;
use crate::routes::PageParams;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "posts/index.html")]
pub struct IndexTemplate {
    pub viewer: Option<CurrentUser>,
    pub page: Page<Post>,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

fn cached_html(body: Bytes, max_age_secs: u64) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CACHE_CONTROL, format!("max-age={max_age_secs}")),
        ],
        body,
    )
        .into_response()
}

/// GET /
///
/// Every post, newest first. The rendered page is cached for the
/// configured TTL under a key that ignores `?page=`.
pub async fn index(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(params): Query<PageParams>,
) -> AppResult<Response> {
    let max_age = state.page_cache.ttl().as_secs();
    let key = cache::index_key(viewer.id());
    if let Some(body) = state.page_cache.get(&key) {
        tracing::debug!(key = %key, "Serving home page from cache");
        return Ok(cached_html(body, max_age));
    }

    let page = {
        let conn = state.db.get()?;
        posts::page_of_posts(
            &conn,
            PostScope::All,
            state.config.posts.page_size,
            params.page.as_deref(),
        )?
    };

    let rendered = IndexTemplate {
        viewer: viewer.0,
        page,
    }
    .render()
    .map_err(|e| AppError::Internal(format!("Template render error: {e}")))?;

    let body = Bytes::from(rendered);
    state.page_cache.insert(key, body.clone());
    Ok(cached_html(body, max_age))
}
