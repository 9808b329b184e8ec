use axum::extract::State;
use axum::response::Response;
use axum::routing::post;
use axum::Router;

use crate::extractors::CurrentUser;
use crate::routes::found;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/admin/cache/clear/", post(clear_cache))
}

/// POST /admin/cache/clear/
///
/// Drop every cached page so the next request
/// renders fresh. Non-admins are sent home without effect.
async fn clear_cache(State(state): State<AppState>, user: CurrentUser) -> Response {
    if !user.is_admin {
        tracing::warn!(user = %user.username, "Cache clear refused for non-admin");
        return found("/");
    }

    let dropped = state.page_cache.clear();
    tracing::info!(user = %user.username, dropped, "Page cache cleared");
    found("/")
}
