use askama::Template;
use axum::extract::{Request, State};
use axum::http::{StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::auth::session;
use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::routes::home::Html;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "core/404.html")]
pub struct NotFoundTemplate {
    pub viewer: Option<CurrentUser>,
    pub path: String,
}

#[derive(Template)]
#[template(path = "core/500.html")]
pub struct ServerErrorTemplate {
    pub viewer: Option<CurrentUser>,
}

/// Marks a 404 rendered without request context; `not_found_with_viewer`
/// renders it again for the actual viewer and path.
#[derive(Debug, Clone, Copy)]
struct BareNotFound;

fn render_not_found(viewer: Option<CurrentUser>, path: String) -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(NotFoundTemplate { viewer, path }),
    )
        .into_response()
}

pub fn not_found_page() -> Response {
    let mut response = render_not_found(None, String::new());
    response.extensions_mut().insert(BareNotFound);
    response
}

pub fn server_error_page() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(ServerErrorTemplate { viewer: None }),
    )
        .into_response()
}

/// Router fallback for every unmatched path.
pub async fn fallback(uri: Uri) -> Response {
    tracing::debug!(path = %uri.path(), "No route matched");
    not_found_page()
}

/// Middleware giving every 404 page the viewer's navigation and the
/// requested path, whether it came from the fallback or a failed lookup.
pub async fn not_found_with_viewer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let token = session::cookie_value(request.headers(), &state.config.auth.cookie_name)
        .map(str::to_string);

    let response = next.run(request).await;
    if response.extensions().get::<BareNotFound>().is_none() {
        return response;
    }

    let viewer = token.and_then(|token| viewer_for_token(&state, &token));
    render_not_found(viewer, path)
}

/// Best effort: a failed lookup still yields a 404 page, just anonymous.
fn viewer_for_token(state: &AppState, token: &str) -> Option<CurrentUser> {
    let lookup = state
        .db
        .get()
        .map_err(AppError::from)
        .and_then(|conn| session::user_for_token(&conn, token));
    match lookup {
        Ok(viewer) => viewer,
        Err(e) => {
            tracing::warn!("Viewer lookup for 404 page failed: {}", e);
            None
        }
    }
}
