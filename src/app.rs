use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::handlers;
use crate::routes;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes();

    Router::new()
        .route("/", get(routes::home::index))
        .route("/static/{*path}", get(routes::assets::serve))
        .route("/media/{*path}", get(routes::assets::serve_media))
        .route(
            "/auth/login/",
            get(handlers::login_page).post(handlers::login_submit),
        )
        .route(
            "/auth/signup/",
            get(handlers::signup_page).post(handlers::signup_submit),
        )
        .route(
            "/auth/logout/",
            get(handlers::logout).post(handlers::logout),
        )
        .merge(routes::posts::router())
        .merge(routes::follow::router())
        .merge(routes::about::router())
        .merge(routes::admin::router())
        .fallback(routes::errors::fallback)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::errors::not_found_with_viewer,
        ))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
