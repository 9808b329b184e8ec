use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use crate::db::models::Post;
use crate::db::posts::{self, PostScope};
use crate::db::{follows, users};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::pagination::Page;
use crate::routes::home::Html;
use crate::routes::{found, PageParams};
use crate::state::AppState;

const FEED_URL: &str = "/follow/";

#[derive(Template)]
#[template(path = "posts/follow.html")]
pub struct FeedTemplate {
    pub viewer: Option<CurrentUser>,
    pub page: Page<Post>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(FEED_URL, get(follow_index))
        .route("/profile/{username}/follow/", get(profile_follow))
        .route("/profile/{username}/unfollow/", get(profile_unfollow))
}

/// GET /follow/
///
/// Posts by everyone the user follows, newest first.
async fn follow_index(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<PageParams>,
) -> AppResult<Html<FeedTemplate>> {
    let page = {
        let conn = state.db.get()?;
        posts::page_of_posts(
            &conn,
            PostScope::FollowedBy(user.id),
            state.config.posts.page_size,
            params.page.as_deref(),
        )?
    };

    Ok(Html(FeedTemplate {
        viewer: Some(user),
        page,
    }))
}

/// GET /profile/{username}/follow/
///
/// Following yourself is silently ignored.
async fn profile_follow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let author = users::find_by_username(&conn, &username)?.ok_or(AppError::NotFound)?;

    if follows::follow(&conn, user.id, author.id)? {
        tracing::info!(user = %user.username, author = %author.username, "Followed author");
    }
    Ok(found(FEED_URL))
}

/// GET /profile/{username}/unfollow/
async fn profile_unfollow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let author = users::find_by_username(&conn, &username)?.ok_or(AppError::NotFound)?;

    if follows::unfollow(&conn, user.id, author.id)? {
        tracing::info!(user = %user.username, author = %author.username, "Unfollowed author");
    }
    Ok(found(FEED_URL))
}
