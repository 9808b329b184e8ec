use askama::Template;
use axum::extract::{Multipart, Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};

use crate::db::models::{Comment, Group, Post, User};
use crate::db::posts::{self, NewPost, PostChanges, PostScope};
use crate::db::{comments, follows, groups, users};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::forms::{CommentForm, PostForm, PostFormErrors};
use crate::media;
use crate::pagination::Page;
use crate::routes::home::Html;
use crate::routes::{found, PageParams};
use crate::state::AppState;

// --- Templates ---

#[derive(Template)]
#[template(path = "posts/group_list.html")]
pub struct GroupTemplate {
    pub viewer: Option<CurrentUser>,
    pub group: Group,
    pub page: Page<Post>,
}

#[derive(Template)]
#[template(path = "posts/profile.html")]
pub struct ProfileTemplate {
    pub viewer: Option<CurrentUser>,
    pub author: User,
    pub page: Page<Post>,
    pub posts_count: usize,
    pub followers_count: i64,
    pub following_count: i64,
    pub following: bool,
    pub can_follow: bool,
}

#[derive(Template)]
#[template(path = "posts/post_detail.html")]
pub struct PostDetailTemplate {
    pub viewer: Option<CurrentUser>,
    pub post: Post,
    pub posts_count: usize,
    pub comments: Vec<Comment>,
    pub can_edit: bool,
    pub comment_text: String,
    pub comment_error: Option<String>,
}

pub struct GroupOption {
    pub id: i64,
    pub title: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "posts/create_post.html")]
pub struct PostFormTemplate {
    pub viewer: Option<CurrentUser>,
    pub is_edit: bool,
    pub post_id: i64,
    pub text: String,
    pub groups: Vec<GroupOption>,
    pub current_image: Option<String>,
    pub errors: PostFormErrors,
}

impl PostFormTemplate {
    fn new(viewer: CurrentUser, all_groups: Vec<Group>, form: &PostForm) -> Self {
        let selected = form.group_id();
        let groups = all_groups
            .into_iter()
            .map(|g| GroupOption {
                selected: Some(g.id) == selected,
                id: g.id,
                title: g.title,
            })
            .collect();
        Self {
            viewer: Some(viewer),
            is_edit: false,
            post_id: 0,
            text: form.text.clone(),
            groups,
            current_image: None,
            errors: PostFormErrors::default(),
        }
    }

    fn editing(mut self, post: &Post) -> Self {
        self.is_edit = true;
        self.post_id = post.id;
        self.current_image = post.image.clone();
        self
    }

    fn with_errors(mut self, errors: PostFormErrors) -> Self {
        self.errors = errors;
        self
    }
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/group/{slug}/", get(group_posts))
        .route("/profile/{username}/", get(profile))
        .route("/posts/{post_id}/", get(post_detail))
        .route("/create/", get(post_create_page).post(post_create))
        .route("/posts/{post_id}/edit/", get(post_edit_page).post(post_edit))
        .route("/posts/{post_id}/comment/", post(add_comment))
}

/// Path ids that are not integers name no post.
fn parse_id(raw: &str) -> AppResult<i64> {
    raw.parse().map_err(|_| AppError::NotFound)
}

fn load_post(state: &AppState, raw_id: &str) -> AppResult<Post> {
    let id = parse_id(raw_id)?;
    let conn = state.db.get()?;
    posts::find_post(&conn, id)?.ok_or(AppError::NotFound)
}

// --- Read-only pages ---

/// GET /group/{slug}/
async fn group_posts(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
) -> AppResult<Html<GroupTemplate>> {
    let conn = state.db.get()?;
    let group = groups::find_by_slug(&conn, &slug)?.ok_or(AppError::NotFound)?;
    let page = posts::page_of_posts(
        &conn,
        PostScope::Group(group.id),
        state.config.posts.page_size,
        params.page.as_deref(),
    )?;

    Ok(Html(GroupTemplate {
        viewer,
        group,
        page,
    }))
}

/// GET /profile/{username}/
async fn profile(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(username): Path<String>,
    Query(params): Query<PageParams>,
) -> AppResult<Html<ProfileTemplate>> {
    let conn = state.db.get()?;
    let author = users::find_by_username(&conn, &username)?.ok_or(AppError::NotFound)?;
    let page = posts::page_of_posts(
        &conn,
        PostScope::Author(author.id),
        state.config.posts.page_size,
        params.page.as_deref(),
    )?;

    let (following, can_follow) = match &viewer {
        Some(user) if user.id != author.id => {
            (follows::is_following(&conn, user.id, author.id)?, true)
        }
        _ => (false, false),
    };

    Ok(Html(ProfileTemplate {
        posts_count: page.total,
        followers_count: follows::count_followers(&conn, author.id)?,
        following_count: follows::count_following(&conn, author.id)?,
        viewer,
        author,
        page,
        following,
        can_follow,
    }))
}

fn render_post_detail(
    state: &AppState,
    viewer: Option<CurrentUser>,
    post: Post,
    comment_text: String,
    comment_error: Option<String>,
) -> AppResult<Html<PostDetailTemplate>> {
    let conn = state.db.get()?;
    let posts_count = posts::count_by_author(&conn, post.author.id)?;
    let comments = comments::list_for_post(&conn, post.id)?;
    let can_edit = viewer.as_ref().is_some_and(|u| u.id == post.author.id);

    Ok(Html(PostDetailTemplate {
        viewer,
        post,
        posts_count,
        comments,
        can_edit,
        comment_text,
        comment_error,
    }))
}

/// GET /posts/{post_id}/
async fn post_detail(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(post_id): Path<String>,
) -> AppResult<Html<PostDetailTemplate>> {
    let post = load_post(&state, &post_id)?;
    render_post_detail(&state, viewer, post, String::new(), None)
}

// --- Create ---

/// GET /create/
async fn post_create_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<PostFormTemplate>> {
    let all_groups = {
        let conn = state.db.get()?;
        groups::list_groups(&conn)?
    };
    Ok(Html(PostFormTemplate::new(user, all_groups, &PostForm::default())))
}

/// POST /create/
async fn post_create(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let form = PostForm::from_multipart(&mut multipart).await?;
    let all_groups = {
        let conn = state.db.get()?;
        groups::list_groups(&conn)?
    };

    let valid = match form.validate(&all_groups) {
        Ok(valid) => valid,
        Err(errors) => {
            return Ok(
                Html(PostFormTemplate::new(user, all_groups, &form).with_errors(errors))
                    .into_response(),
            )
        }
    };

    let image = match &valid.image {
        Some(upload) => Some(media::save_post_image(&state.config.media_path(), upload).await?),
        None => None,
    };

    let post_id = {
        let conn = state.db.get()?;
        posts::insert_post(
            &conn,
            &NewPost {
                author_id: user.id,
                text: valid.text,
                group_id: valid.group_id,
                image,
            },
        )?
    };

    tracing::info!(post_id, author = %user.username, "Post created");
    Ok(found(&format!("/profile/{}/", user.url_name())))
}

// --- Edit ---

/// GET /posts/{post_id}/edit/
async fn post_edit_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    let post = load_post(&state, &post_id)?;
    if post.author.id != user.id {
        return Ok(found(&format!("/posts/{}/", post.id)));
    }

    let all_groups = {
        let conn = state.db.get()?;
        groups::list_groups(&conn)?
    };
    let form = PostForm {
        text: post.text.clone(),
        group: post
            .group
            .as_ref()
            .map(|g| g.id.to_string())
            .unwrap_or_default(),
        ..PostForm::default()
    };

    Ok(Html(PostFormTemplate::new(user, all_groups, &form).editing(&post)).into_response())
}

/// POST /posts/{post_id}/edit/
///
/// Only the author may edit. Anyone else is
/// sent back to the read-only page with the record untouched.
async fn post_edit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let post = load_post(&state, &post_id)?;
    let detail_url = format!("/posts/{}/", post.id);
    if post.author.id != user.id {
        tracing::info!(post_id = post.id, user = %user.username, "Edit refused for non-author");
        return Ok(found(&detail_url));
    }

    let form = PostForm::from_multipart(&mut multipart).await?;
    let all_groups = {
        let conn = state.db.get()?;
        groups::list_groups(&conn)?
    };

    let valid = match form.validate(&all_groups) {
        Ok(valid) => valid,
        Err(errors) => {
            return Ok(Html(
                PostFormTemplate::new(user, all_groups, &form)
                    .editing(&post)
                    .with_errors(errors),
            )
            .into_response())
        }
    };

    let image = match (&valid.image, valid.clear_image) {
        (Some(upload), _) => {
            Some(media::save_post_image(&state.config.media_path(), upload).await?)
        }
        (None, true) => None,
        (None, false) => post.image.clone(),
    };

    {
        let conn = state.db.get()?;
        posts::update_post(
            &conn,
            post.id,
            &PostChanges {
                text: valid.text,
                group_id: valid.group_id,
                image,
            },
        )?;
    }

    tracing::info!(post_id = post.id, author = %user.username, "Post edited");
    Ok(found(&detail_url))
}

// --- Comments ---

/// POST /posts/{post_id}/comment/
async fn add_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let post = load_post(&state, &post_id)?;

    let text = match form.validate() {
        Ok(text) => text,
        Err(error) => {
            return Ok(
                render_post_detail(&state, Some(user), post, form.text, Some(error))?
                    .into_response(),
            )
        }
    };

    let comment_id = {
        let conn = state.db.get()?;
        comments::insert_comment(&conn, post.id, user.id, &text)?
    };

    tracing::info!(comment_id, post_id = post.id, author = %user.username, "Comment added");
    Ok(found(&format!("/posts/{}/", post.id)))
}
