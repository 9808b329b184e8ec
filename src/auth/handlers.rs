use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Form;
use serde::Deserialize;

use crate::auth::{safe_next, session};
use crate::db::users;
use crate::error::AppResult;
use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::found;
use crate::routes::home::Html;
use crate::state::AppState;

// -- Templates --

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub viewer: Option<CurrentUser>,
    pub next: String,
    pub username: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub viewer: Option<CurrentUser>,
    pub username: String,
    pub username_error: Option<String>,
    pub password_error: Option<String>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct NextParams {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub password1: String,
    pub password2: String,
}

const MIN_PASSWORD_LEN: usize = 8;

fn login_response(state: &AppState, user_id: i64, destination: &str) -> AppResult<Response> {
    let conn = state.db.get()?;
    let token = session::create_session(&conn, user_id, state.config.auth.session_hours)?;
    let cookie = session::session_cookie(
        &state.config.auth.cookie_name,
        &token,
        state.config.auth.session_hours,
    );
    Ok((AppendHeaders([(header::SET_COOKIE, cookie)]), found(destination)).into_response())
}

// -- Login --

/// GET /auth/login/
pub async fn login_page(
    MaybeUser(viewer): MaybeUser,
    Query(params): Query<NextParams>,
) -> Html<LoginTemplate> {
    Html(LoginTemplate {
        viewer,
        next: safe_next(params.next.as_deref()).to_string(),
        username: String::new(),
        error: None,
    })
}

/// POST /auth/login/
pub async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let username = form.username.trim().to_string();
    let next = safe_next(form.next.as_deref()).to_string();

    let user = {
        let conn = state.db.get()?;
        users::verify_password(&conn, &username, &form.password)?
    };

    match user {
        Some(user) => {
            tracing::info!(user_id = user.id, username = %user.username, "User logged in");
            login_response(&state, user.id, &next)
        }
        None => {
            tracing::info!(username = %username, "Failed login attempt");
            Ok(Html(LoginTemplate {
                viewer: None,
                next,
                username,
                error: Some(
                    "Please enter a correct username and password. Note that both fields may be case-sensitive."
                        .into(),
                ),
            })
            .into_response())
        }
    }
}

// -- Signup --

/// GET /auth/signup/
pub async fn signup_page(MaybeUser(viewer): MaybeUser) -> Html<SignupTemplate> {
    Html(SignupTemplate {
        viewer,
        username: String::new(),
        username_error: None,
        password_error: None,
    })
}

/// POST /auth/signup/
pub async fn signup_submit(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let username = form.username.trim().to_string();

    let mut username_error = users::validate_username(&username)
        .err()
        .map(str::to_string);
    let password_error = if form.password1 != form.password2 {
        Some("The two password fields didn't match.".to_string())
    } else if form.password1.chars().count() < MIN_PASSWORD_LEN {
        Some(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LEN} characters."
        ))
    } else {
        None
    };

    let conn = state.db.get()?;
    if username_error.is_none() && users::find_by_username(&conn, &username)?.is_some() {
        username_error = Some("A user with that username already exists.".to_string());
    }

    if username_error.is_some() || password_error.is_some() {
        return Ok(Html(SignupTemplate {
            viewer: None,
            username,
            username_error,
            password_error,
        })
        .into_response());
    }

    let user = users::create_user(
        &conn,
        &username,
        Some(&form.password1),
        false,
        state.config.auth.bcrypt_cost,
    )?;
    drop(conn);

    tracing::info!(user_id = user.id, username = %user.username, "User signed up");
    login_response(&state, user.id, "/")
}

// -- Logout --

/// GET or POST /auth/logout/
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie_name = &state.config.auth.cookie_name;
    if let Some(token) = session::cookie_value(&headers, cookie_name) {
        let conn = state.db.get()?;
        session::delete_session(&conn, token)?;
    }

    Ok((
        AppendHeaders([(header::SET_COOKIE, session::clear_session_cookie(cookie_name))]),
        found("/"),
    )
        .into_response())
}
