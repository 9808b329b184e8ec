use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::session;
use crate::db::models::username_segment;
use crate::error::AppError;
use crate::state::AppState;

/// Represents the currently authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

impl CurrentUser {
    pub fn url_name(&self) -> String {
        username_segment(&self.username)
    }
}

/// Extractor that requires authentication.
/// Anonymous requests are redirected to the login page, which sends the
/// visitor back to the original path afterwards.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let login_required = || AppError::LoginRequired {
            next: parts.uri.path().to_string(),
        };

        let token = session::cookie_value(&parts.headers, &state.config.auth.cookie_name)
            .ok_or_else(login_required)?;

        let conn = state.db.get()?;
        session::user_for_token(&conn, token)?.ok_or_else(login_required)
    }
}

/// Optional user extractor: `None` instead of a login redirect.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(AppError::LoginRequired { .. }) => Ok(MaybeUser(None)),
            Err(e) => Err(e),
        }
    }
}

impl MaybeUser {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }
}
