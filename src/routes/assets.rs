use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use rust_embed::Embed;

use crate::error::{AppError, AppResult};
use crate::media;
use crate::state::AppState;

#[derive(Embed)]
#[folder = "assets/"]
struct Assets;

/// GET /static/{*path}
pub async fn serve(Path(path): Path<String>) -> Response {
    match Assets::get(&path) {
        Some(file) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, mime.as_ref().to_string()),
                    (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
                ],
                file.data.to_vec(),
            )
                .into_response()
        }
        None => AppError::NotFound.into_response(),
    }
}

/// GET /media/{*path}, serving uploaded images.
pub async fn serve_media(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> AppResult<Response> {
    let file = media::resolve(&state.config.media_path(), &path).ok_or(AppError::NotFound)?;
    let data = match tokio::fs::read(&file).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(AppError::NotFound),
        Err(e) => return Err(e.into()),
    };

    let mime = mime_guess::from_path(&file).first_or_octet_stream();
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, mime.as_ref().to_string())],
        data,
    )
        .into_response())
}
