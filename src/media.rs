//! Storage for uploaded post images under the media root.

use std::path::{Component, Path, PathBuf};

use crate::error::AppResult;
use crate::forms::UploadedFile;

/// Subdirectory of the media root holding post images.
pub const POSTS_DIR: &str = "posts";

/// Keep the last path component and only filename-safe characters.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

fn with_suffix(name: &str, suffix: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{suffix}.{ext}"),
        _ => format!("{name}_{suffix}"),
    }
}

/// Write an uploaded image and return its path relative to the media root,
/// e.g. `posts/small.gif`. A taken name gets a short random suffix.
pub async fn save_post_image(media_root: &Path, upload: &UploadedFile) -> AppResult<String> {
    let dir = media_root.join(POSTS_DIR);
    tokio::fs::create_dir_all(&dir).await?;

    let mut name = sanitize_file_name(&upload.file_name);
    if tokio::fs::try_exists(dir.join(&name)).await? {
        let id = uuid::Uuid::now_v7().simple().to_string();
        name = with_suffix(&name, &id[id.len() - 7..]);
    }

    tokio::fs::write(dir.join(&name), &upload.data).await?;
    let relative = format!("{POSTS_DIR}/{name}");
    tracing::info!(path = %relative, bytes = upload.data.len(), "Stored uploaded image");
    Ok(relative)
}

/// Map a request path onto a file below the media root. Anything that could
/// climb out of it resolves to `None`.
pub fn resolve(media_root: &Path, requested: &str) -> Option<PathBuf> {
    let relative = Path::new(requested);
    if requested.is_empty()
        || relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(media_root.join(relative))
}
