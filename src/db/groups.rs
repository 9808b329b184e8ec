use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::Group;
use crate::error::{AppError, AppResult};

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
    })
}

/// Slugs are ASCII letters, digits, hyphens and underscores.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn create_group(
    conn: &Connection,
    title: &str,
    slug: &str,
    description: &str,
) -> AppResult<Group> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 200 {
        return Err(AppError::BadRequest(
            "Group title must be between 1 and 200 characters".into(),
        ));
    }
    if !is_valid_slug(slug) {
        return Err(AppError::BadRequest(format!("Invalid slug: {slug:?}")));
    }
    if find_by_slug(conn, slug)?.is_some() {
        return Err(AppError::BadRequest(format!(
            "A group with slug {slug:?} already exists"
        )));
    }

    conn.execute(
        "INSERT INTO post_groups (title, slug, description) VALUES (?1, ?2, ?3)",
        params![title, slug, description],
    )?;
    Ok(Group {
        id: conn.last_insert_rowid(),
        title: title.to_string(),
        slug: slug.to_string(),
        description: description.to_string(),
    })
}

pub fn find_by_slug(conn: &Connection, slug: &str) -> AppResult<Option<Group>> {
    Ok(conn
        .query_row(
            "SELECT id, title, slug, description FROM post_groups WHERE slug = ?1",
            params![slug],
            group_from_row,
        )
        .optional()?)
}

pub fn find_by_id(conn: &Connection, id: i64) -> AppResult<Option<Group>> {
    Ok(conn
        .query_row(
            "SELECT id, title, slug, description FROM post_groups WHERE id = ?1",
            params![id],
            group_from_row,
        )
        .optional()?)
}

pub fn list_groups(conn: &Connection) -> AppResult<Vec<Group>> {
    let mut stmt =
        conn.prepare("SELECT id, title, slug, description FROM post_groups ORDER BY title, id")?;
    let groups = stmt
        .query_map([], group_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(groups)
}

/// Delete a group. Its posts survive with the group reference cleared.
pub fn delete_group(conn: &Connection, id: i64) -> AppResult<bool> {
    let removed = conn.execute("DELETE FROM post_groups WHERE id = ?1", params![id])?;
    Ok(removed > 0)
}
