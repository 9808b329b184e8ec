use rusqlite::{params, Connection};

use crate::db::models::{AuthorRef, Comment};
use crate::error::AppResult;

pub fn insert_comment(
    conn: &Connection,
    post_id: i64,
    author_id: i64,
    text: &str,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO comments (post_id, author_id, text) VALUES (?1, ?2, ?3)",
        params![post_id, author_id, text],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Comments on a post, newest first.
pub fn list_for_post(conn: &Connection, post_id: i64) -> AppResult<Vec<Comment>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.post_id, c.text, c.created, u.id, u.username, u.display_name
         FROM comments c
         JOIN users u ON u.id = c.author_id
         WHERE c.post_id = ?1
         ORDER BY c.created DESC, c.id DESC",
    )?;

    let comments = stmt
        .query_map(params![post_id], |row| {
            Ok(Comment {
                id: row.get(0)?,
                post_id: row.get(1)?,
                text: row.get(2)?,
                created: row.get(3)?,
                author: AuthorRef {
                    id: row.get(4)?,
                    username: row.get(5)?,
                    display_name: row.get(6)?,
                },
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(comments)
}

pub fn count_comments(conn: &Connection) -> AppResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM comments", [], |r| r.get(0))?)
}
