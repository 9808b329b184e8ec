use rusqlite::types::ToSql;
use rusqlite::{named_params, params, Connection, OptionalExtension, Row};

use crate::db::models::{AuthorRef, GroupRef, Post};
use crate::error::AppResult;
use crate::pagination::{Page, Paginator};

/// Which posts a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    Group(i64),
    Author(i64),
    /// Posts by every author the given user follows.
    FollowedBy(i64),
}

impl PostScope {
    /// Extra join and filter clauses, both binding `:scope_id`.
    fn clauses(&self) -> (&'static str, &'static str) {
        match self {
            PostScope::All => ("", ""),
            PostScope::Group(_) => ("", "WHERE p.group_id = :scope_id"),
            PostScope::Author(_) => ("", "WHERE p.author_id = :scope_id"),
            PostScope::FollowedBy(_) => (
                "JOIN follows f ON f.author_id = p.author_id",
                "WHERE f.user_id = :scope_id",
            ),
        }
    }

    fn scope_id(&self) -> Option<i64> {
        match self {
            PostScope::All => None,
            PostScope::Group(id) | PostScope::Author(id) | PostScope::FollowedBy(id) => Some(*id),
        }
    }
}

const SELECT_POST: &str = "SELECT p.id, p.text, p.pub_date, p.image,
        u.id, u.username, u.display_name,
        g.id, g.title, g.slug
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN post_groups g ON g.id = p.group_id";

const NEWEST_FIRST: &str = "ORDER BY p.pub_date DESC, p.id DESC";

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    let group_id: Option<i64> = row.get(7)?;
    let group = match group_id {
        Some(id) => Some(GroupRef {
            id,
            title: row.get(8)?,
            slug: row.get(9)?,
        }),
        None => None,
    };
    Ok(Post {
        id: row.get(0)?,
        text: row.get(1)?,
        pub_date: row.get(2)?,
        image: row.get(3)?,
        author: AuthorRef {
            id: row.get(4)?,
            username: row.get(5)?,
            display_name: row.get(6)?,
        },
        group,
    })
}

pub fn count_posts(conn: &Connection, scope: PostScope) -> AppResult<usize> {
    let (join, filter) = scope.clauses();
    let sql = format!("SELECT COUNT(*) FROM posts p {join} {filter}");
    let count: i64 = match scope.scope_id() {
        Some(id) => conn.query_row(&sql, named_params! { ":scope_id": id }, |r| r.get(0))?,
        None => conn.query_row(&sql, [], |r| r.get(0))?,
    };
    Ok(count.max(0) as usize)
}

/// Posts in `scope`, newest first, with author and group joined.
pub fn list_posts(
    conn: &Connection,
    scope: PostScope,
    limit: usize,
    offset: usize,
) -> AppResult<Vec<Post>> {
    let (join, filter) = scope.clauses();
    let sql = format!("{SELECT_POST} {join} {filter} {NEWEST_FIRST} LIMIT :limit OFFSET :offset");

    let limit = limit as i64;
    let offset = offset as i64;
    let scope_id = scope.scope_id();
    let mut named: Vec<(&str, &dyn ToSql)> = vec![(":limit", &limit), (":offset", &offset)];
    if let Some(ref id) = scope_id {
        named.push((":scope_id", id));
    }

    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map(named.as_slice(), post_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

pub fn page_of_posts(
    conn: &Connection,
    scope: PostScope,
    page_size: usize,
    requested: Option<&str>,
) -> AppResult<Page<Post>> {
    let paginator = Paginator::new(count_posts(conn, scope)?, page_size);
    let number = paginator.page_number(requested);
    let (offset, limit) = paginator.bounds(number);
    let items = if limit == 0 {
        Vec::new()
    } else {
        list_posts(conn, scope, limit, offset)?
    };
    Ok(paginator.page(number, items))
}

pub fn find_post(conn: &Connection, id: i64) -> AppResult<Option<Post>> {
    Ok(conn
        .query_row(
            &format!("{SELECT_POST} WHERE p.id = ?1"),
            params![id],
            post_from_row,
        )
        .optional()?)
}

pub fn count_by_author(conn: &Connection, author_id: i64) -> AppResult<usize> {
    count_posts(conn, PostScope::Author(author_id))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub author_id: i64,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

pub fn insert_post(conn: &Connection, post: &NewPost) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO posts (text, author_id, group_id, image) VALUES (?1, ?2, ?3, ?4)",
        params![post.text, post.author_id, post.group_id, post.image],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Full-record edit. `pub_date` and the author never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

pub fn update_post(conn: &Connection, id: i64, changes: &PostChanges) -> AppResult<bool> {
    let updated = conn.execute(
        "UPDATE posts SET text = ?1, group_id = ?2, image = ?3 WHERE id = ?4",
        params![changes.text, changes.group_id, changes.image, id],
    )?;
    Ok(updated > 0)
}
