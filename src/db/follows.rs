//! The follow graph: directed edges from a reader to an author.

use rusqlite::{params, Connection};

use crate::error::AppResult;

/// Add the edge `user -> author`. Self-follows are ignored and an existing
/// edge is left alone, so calling this any number of times leaves at most
/// one edge. Returns whether a new edge was created.
pub fn follow(conn: &Connection, user_id: i64, author_id: i64) -> AppResult<bool> {
    if user_id == author_id {
        return Ok(false);
    }
    // UNIQUE(user_id, author_id) makes concurrent follows collapse into one row.
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO follows (user_id, author_id) VALUES (?1, ?2)",
        params![user_id, author_id],
    )?;
    Ok(inserted > 0)
}

/// Remove the edge if present. Returns whether anything was removed.
pub fn unfollow(conn: &Connection, user_id: i64, author_id: i64) -> AppResult<bool> {
    let removed = conn.execute(
        "DELETE FROM follows WHERE user_id = ?1 AND author_id = ?2",
        params![user_id, author_id],
    )?;
    Ok(removed > 0)
}

pub fn is_following(conn: &Connection, user_id: i64, author_id: i64) -> AppResult<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = ?1 AND author_id = ?2)",
        params![user_id, author_id],
        |r| r.get(0),
    )?)
}

pub fn count_followers(conn: &Connection, author_id: i64) -> AppResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM follows WHERE author_id = ?1",
        params![author_id],
        |r| r.get(0),
    )?)
}

pub fn count_following(conn: &Connection, user_id: i64) -> AppResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM follows WHERE user_id = ?1",
        params![user_id],
        |r| r.get(0),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::*;

    #[test]
    fn follow_twice_makes_one_edge() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let reader = insert_user(&conn, "followerUser");
        let author = insert_user(&conn, "abcUser");

        assert!(follow(&conn, reader, author).unwrap());
        assert!(!follow(&conn, reader, author).unwrap());
        assert_eq!(count_following(&conn, reader).unwrap(), 1);
        assert_eq!(count_followers(&conn, author).unwrap(), 1);
        assert!(is_following(&conn, reader, author).unwrap());
        assert!(!is_following(&conn, author, reader).unwrap());
    }

    #[test]
    fn self_follow_is_a_silent_no_op() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let user = insert_user(&conn, "me");
        for _ in 0..3 {
            assert!(!follow(&conn, user, user).unwrap());
        }
        assert_eq!(count_following(&conn, user).unwrap(), 0);
    }

    #[test]
    fn unfollow_without_follow_is_a_no_op() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let reader = insert_user(&conn, "r");
        let author = insert_user(&conn, "a");
        assert!(!unfollow(&conn, reader, author).unwrap());

        follow(&conn, reader, author).unwrap();
        assert!(unfollow(&conn, reader, author).unwrap());
        assert!(!is_following(&conn, reader, author).unwrap());
    }

    #[test]
    fn edges_disappear_with_either_user() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let reader = insert_user(&conn, "r");
        let author = insert_user(&conn, "a");
        follow(&conn, reader, author).unwrap();

        conn.execute("DELETE FROM users WHERE id = ?1", params![author])
            .unwrap();
        assert_eq!(count_following(&conn, reader).unwrap(), 0);
    }
}
