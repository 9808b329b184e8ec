use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::User;
use crate::error::{AppError, AppResult};

const SELECT_USER: &str =
    "SELECT id, username, display_name, password_hash, is_admin, created_at FROM users";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        password_hash: row.get(3)?,
        is_admin: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Usernames: 1-150 chars of letters, digits and `@.+-_`.
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.is_empty() {
        return Err("This field is required.");
    }
    if username.chars().count() > 150 {
        return Err("Ensure this value has at most 150 characters.");
    }
    let allowed = |c: char| c.is_alphanumeric() || "@.+-_".contains(c);
    if !username.chars().all(allowed) {
        return Err(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
    Ok(())
}

pub fn create_user(
    conn: &Connection,
    username: &str,
    password: Option<&str>,
    is_admin: bool,
    bcrypt_cost: u32,
) -> AppResult<User> {
    validate_username(username).map_err(|msg| AppError::BadRequest(msg.to_string()))?;
    if find_by_username(conn, username)?.is_some() {
        return Err(AppError::BadRequest(
            "A user with that username already exists.".into(),
        ));
    }

    let password_hash = password
        .map(|p| bcrypt::hash(p, bcrypt_cost))
        .transpose()
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;

    conn.execute(
        "INSERT INTO users (username, password_hash, is_admin) VALUES (?1, ?2, ?3)",
        params![username, password_hash, is_admin],
    )?;
    let id = conn.last_insert_rowid();
    find_by_id(conn, id)?.ok_or(AppError::NotFound)
}

pub fn find_by_id(conn: &Connection, id: i64) -> AppResult<Option<User>> {
    Ok(conn
        .query_row(
            &format!("{SELECT_USER} WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()?)
}

pub fn find_by_username(conn: &Connection, username: &str) -> AppResult<Option<User>> {
    Ok(conn
        .query_row(
            &format!("{SELECT_USER} WHERE username = ?1"),
            params![username],
            user_from_row,
        )
        .optional()?)
}

/// Look up `username` and check `password` against its stored hash.
/// Accounts without a password can never log in.
pub fn verify_password(
    conn: &Connection,
    username: &str,
    password: &str,
) -> AppResult<Option<User>> {
    let Some(user) = find_by_username(conn, username)? else {
        return Ok(None);
    };
    let Some(hash) = user.password_hash.as_deref() else {
        return Ok(None);
    };
    if bcrypt::verify(password, hash).unwrap_or(false) {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// Remove a user; posts, comments, follows and sessions go with it.
pub fn delete_user(conn: &Connection, id: i64) -> AppResult<bool> {
    let removed = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(removed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::*;

    #[test]
    fn create_and_find_user() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let user = create_user(&conn, "abcUser", None, false, 4).unwrap();
        assert_eq!(user.username, "abcUser");
        assert!(!user.is_admin);

        let found = find_by_username(&conn, "abcUser").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(find_by_username(&conn, "nobody").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        create_user(&conn, "leo", None, false, 4).unwrap();
        let err = create_user(&conn, "leo", None, false, 4).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn verify_password_checks_hash() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        create_user(&conn, "leo", Some("s3cret-pass"), false, 4).unwrap();

        assert!(verify_password(&conn, "leo", "s3cret-pass").unwrap().is_some());
        assert!(verify_password(&conn, "leo", "wrong").unwrap().is_none());
        assert!(verify_password(&conn, "ghost", "s3cret-pass").unwrap().is_none());
    }

    #[test]
    fn passwordless_account_cannot_log_in() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        insert_user(&conn, "nopass");
        assert!(verify_password(&conn, "nopass", "").unwrap().is_none());
    }

    #[test]
    fn username_validation() {
        assert!(validate_username("abc_User.1+@-").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(151)).is_err());
    }

    #[test]
    fn deleting_user_cascades_to_posts() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let author = insert_user(&conn, "A");
        insert_post(&conn, author, None, "hello");

        assert!(delete_user(&conn, author).unwrap());
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM posts", [], |r| r.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
        assert!(!delete_user(&conn, author).unwrap());
    }
}
