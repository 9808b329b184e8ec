use axum::http::{header, HeaderMap};
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::AppResult;
use crate::extractors::CurrentUser;

/// Create a new session for a user. Returns the session token.
pub fn create_session(conn: &Connection, user_id: i64, hours: u64) -> AppResult<String> {
    let token = generate_token();
    conn.execute(
        "INSERT INTO sessions (user_id, token, expires_at) VALUES (?1, ?2, datetime('now', ?3))",
        params![user_id, token, format!("+{} hours", hours)],
    )?;
    Ok(token)
}

/// The user behind an unexpired session token.
pub fn user_for_token(conn: &Connection, token: &str) -> AppResult<Option<CurrentUser>> {
    Ok(conn
        .query_row(
            "SELECT u.id, u.username, u.is_admin FROM sessions s \
             JOIN users u ON u.id = s.user_id \
             WHERE s.token = ?1 AND s.expires_at > datetime('now')",
            params![token],
            |row| {
                Ok(CurrentUser {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    is_admin: row.get(2)?,
                })
            },
        )
        .optional()?)
}

/// Delete a session by token.
pub fn delete_session(conn: &Connection, token: &str) -> AppResult<()> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

pub fn purge_expired(conn: &Connection) -> AppResult<usize> {
    Ok(conn.execute(
        "DELETE FROM sessions WHERE expires_at <= datetime('now')",
        [],
    )?)
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

pub fn session_cookie(name: &str, token: &str, max_age_hours: u64) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        name,
        token,
        max_age_hours * 3600
    )
}

pub fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0", name)
}

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name {
                Some(val)
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::*;
    use axum::http::HeaderValue;

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn session_round_trip() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let id = insert_user(&conn, "abcUser");

        let token = create_session(&conn, id, 1).unwrap();
        let user = user_for_token(&conn, &token).unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.username, "abcUser");

        delete_session(&conn, &token).unwrap();
        assert!(user_for_token(&conn, &token).unwrap().is_none());
    }

    #[test]
    fn expired_sessions_do_not_authenticate() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let id = insert_user(&conn, "a");
        conn.execute(
            "INSERT INTO sessions (user_id, token, expires_at) VALUES (?1, 'old', datetime('now', '-1 hours'))",
            params![id],
        )
        .unwrap();

        assert!(user_for_token(&conn, "old").unwrap().is_none());
        assert_eq!(purge_expired(&conn).unwrap(), 1);
    }

    #[test]
    fn cookie_value_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; blogline_session=abc123; x=y"),
        );
        assert_eq!(cookie_value(&headers, "blogline_session"), Some("abc123"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn cookies_are_http_only() {
        let cookie = session_cookie("s", "tok", 2);
        assert!(cookie.starts_with("s=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=7200"));
        assert!(clear_session_cookie("s").contains("Max-Age=0"));
    }
}
