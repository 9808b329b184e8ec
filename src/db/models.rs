use chrono::{NaiveDateTime, Utc};
use serde::Serialize;

/// Format SQLite writes for `datetime('now')` and `strftime('%f')` columns.
const DB_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub fn parse_db_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DB_TIME_FORMAT).ok()
}

/// A username as one percent-encoded path segment, e.g. for `/profile/<name>/`.
/// Usernames never contain spaces, so the form encoder's `+` for space
/// cannot show up.
pub fn username_segment(username: &str) -> String {
    url::form_urlencoded::byte_serialize(username.as_bytes()).collect()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub is_admin: bool,
    pub created_at: String,
}

impl User {
    /// Name shown on pages: the display name when set, the username otherwise.
    pub fn full_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.username)
    }

    pub fn url_name(&self) -> String {
        username_segment(&self.username)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// Author columns joined onto a post or comment row.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthorRef {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
}

impl AuthorRef {
    pub fn full_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.username)
    }

    pub fn url_name(&self) -> String {
        username_segment(&self.username)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GroupRef {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

/// A post with its author and group already joined in.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: String,
    pub image: Option<String>,
    pub author: AuthorRef,
    pub group: Option<GroupRef>,
}

impl Post {
    /// Short label used in page titles and logs.
    pub fn excerpt(&self) -> String {
        self.text.chars().take(15).collect()
    }

    pub fn published(&self) -> String {
        parse_db_time(&self.pub_date)
            .map(|dt| dt.format("%d %b %Y").to_string())
            .unwrap_or_else(|| self.pub_date.clone())
    }
}

/// "just now", "5m ago", "3h ago", "2d ago", then a plain date.
pub fn format_relative_time(dt: &NaiveDateTime) -> String {
    let diff = Utc::now().naive_utc().signed_duration_since(*dt);

    if diff.num_seconds() < 60 {
        return "just now".to_string();
    }
    let minutes = diff.num_minutes();
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = diff.num_hours();
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    let days = diff.num_days();
    if days < 7 {
        return format!("{}d ago", days);
    }

    dt.format("%b %-d, %Y").to_string()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author: AuthorRef,
    pub text: String,
    pub created: String,
}

impl Comment {
    pub fn created_ago(&self) -> String {
        parse_db_time(&self.created)
            .map(|dt| format_relative_time(&dt))
            .unwrap_or_else(|| self.created.clone())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Follow {
    pub id: i64,
    pub user_id: i64,
    pub author_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(display_name: Option<&str>) -> AuthorRef {
        AuthorRef {
            id: 1,
            username: "abc".into(),
            display_name: display_name.map(String::from),
        }
    }

    #[test]
    fn full_name_falls_back_to_username() {
        assert_eq!(author(None).full_name(), "abc");
        assert_eq!(author(Some("  ")).full_name(), "abc");
        assert_eq!(author(Some("Leo T")).full_name(), "Leo T");
    }

    #[test]
    fn excerpt_is_first_fifteen_chars() {
        let post = Post {
            id: 1,
            text: "T".repeat(20),
            pub_date: "2025-01-15 12:00:00.000".into(),
            image: None,
            author: author(None),
            group: None,
        };
        assert_eq!(post.excerpt(), "T".repeat(15));
        assert_eq!(post.published(), "15 Jan 2025");
    }

    #[test]
    fn username_segment_escapes_non_ascii() {
        assert_eq!(username_segment("leo_t-1.x"), "leo_t-1.x");
        assert_eq!(username_segment("тест"), "%D1%82%D0%B5%D1%81%D1%82");
        assert_eq!(username_segment("a+b@c"), "a%2Bb%40c");
        assert_eq!(author(None).url_name(), "abc");
    }

    #[test]
    fn relative_time_buckets() {
        let now = Utc::now().naive_utc();
        assert_eq!(format_relative_time(&now), "just now");
        assert_eq!(
            format_relative_time(&(now - chrono::Duration::minutes(5))),
            "5m ago"
        );
        assert_eq!(
            format_relative_time(&(now - chrono::Duration::hours(3))),
            "3h ago"
        );
        assert_eq!(
            format_relative_time(&(now - chrono::Duration::days(2))),
            "2d ago"
        );
        let old = chrono::NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(format_relative_time(&old), "Mar 15, 2024");
    }

    #[test]
    fn parse_db_time_accepts_both_precisions() {
        assert!(parse_db_time("2025-01-15 12:00:00").is_some());
        assert!(parse_db_time("2025-01-15 12:00:00.123").is_some());
        assert!(parse_db_time("not-a-date").is_none());
    }
}
