//! Shared harness for the router tests: a temp-dir database, a router
//! built from it, and helpers that drive requests through `oneshot`.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use blogline::auth::session;
use blogline::config::Config;
use blogline::db::models::{Group, User};
use blogline::db::{self, groups, users};
use blogline::state::{AppState, DbPool};
use tempfile::TempDir;
use tower::ServiceExt;

/// 1x1 transparent GIF.
pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x21, 0xf9,
    0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00,
    0x00, 0x02, 0x01, 0x00, 0x00,
];

const BOUNDARY: &str = "blogline-test-boundary";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    pub fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
    }
}

pub struct TestApp {
    _dir: TempDir,
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config::with_data_dir(dir.path());
        config.auth.bcrypt_cost = 4;
        std::fs::create_dir_all(config.media_path()).unwrap();

        let pool = db::create_pool(&config.db_path()).expect("Failed to create test database");
        db::run_migrations(&pool).expect("Failed to run migrations");

        let state = AppState::new(pool, config);
        let router = blogline::build_router(state.clone());
        Self {
            _dir: dir,
            state,
            router,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.state.db
    }

    pub fn conn(&self) -> r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager> {
        self.state.db.get().unwrap()
    }

    /// Create a user and return it with a ready-made `Cookie` header value.
    pub fn login_as(&self, username: &str) -> (User, String) {
        let conn = self.conn();
        let user = users::create_user(&conn, username, Some("secret-pass"), false, 4).unwrap();
        let token = session::create_session(&conn, user.id, 1).unwrap();
        let cookie = format!("{}={}", self.state.config.auth.cookie_name, token);
        (user, cookie)
    }

    pub fn admin(&self, username: &str) -> String {
        let conn = self.conn();
        let user = users::create_user(&conn, username, Some("secret-pass"), true, 4).unwrap();
        let token = session::create_session(&conn, user.id, 1).unwrap();
        format!("{}={}", self.state.config.auth.cookie_name, token)
    }

    pub fn group(&self, title: &str, slug: &str) -> Group {
        groups::create_group(&self.conn(), title, slug, "").unwrap()
    }

    pub fn post(&self, author_id: i64, group_id: Option<i64>, text: &str) -> i64 {
        db::posts::insert_post(
            &self.conn(),
            &db::posts::NewPost {
                author_id,
                text: text.to_string(),
                group_id,
                image: None,
            },
        )
        .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, body: &str) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        cookie: Option<&str>,
        fields: &[(&str, &str)],
        image: Option<(&str, &[u8])>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = multipart_body(fields, image);
        self.send(builder.body(Body::from(body)).unwrap()).await
    }
}

pub fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, data)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: image/gif\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
