#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use warbler_api::auth::{self, AppState, AppStateInner};
use warbler_api::middleware::{SESSION_COOKIE, encode_session};
use warbler_db::Database;
use warbler_types::models::User;

pub const SECRET: &str = "test-secret";

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let db = Database::open_in_memory().expect("in-memory database");
        let state: AppState = Arc::new(AppStateInner {
            db,
            secret_key: SECRET.to_string(),
        });
        let router = warbler_api::router(state.clone());
        Self { state, router }
    }

    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Sign a user up directly, bypassing HTTP.
    pub fn create_user(&self, name: &str) -> User {
        auth::signup(
            self.db(),
            name,
            &format!("{}@test.com", name),
            "password",
            None,
        )
        .expect("signup")
        .expect("unique user")
    }

    /// A `Cookie` header value carrying a valid session for `user`.
    pub fn session_for(&self, user: &User) -> String {
        let token = encode_session(SECRET, user.id).expect("session token");
        format!("{}={}", SESSION_COOKIE, token)
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap()).await
    }

    async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub fn message_count(&self, user_id: i64) -> i64 {
        self.db()
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM messages WHERE user_id = ?1",
                    [user_id],
                    |r| r.get(0),
                )?)
            })
            .unwrap()
    }
}

/// The `name=value` pair of a cookie set by `resp`, if any.
pub fn set_cookie(resp: &Response<Body>, name: &str) -> Option<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with(&format!("{}=", name)))
        .map(str::to_string)
}

/// The session cookie a response handed out, ready for a `Cookie` header.
pub fn session_cookie(resp: &Response<Body>) -> Option<String> {
    set_cookie(resp, SESSION_COOKIE).filter(|pair| pair.len() > SESSION_COOKIE.len() + 1)
}

pub fn location(resp: &Response<Body>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn assert_redirect(resp: &Response<Body>, to: &str) {
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(resp), to);
}

pub async fn json(resp: Response<Body>) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn usernames(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap().to_string())
        .collect()
}
