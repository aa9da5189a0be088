//! Router and database helpers shared by the HTTP tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use evalia_api::{ApiServer, ApiServerConfig};
use sea_orm::DatabaseConnection;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower::ServiceExt; // For `oneshot` method

pub const TEST_SECRET: &str = "test-secret";

/// In-memory database with migrations applied
pub async fn create_test_db() -> DatabaseConnection {
    let db = evalia_db::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    evalia_db::migrate(&db)
        .await
        .expect("Failed to run migrations");

    db
}

pub fn create_test_server(db: DatabaseConnection, allow_signup: bool) -> ApiServer {
    let config = ApiServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(), // Random port
        enable_cors: true,
        cors_origins: None,
        jwt_secret: TEST_SECRET.to_string(),
    };

    ApiServer::new(config, db, allow_signup)
}

pub fn create_test_app(db: DatabaseConnection) -> Router {
    create_test_server(db, true).build_router()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "Unexpected body ({}): {}: {}",
                self.status,
                e,
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    pub fn code(&self) -> Option<String> {
        self.json::<Value>()["code"].as_str().map(str::to_string)
    }
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();

    TestResponse {
        status,
        set_cookie,
        body,
    }
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> TestResponse {
    send(app, Method::GET, uri, token, None).await
}

pub async fn post(app: &Router, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
    send(app, Method::POST, uri, token, Some(body)).await
}
