//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - An in-process router over a fresh in-memory store
//! - Cheap password hashing parameters
//! - Request helpers returning status and JSON body
//! - User and project fixtures

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use organiser_api::app::{build_router, AppState};
use organiser_api::config::{ApiConfig, Config, JwtConfig, LogFormat, StoreConfig, UploadConfig};
use organiser_shared::auth::password::HashingParams;
use organiser_shared::auth::token::TokenIssuer;
use organiser_shared::blob::LocalBlobStore;
use organiser_shared::store::memory::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const TEST_ISSUER: &str = "project-organiser";
pub const MAX_UPLOAD_BYTES: usize = 1024;

/// A signed-up user
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: Router,
    pub store: MemoryStore,
    pub tokens: Arc<TokenIssuer>,
    pub uploads: TempDir,
}

pub fn test_config(upload_dir: &str) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        store: StoreConfig::Memory,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            ttl_seconds: 3600,
            issuer: TEST_ISSUER.to_string(),
        },
        password: HashingParams::insecure_fast(),
        uploads: UploadConfig {
            dir: upload_dir.to_string(),
            public_base_url: "http://localhost:5000".to_string(),
            max_bytes: MAX_UPLOAD_BYTES,
        },
        log_format: LogFormat::Pretty,
    }
}

impl TestContext {
    /// Creates a new test context with an empty store
    pub fn new() -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let dir = uploads.path().join("images");
        let config = test_config(&dir.to_string_lossy());

        let store = MemoryStore::new();
        let blobs = Arc::new(LocalBlobStore::new(
            dir,
            config.uploads.public_base_url.clone(),
            config.uploads.max_bytes,
        ));

        let state = AppState::new(store.clone(), blobs, config).unwrap();
        let tokens = state.tokens.clone();

        Self {
            app: build_router(state),
            store,
            tokens,
            uploads,
        }
    }

    /// Sends a request and returns status and parsed JSON body
    ///
    /// Non-JSON or empty bodies come back as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.dispatch(request).await
    }

    /// Sends a prebuilt request
    pub async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, body)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(token), Some(body)).await
    }

    /// Signs up a user and returns its ID and token
    pub async fn signup(&self, email: &str, password: &str) -> TestUser {
        let (status, body) = self
            .post(
                "/api/user/signup",
                None,
                json!({
                    "name": "Test",
                    "surname": "User",
                    "age": 30,
                    "email": email,
                    "password": password,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);

        TestUser {
            id: body["userId"].as_str().unwrap().parse().unwrap(),
            email: body["email"].as_str().unwrap().to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a project owned by `owner` and returns its ID
    pub async fn create_project(&self, owner: &TestUser, name: &str) -> Uuid {
        let (status, body) = self
            .post(
                "/api/project/add-project",
                Some(&owner.token),
                json!({ "name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add-project failed: {}", body);

        body["project"]["id"].as_str().unwrap().parse().unwrap()
    }

    /// Adds workers to a project as `owner`
    pub async fn add_workers(&self, owner: &TestUser, project_id: Uuid, workers: &[Uuid]) -> (StatusCode, Value) {
        self.post(
            "/api/project/add-workers",
            Some(&owner.token),
            json!({ "projectId": project_id, "workers": workers }),
        )
        .await
    }
}
