//! Shared fixtures for server integration tests.
#![allow(dead_code)] // Not every test binary uses every helper.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use bytes::Bytes;
use cairn_core::api::API_KEY_HEADER;
use cairn_server::access_log::MemoryAccessLog;
use cairn_server::{ServiceContext, create_router};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

pub const RW_KEY: &str = "test-rw-key";
pub const RO_KEY: &str = "test-ro-key";
pub const WO_KEY: &str = "test-wo-key";

pub struct TestServer {
    pub router: Router,
    pub ctx: ServiceContext,
    pub log: Arc<MemoryAccessLog>,
}

pub fn test_server() -> TestServer {
    let (ctx, log) = ServiceContext::for_testing();
    TestServer {
        router: create_router(ctx.clone()),
        ctx,
        log,
    }
}

impl TestServer {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body)
    }

    pub async fn post_json(
        &self,
        path: &str,
        api_key: Option<&str>,
        body: &serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json");
        if let Some(key) = api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        let request = builder
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap();
        let (status, bytes) = self.send(request).await;
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, value)
    }

    pub async fn raw_put(&self, api_key: Option<&str>, body: &[u8]) -> (StatusCode, Option<String>) {
        let mut builder = Request::builder().method("PUT").uri("/raw");
        if let Some(key) = api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        let request = builder.body(Body::from(body.to_vec())).unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        (status, location)
    }

    pub async fn raw_get(&self, api_key: Option<&str>, digest_text: &str) -> (StatusCode, Bytes) {
        let mut builder = Request::builder()
            .method("GET")
            .uri(format!("/raw/{digest_text}"));
        if let Some(key) = api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }
}

/// Base64 helper for JSON request bodies.
pub fn b64(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(data)
}
