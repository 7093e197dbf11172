//! Request metadata extraction.

use crate::access_log::RequestInfo;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use cairn_core::api::API_KEY_HEADER;
use std::convert::Infallible;
use std::net::SocketAddr;

/// Request envelope handed to every handler: the access-log fields plus the
/// client's API key.
#[derive(Clone, Debug)]
pub struct RequestMeta {
    pub info: RequestInfo,
    pub api_key: Option<String>,
}

impl<S: Send + Sync> FromRequestParts<S> for RequestMeta {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|connect| connect.0.ip().to_string());
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let api_key = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Ok(Self {
            info: RequestInfo::new(
                parts.method.to_string(),
                parts.uri.to_string(),
                ip,
                user_agent,
            ),
            api_key,
        })
    }
}
