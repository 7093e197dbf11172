//! Raw byte access: exact blob bytes by digest, body-as-blob writes.

use crate::access_log::{GetLogItem, PutLogItem, Source};
use crate::auth::{Capability, authorize};
use crate::error::{ApiError, ApiResult};
use crate::extract::RequestMeta;
use crate::state::ServiceContext;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use cairn_core::Digest;
use cairn_store::StoreError;

/// Digest echo header on raw responses.
const DIGEST_HEADER: &str = "cairn-digest";

fn detect_content_type(bytes: &[u8]) -> &'static str {
    if std::str::from_utf8(bytes).is_ok() {
        "text/plain; charset=utf-8"
    } else {
        "application/octet-stream"
    }
}

/// `GET /raw/{digest}`.
pub async fn raw_get(
    State(ctx): State<ServiceContext>,
    meta: RequestMeta,
    Path(digest_text): Path<String>,
) -> ApiResult<Response> {
    let mut log_item = GetLogItem::new(meta.info, Source::Raw);
    let principal = match authorize(&ctx, meta.api_key.as_deref(), Capability::Read) {
        Ok(principal) => principal,
        Err(e) => {
            ctx.access_log.record_get(log_item);
            return Err(e);
        }
    };
    log_item.user_id = Some(principal.id);

    let digest = match Digest::parse(&digest_text) {
        Ok(digest) => digest,
        Err(e) => {
            tracing::warn!(error = %e, "could not parse digest");
            ctx.access_log.record_get(log_item);
            return Err(e.into());
        }
    };
    let human = digest.to_human();
    log_item.digests.push(human.clone());

    match ctx.store.get(&digest).await {
        Ok(bytes) => {
            log_item.found.push(human.clone());
            ctx.access_log.record_get(log_item);
            Ok((
                [
                    (header::CONTENT_TYPE, detect_content_type(&bytes)),
                    (header::HeaderName::from_static(DIGEST_HEADER), human.as_str()),
                ],
                bytes,
            )
                .into_response())
        }
        Err(StoreError::NotFound(_)) => {
            log_item.not_found.push(human.clone());
            ctx.access_log.record_get(log_item);
            Err(ApiError::NotFound(human))
        }
        Err(e) => {
            tracing::warn!(digest = %human, error = %e, "could not get blob");
            log_item.not_found.push(human);
            ctx.access_log.record_get(log_item);
            Err(e.into())
        }
    }
}

/// `PUT /raw`: store the request body as one blob, reply `201 Created` with
/// the blob's location.
pub async fn raw_put(
    State(ctx): State<ServiceContext>,
    meta: RequestMeta,
    body: Bytes,
) -> ApiResult<Response> {
    let mut log_item = PutLogItem::new(meta.info, Source::Raw);
    let principal = match authorize(&ctx, meta.api_key.as_deref(), Capability::Write) {
        Ok(principal) => principal,
        Err(e) => {
            ctx.access_log.record_put(log_item);
            return Err(e);
        }
    };
    log_item.user_id = Some(principal.id);

    let digest = Digest::compute(&body);
    let human = digest.to_human();
    log_item.digests.push(human.clone());

    match ctx.store.put(body).await {
        Ok(_) => {
            log_item.created.push(human.clone());
            ctx.access_log.record_put(log_item);
            let location = format!("/raw/{human}");
            tracing::info!(location = %location, "new object");
            Ok((StatusCode::CREATED, [(header::LOCATION, location)]).into_response())
        }
        Err(e) => {
            tracing::error!(digest = %human, error = %e, "could not put blob");
            log_item.not_created.push(human);
            ctx.access_log.record_put(log_item);
            Err(e.into())
        }
    }
}
