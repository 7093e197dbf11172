//! Streamed single-entry get/put and the metadata probe.
//!
//! A streamed get is a newline-delimited JSON frame stream: one metadata
//! frame naming the entry's digests, then exactly one chunk frame with the
//! bytes. A streamed put consumes the request body as a chunk sequence and
//! persists the concatenation only once the stream half-closes, so an
//! aborted upload stores nothing.

use crate::access_log::{GetLogItem, PutLogItem, Source};
use crate::auth::{Capability, authorize};
use crate::error::{ApiError, ApiResult};
use crate::extract::RequestMeta;
use crate::state::ServiceContext;
use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Request, State};
use axum::http::header;
use axum::response::Response;
use bytes::{Bytes, BytesMut};
use cairn_core::Digest;
use cairn_core::api::{Chunk, EntryFrame, EntryMetadata};
use cairn_store::StoreError;
use futures::StreamExt;
use std::convert::Infallible;

fn metadata_for(digest: &Digest) -> EntryMetadata {
    EntryMetadata {
        digests: vec![digest.to_wire()],
    }
}

fn encode_frame(frame: &EntryFrame) -> Bytes {
    let mut line = serde_json::to_vec(frame).expect("frame serializes");
    line.push(b'\n');
    Bytes::from(line)
}

/// `GET /api/v1/entries/{digest}`.
pub async fn entry_get(
    State(ctx): State<ServiceContext>,
    meta: RequestMeta,
    Path(digest_text): Path<String>,
) -> ApiResult<Response> {
    let mut log_item = GetLogItem::new(meta.info, Source::Api);
    let principal = match authorize(&ctx, meta.api_key.as_deref(), Capability::Read) {
        Ok(principal) => principal,
        Err(e) => {
            ctx.access_log.record_get(log_item);
            return Err(e);
        }
    };
    log_item.user_id = Some(principal.id);

    let digest = Digest::parse(&digest_text)?;
    let human = digest.to_human();
    log_item.digests.push(human.clone());

    let bytes = match ctx.store.get(&digest).await {
        Ok(bytes) => {
            log_item.found.push(human);
            ctx.access_log.record_get(log_item);
            bytes
        }
        Err(e) => {
            log_item.not_found.push(human.clone());
            ctx.access_log.record_get(log_item);
            return Err(match e {
                StoreError::NotFound(_) => ApiError::NotFound(human),
                other => other.into(),
            });
        }
    };

    let frames = vec![
        EntryFrame::Metadata(metadata_for(&digest)),
        EntryFrame::Chunk(Chunk {
            data: bytes.to_vec(),
        }),
    ];
    let stream = futures::stream::iter(
        frames
            .into_iter()
            .map(|frame| Ok::<Bytes, Infallible>(encode_frame(&frame))),
    );
    Response::builder()
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// `GET /api/v1/entries/{digest}/metadata`: existence probe.
pub async fn entry_metadata(
    State(ctx): State<ServiceContext>,
    meta: RequestMeta,
    Path(digest_text): Path<String>,
) -> ApiResult<Json<EntryMetadata>> {
    let mut log_item = GetLogItem::new(meta.info, Source::Api);
    let principal = match authorize(&ctx, meta.api_key.as_deref(), Capability::Read) {
        Ok(principal) => principal,
        Err(e) => {
            ctx.access_log.record_get(log_item);
            return Err(e);
        }
    };
    log_item.user_id = Some(principal.id);

    let digest = Digest::parse(&digest_text)?;
    let human = digest.to_human();
    log_item.digests.push(human.clone());

    let present = ctx.store.has(&digest).await?;
    if present {
        log_item.found.push(human);
        ctx.access_log.record_get(log_item);
        Ok(Json(metadata_for(&digest)))
    } else {
        log_item.not_found.push(human.clone());
        ctx.access_log.record_get(log_item);
        Err(ApiError::NotFound(human))
    }
}

/// `POST /api/v1/entries`: streamed put.
///
/// Any non-empty chunk sizes are accepted; zero chunks before half-close
/// stores the empty blob.
pub async fn entry_put(
    State(ctx): State<ServiceContext>,
    meta: RequestMeta,
    request: Request,
) -> ApiResult<Json<EntryMetadata>> {
    let mut log_item = PutLogItem::new(meta.info, Source::Api);
    let principal = match authorize(&ctx, meta.api_key.as_deref(), Capability::Write) {
        Ok(principal) => principal,
        Err(e) => {
            ctx.access_log.record_put(log_item);
            return Err(e);
        }
    };
    log_item.user_id = Some(principal.id);

    let mut stream = request.into_body().into_data_stream();
    let mut assembled = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ApiError::BadRequest(format!("request body: {e}")))?;
        assembled.extend_from_slice(&chunk);
    }
    let blob = assembled.freeze();

    let digest = Digest::compute(&blob);
    let human = digest.to_human();
    log_item.digests.push(human.clone());

    match ctx.store.has(&digest).await? {
        true => {
            tracing::info!(digest = %human, "blob already exists");
            log_item.not_created.push(human);
        }
        false => {
            ctx.store.put(blob).await?;
            tracing::info!(digest = %human, "added blob");
            log_item.created.push(human);
        }
    }
    ctx.access_log.record_put(log_item);
    Ok(Json(metadata_for(&digest)))
}
