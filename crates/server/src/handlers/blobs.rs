//! Bulk blob get/put handlers.

use crate::access_log::{GetLogItem, PutLogItem, Source};
use crate::auth::{Capability, authorize};
use crate::error::ApiResult;
use crate::extract::RequestMeta;
use crate::state::ServiceContext;
use axum::Json;
use axum::extract::State;
use bytes::Bytes;
use cairn_core::api::{Base64Blob, GetRequest, GetResponse, PutRequest, PutResponse};
use cairn_core::{Digest, Link, Selector};
use cairn_store::{StoreError, dag};

async fn fetch_item(
    ctx: &ServiceContext,
    root: &Link,
    path: &[Selector],
    depth: u32,
) -> Result<Vec<Bytes>, StoreError> {
    let store = ctx.reader();
    let target = dag::traverse(store, root, path).await?;
    dag::fetch_nodes(store, &target, depth).await
}

/// `POST /api/v1/blobs/get`.
///
/// Item failures never fail the batch: the affected digests are recorded as
/// not-found in the access log and omitted from the response map.
pub async fn blobs_get(
    State(ctx): State<ServiceContext>,
    meta: RequestMeta,
    Json(req): Json<GetRequest>,
) -> ApiResult<Json<GetResponse>> {
    let mut log_item = GetLogItem::new(meta.info, Source::Api);
    let principal = match authorize(&ctx, meta.api_key.as_deref(), Capability::Read) {
        Ok(principal) => principal,
        Err(e) => {
            ctx.access_log.record_get(log_item);
            return Err(e);
        }
    };
    log_item.user_id = Some(principal.id);

    let mut res = GetResponse::default();
    for item in req.items {
        let root = item.node_id.root;
        log_item.digests.push(root.digest.to_human());
        match fetch_item(&ctx, &root, &item.node_id.path, item.depth).await {
            Ok(blobs) => {
                for blob in blobs {
                    let digest = Digest::compute(&blob).to_human();
                    log_item.found.push(digest.clone());
                    res.items.insert(digest, Base64Blob(blob.to_vec()));
                }
            }
            Err(e) => {
                tracing::warn!(digest = %root.digest, error = %e, "bulk get item failed");
                log_item.not_found.push(root.digest.to_human());
            }
        }
    }
    ctx.access_log.record_get(log_item);
    Ok(Json(res))
}

/// `POST /api/v1/blobs/put`.
///
/// The response carries one digest per input blob, in input order, whether
/// or not the blob was already present; the access log partitions the
/// inputs into created and not-created.
pub async fn blobs_put(
    State(ctx): State<ServiceContext>,
    meta: RequestMeta,
    Json(req): Json<PutRequest>,
) -> ApiResult<Json<PutResponse>> {
    let mut log_item = PutLogItem::new(meta.info, Source::Api);
    let principal = match authorize(&ctx, meta.api_key.as_deref(), Capability::Write) {
        Ok(principal) => principal,
        Err(e) => {
            ctx.access_log.record_put(log_item);
            return Err(e);
        }
    };
    log_item.user_id = Some(principal.id);

    let mut res = PutResponse::default();
    for blob in req.blobs {
        let bytes = Bytes::from(blob.0);
        let digest = Digest::compute(&bytes);
        let human = digest.to_human();
        log_item.digests.push(human.clone());

        match ctx.store.has(&digest).await {
            Ok(true) => {
                tracing::debug!(digest = %human, "blob already exists");
                log_item.not_created.push(human);
            }
            Ok(false) => match ctx.store.put(bytes).await {
                Ok(actual) => {
                    if actual != digest {
                        tracing::error!(expected = %human, actual = %actual, "digest mismatch on put");
                    }
                    log_item.created.push(human);
                }
                Err(e) => {
                    tracing::error!(digest = %human, error = %e, "error adding blob");
                    log_item.not_created.push(human);
                }
            },
            Err(e) => {
                tracing::error!(digest = %human, error = %e, "error checking blob existence");
                log_item.not_created.push(human);
            }
        }
        res.digest.push(digest);
    }
    ctx.access_log.record_put(log_item);
    Ok(Json(res))
}
