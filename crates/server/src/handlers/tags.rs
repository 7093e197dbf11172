//! Tag registry handlers.

use crate::auth::{Capability, authorize};
use crate::error::ApiResult;
use crate::extract::RequestMeta;
use crate::state::ServiceContext;
use axum::Json;
use axum::extract::State;
use cairn_registry::tag::{GetTagRequest, GetTagResponse, SetTagRequest, SetTagResponse};

/// `POST /api/v1/tags/get`: the newest signed tag for `(public key, label)`,
/// or an empty response when none exists.
pub async fn tags_get(
    State(ctx): State<ServiceContext>,
    meta: RequestMeta,
    Json(req): Json<GetTagRequest>,
) -> ApiResult<Json<GetTagResponse>> {
    authorize(&ctx, meta.api_key.as_deref(), Capability::Read)?;
    let signed_tag = ctx.registry.get_tag(&req.public_key, &req.label).await?;
    match &signed_tag {
        Some(tag) => tracing::debug!(label = %tag.tag.label, "tag found"),
        None => tracing::debug!(label = %req.label, "tag not found"),
    }
    Ok(Json(GetTagResponse { signed_tag }))
}

/// `POST /api/v1/tags/set`: verify the signature and append a registry
/// entry. A signature that does not verify leaves the registry unchanged.
pub async fn tags_set(
    State(ctx): State<ServiceContext>,
    meta: RequestMeta,
    Json(req): Json<SetTagRequest>,
) -> ApiResult<Json<SetTagResponse>> {
    authorize(&ctx, meta.api_key.as_deref(), Capability::Write)?;
    ctx.registry
        .set_tag(&req.signed_tag, meta.info.ip.clone(), None)
        .await?;
    Ok(Json(SetTagResponse {}))
}
