//! API-key authentication and capability checks.

use crate::error::{ApiError, ApiResult};
use crate::state::ServiceContext;
use cairn_core::config::UserConfig;
use std::collections::HashMap;

/// An identified client with coarse read/write capabilities. The principal
/// table is built once at startup and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct Principal {
    pub id: u64,
    pub name: String,
    pub can_read: bool,
    pub can_write: bool,
}

/// Capability a handler requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Read,
    Write,
}

/// Build the API-key → principal table from configuration.
pub fn principal_table(users: &[UserConfig]) -> HashMap<String, Principal> {
    let mut table = HashMap::new();
    for user in users {
        tracing::info!(
            api_key = %redact(&user.api_key),
            name = %user.name,
            id = user.id,
            can_read = user.can_read,
            can_write = user.can_write,
            "registered principal"
        );
        table.insert(
            user.api_key.clone(),
            Principal {
                id: user.id,
                name: user.name.clone(),
                can_read: user.can_read,
                can_write: user.can_write,
            },
        );
    }
    table
}

/// Truncate a secret for logging.
pub fn redact(s: &str) -> String {
    if s.len() > 4 {
        format!("{}...", &s[..4])
    } else {
        s.to_string()
    }
}

/// Resolve the API key to a principal and check the required capability.
pub fn authorize<'a>(
    ctx: &'a ServiceContext,
    api_key: Option<&str>,
    capability: Capability,
) -> ApiResult<&'a Principal> {
    let api_key = api_key.unwrap_or_default();
    let Some(principal) = ctx.users.get(api_key) else {
        tracing::warn!(api_key = %redact(api_key), "invalid API key");
        return Err(ApiError::Unauthorized(format!(
            "invalid API key: {:?}",
            redact(api_key)
        )));
    };
    let allowed = match capability {
        Capability::Read => principal.can_read,
        Capability::Write => principal.can_write,
    };
    if !allowed {
        tracing::warn!(
            user_id = principal.id,
            capability = ?capability,
            "principal lacks capability"
        );
        return Err(ApiError::PermissionDenied(format!(
            "user {} does not have {} permission",
            principal.id,
            match capability {
                Capability::Read => "read",
                Capability::Write => "write",
            }
        )));
    }
    Ok(principal)
}
