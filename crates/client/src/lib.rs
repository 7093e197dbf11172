//! Remote client for the cairn store protocols.
//!
//! [`RemoteStore`] mirrors the server's bulk, raw, streamed-entry and tag
//! surfaces and implements the object capability traits, so remote stores
//! layer into a [`Sequence`](cairn_store::Sequence) next to local tiers.
//! [`ClientCache`] warms itself with one bulk get per miss.

pub mod cached;
pub mod remote;

pub use cached::ClientCache;
pub use remote::{RemoteStore, chunk_blob, parse_frames};

use cairn_core::config::UpstreamConfig;
use cairn_store::{Sequence, Tier};
use std::sync::Arc;

/// Build a layered reader over the configured upstreams, in listed order.
pub fn sequence_from_config(upstreams: &[UpstreamConfig]) -> anyhow::Result<Sequence> {
    let mut tiers = Vec::new();
    for upstream in upstreams {
        let remote = RemoteStore::new(&upstream.url, upstream.api_key.as_deref())?;
        tiers.push(Tier::new(upstream.name.clone(), Arc::new(remote)));
    }
    Ok(Sequence::new(tiers))
}
