//! Persisting and resolving record trees through an object store.

use crate::dag::fetch_nodes;
use crate::error::StoreResult;
use crate::object::{ObjectRead, ObjectWrite};
use cairn_core::record::{NodeSet, Record, marshal_tree, unmarshal_tree};
use cairn_core::{Digest, Link};

/// Maximum nesting depth resolved when reading a record tree.
const STRUCT_FETCH_DEPTH: u32 = 32;

/// Serialize `record` bottom-up and persist every node. Returns the root
/// digest. Shared subtrees deduplicate for free through the store.
pub async fn put_struct<R: Record>(store: &dyn ObjectWrite, record: &R) -> StoreResult<Digest> {
    let (root, nodes) = marshal_tree(record)?;
    for (_, data) in nodes {
        store.put(data).await?;
    }
    Ok(root)
}

/// Resolve the node closure under `digest` and decode it as an `R`.
pub async fn get_struct<R: Record>(store: &dyn ObjectRead, digest: &Digest) -> StoreResult<R> {
    let blobs = fetch_nodes(store, &Link::dag(digest.clone()), STRUCT_FETCH_DEPTH).await?;
    let mut set = NodeSet::new();
    for blob in blobs {
        set.insert(blob);
    }
    Ok(unmarshal_tree(digest, &set)?)
}
