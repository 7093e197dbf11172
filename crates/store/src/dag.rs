//! Recursive DAG fetching and path traversal.

use crate::error::{StoreError, StoreResult};
use crate::object::ObjectRead;
use bytes::Bytes;
use cairn_core::{Codec, DagNode, Link, Selector};

/// Fetch the blob at `link` and, up to `depth` levels deep, every blob its
/// node links to, in pre-order.
///
/// The root blob is required; failures below it (missing children, blobs
/// that do not parse as nodes) are logged and skipped so a partial DAG still
/// yields a best-effort result. A `Raw` link is never parsed as a node.
pub async fn fetch_nodes(
    store: &dyn ObjectRead,
    link: &Link,
    depth: u32,
) -> StoreResult<Vec<Bytes>> {
    let root = store.get(&link.digest).await?;
    let mut out = vec![root.clone()];
    if link.codec == Codec::Raw || depth == 0 {
        return Ok(out);
    }

    // Explicit stack, children pushed in reverse so emission order matches
    // the recursive definition.
    let mut stack: Vec<(Link, u32)> = Vec::new();
    match DagNode::parse(&root) {
        Ok(node) => {
            for child in node.links.into_iter().rev() {
                stack.push((child, depth - 1));
            }
        }
        Err(e) => {
            tracing::warn!(digest = %link.digest, error = %e, "root blob is not a node");
            return Ok(out);
        }
    }

    while let Some((link, depth)) = stack.pop() {
        let bytes = match store.get(&link.digest).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(digest = %link.digest, error = %e, "skipping unfetchable child");
                continue;
            }
        };
        out.push(bytes.clone());
        if link.codec == Codec::Raw || depth == 0 {
            continue;
        }
        match DagNode::parse(&bytes) {
            Ok(node) => {
                for child in node.links.into_iter().rev() {
                    stack.push((child, depth - 1));
                }
            }
            Err(e) => {
                tracing::warn!(digest = %link.digest, error = %e, "skipping unparsable child");
            }
        }
    }
    Ok(out)
}

/// Resolve `path` starting from `root`, returning the link reached.
///
/// The empty path resolves to `root` itself. Every intermediate step must be
/// a DAG node; a selector past the end of a node's link list fails with
/// `PathOutOfRange`.
pub async fn traverse(
    store: &dyn ObjectRead,
    root: &Link,
    path: &[Selector],
) -> StoreResult<Link> {
    let mut current = root.clone();
    for selector in path {
        if current.codec == Codec::Raw {
            return Err(StoreError::NotADag(current.digest.to_string()));
        }
        let bytes = store.get(&current.digest).await?;
        let node = DagNode::parse(&bytes)
            .map_err(|_| StoreError::NotADag(current.digest.to_string()))?;
        current = node
            .links
            .get(*selector as usize)
            .ok_or(StoreError::PathOutOfRange {
                selector: *selector,
                links: node.links.len(),
            })?
            .clone();
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;
    use crate::object::{BlobStore, ObjectWrite};
    use cairn_core::Digest;
    use std::sync::Arc;

    fn store() -> BlobStore {
        BlobStore::new(Arc::new(MemoryStore::new()))
    }

    async fn put_node(store: &BlobStore, node: &DagNode) -> Digest {
        store.put(node.serialize()).await.unwrap()
    }

    #[tokio::test]
    async fn test_fetch_single_raw_blob() {
        let store = store();
        let digest = store.put(Bytes::from_static(b"leaf")).await.unwrap();

        let nodes = fetch_nodes(&store, &Link::raw(digest), 10).await.unwrap();
        assert_eq!(nodes, vec![Bytes::from_static(b"leaf")]);
    }

    #[tokio::test]
    async fn test_fetch_depth_zero_stops_at_root() {
        let store = store();
        let leaf = store.put(Bytes::from_static(b"leaf")).await.unwrap();
        let node = DagNode::new(Bytes::new(), vec![Link::raw(leaf)]);
        let root = put_node(&store, &node).await;

        let nodes = fetch_nodes(&store, &Link::dag(root), 0).await.unwrap();
        assert_eq!(nodes, vec![node.serialize()]);
    }

    #[tokio::test]
    async fn test_fetch_two_level_dag() {
        let store = store();
        let leaf = store.put(Bytes::from_static(b"hello world")).await.unwrap();
        let node = DagNode::new(Bytes::new(), vec![Link::raw(leaf.clone())]);
        let root = put_node(&store, &node).await;

        let blobs = fetch_nodes(&store, &Link::dag(root.clone()), 1).await.unwrap();
        let digests: Vec<Digest> = blobs.iter().map(|b| Digest::compute(b)).collect();
        assert_eq!(digests, vec![root, leaf]);
    }

    #[tokio::test]
    async fn test_fetch_skips_missing_children() {
        let store = store();
        let present = store.put(Bytes::from_static(b"present")).await.unwrap();
        let absent = Digest::compute(b"absent");
        let node = DagNode::new(
            Bytes::new(),
            vec![Link::raw(absent), Link::raw(present.clone())],
        );
        let root = put_node(&store, &node).await;

        let blobs = fetch_nodes(&store, &Link::dag(root), 5).await.unwrap();
        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs[1], Bytes::from_static(b"present"));
    }

    #[tokio::test]
    async fn test_fetch_missing_root_is_an_error() {
        let store = store();
        let absent = Digest::compute(b"absent root");
        assert!(matches!(
            fetch_nodes(&store, &Link::dag(absent), 3).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_preorder_emission() {
        let store = store();
        let a = store.put(Bytes::from_static(b"a")).await.unwrap();
        let b = store.put(Bytes::from_static(b"b")).await.unwrap();
        let inner = DagNode::new(Bytes::new(), vec![Link::raw(a.clone())]);
        let inner_digest = put_node(&store, &inner).await;
        let outer = DagNode::new(
            Bytes::new(),
            vec![Link::dag(inner_digest.clone()), Link::raw(b.clone())],
        );
        let outer_digest = put_node(&store, &outer).await;

        let blobs = fetch_nodes(&store, &Link::dag(outer_digest.clone()), 10)
            .await
            .unwrap();
        let digests: Vec<Digest> = blobs.iter().map(|x| Digest::compute(x)).collect();
        assert_eq!(digests, vec![outer_digest, inner_digest, a, b]);
    }

    #[tokio::test]
    async fn test_traverse_empty_path_is_identity() {
        let store = store();
        let digest = store.put(Bytes::from_static(b"x")).await.unwrap();
        let link = Link::dag(digest);
        assert_eq!(traverse(&store, &link, &[]).await.unwrap(), link);
    }

    #[tokio::test]
    async fn test_traverse_follows_selectors() {
        let store = store();
        let leaf = store.put(Bytes::from_static(b"hello world")).await.unwrap();
        let node = DagNode::new(Bytes::new(), vec![Link::raw(leaf.clone())]);
        let root = put_node(&store, &node).await;

        let reached = traverse(&store, &Link::dag(root.clone()), &[0]).await.unwrap();
        assert_eq!(reached.digest, leaf);

        match traverse(&store, &Link::dag(root), &[1]).await {
            Err(StoreError::PathOutOfRange { selector: 1, links: 1 }) => {}
            other => panic!("expected PathOutOfRange, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_traverse_through_raw_fails() {
        let store = store();
        let leaf = store.put(Bytes::from_static(b"just bytes")).await.unwrap();
        assert!(matches!(
            traverse(&store, &Link::raw(leaf), &[0]).await,
            Err(StoreError::NotADag(_))
        ));
    }
}
