//! Request and response types for the blob and entry wire APIs.
//!
//! These are shared verbatim by the server handlers and the remote client,
//! so the two sides cannot drift apart.

use crate::digest::base64_bytes;
use crate::link::{Link, Path};
use crate::{Digest, WireDigest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bulk API routes.
pub const BLOBS_GET: &str = "/api/v1/blobs/get";
pub const BLOBS_PUT: &str = "/api/v1/blobs/put";

/// Streamed entry API routes.
pub const ENTRIES: &str = "/api/v1/entries";

/// Tag API routes.
pub const TAGS_GET: &str = "/api/v1/tags/get";
pub const TAGS_SET: &str = "/api/v1/tags/set";

/// API key header, on HTTP requests and streamed-protocol metadata alike.
pub const API_KEY_HEADER: &str = "x-api-key";

/// A root link plus a path of link selectors to follow from it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeId {
    pub root: Link,
    #[serde(default)]
    pub path: Path,
}

fn default_depth() -> u32 {
    10
}

/// One bulk-get item: the traversal target and how deep to recurse from it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRequestItem {
    pub node_id: NodeId,
    #[serde(default = "default_depth")]
    pub depth: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRequest {
    pub items: Vec<GetRequestItem>,
}

/// Blob bytes carried as base64 text in JSON bodies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Base64Blob(pub Vec<u8>);

impl Serialize for Base64Blob {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        base64_bytes::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Base64Blob {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        base64_bytes::deserialize(deserializer).map(Base64Blob)
    }
}

/// Bulk-get response: digest human form to blob bytes, deduplicated across
/// the requested items.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetResponse {
    pub items: BTreeMap<String, Base64Blob>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutRequest {
    pub blobs: Vec<Base64Blob>,
}

/// Bulk-put response: one digest per input blob, in input order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutResponse {
    pub digest: Vec<Digest>,
}

/// Metadata frame of the streamed entry protocol.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub digests: Vec<WireDigest>,
}

/// Chunk frame of the streamed entry protocol.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

/// One frame of a streamed entry response, carried as a JSON line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryFrame {
    Metadata(EntryMetadata),
    Chunk(Chunk),
}
