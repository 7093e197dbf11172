//! Core data model for the cairn content-addressed store.
//!
//! This crate defines the canonical types used across all other crates:
//! - Self-describing digests and the multicodec table
//! - Unsigned-varint reading and writing
//! - Links (CIDs), selectors and paths
//! - The DAG node wire format
//! - The tagged field codec and the record (typed-struct) layer
//! - Schema description records
//! - Application configuration

pub mod api;
pub mod config;
pub mod digest;
pub mod error;
pub mod field;
pub mod link;
pub mod node;
pub mod record;
pub mod schema;
pub mod varint;

pub use digest::{DEFAULT_HASH, DIGEST_KEY_LEN, Digest, HashCodec, WireDigest};
pub use error::{Error, Result};
pub use field::{FieldRecord, WireType};
pub use link::{Codec, Link, Path, Selector, format_path, parse_path};
pub use node::DagNode;
pub use record::{NodeSet, Record, RecordReader, RecordWriter, marshal_tree, unmarshal_tree};
pub use schema::{FieldDef, Kind, ROOT_KIND, Schema};

/// Recommended chunk size for streamed entry transfers: 1 MiB.
pub const STREAM_CHUNK_SIZE: usize = 1024 * 1024;
