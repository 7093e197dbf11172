//! Storage layers for the cairn content-addressed store.
//!
//! This crate provides:
//! - Raw key/value datastore backends: local filesystem, S3, in-memory
//! - The content-addressed [`BlobStore`] with digest verification
//! - A write-through read cache with detached fills
//! - Layered read-through over named tiers ([`Sequence`])
//! - Bounded-depth DAG fetching and path traversal
//! - Record tree persistence (`put_struct` / `get_struct`)

pub mod backend;
pub mod cache;
pub mod dag;
pub mod error;
pub mod object;
pub mod record;
pub mod sequence;

pub use backend::{FsStore, KvStore, MemoryStore, S3Store, from_config};
pub use cache::CachedStore;
pub use dag::{fetch_nodes, traverse};
pub use error::{StoreError, StoreResult};
pub use object::{BlobStore, ObjectRead, ObjectWrite};
pub use record::{get_struct, put_struct};
pub use sequence::{Sequence, Tier};
