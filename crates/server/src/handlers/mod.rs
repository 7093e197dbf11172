//! Request handlers.

pub mod blobs;
pub mod entries;
pub mod raw;
pub mod tags;

pub use blobs::{blobs_get, blobs_put};
pub use entries::{entry_get, entry_metadata, entry_put};
pub use raw::{raw_get, raw_put};
pub use tags::{tags_get, tags_set};
