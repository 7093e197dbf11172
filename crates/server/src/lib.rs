//! HTTP server for the cairn content-addressed store.
//!
//! Surfaces: bulk blob get/put, raw byte access, streamed single-entry
//! get/put with an existence probe, and the signed tag registry. Every
//! handler authorizes against the startup principal table and records an
//! access log item.

pub mod access_log;
pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::ServiceContext;
