//! Per-request access records.
//!
//! Every blob-touching request produces one record partitioning the digests
//! it referenced into found / not-found (reads) or created / not-created
//! (writes). Recording is fire-and-forget; a lost record is non-fatal.

use serde::Serialize;
use std::fmt;
use std::sync::Mutex;
use time::OffsetDateTime;

/// Which surface the request entered through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Api,
    Raw,
    Web,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api => write!(f, "api"),
            Self::Raw => write!(f, "raw"),
            Self::Web => write!(f, "web"),
        }
    }
}

/// Request envelope common to all records.
#[derive(Clone, Debug, Serialize)]
pub struct RequestInfo {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub method: String,
    pub uri: String,
}

impl RequestInfo {
    pub fn new(method: String, uri: String, ip: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            ip,
            user_agent,
            method,
            uri,
        }
    }
}

/// Record of a read request.
#[derive(Clone, Debug, Serialize)]
pub struct GetLogItem {
    #[serde(flatten)]
    pub request: RequestInfo,
    pub user_id: Option<u64>,
    pub source: Source,
    pub digests: Vec<String>,
    pub found: Vec<String>,
    pub not_found: Vec<String>,
}

impl GetLogItem {
    pub fn new(request: RequestInfo, source: Source) -> Self {
        Self {
            request,
            user_id: None,
            source,
            digests: Vec::new(),
            found: Vec::new(),
            not_found: Vec::new(),
        }
    }
}

/// Record of a write request.
#[derive(Clone, Debug, Serialize)]
pub struct PutLogItem {
    #[serde(flatten)]
    pub request: RequestInfo,
    pub user_id: Option<u64>,
    pub source: Source,
    pub digests: Vec<String>,
    pub created: Vec<String>,
    pub not_created: Vec<String>,
}

impl PutLogItem {
    pub fn new(request: RequestInfo, source: Source) -> Self {
        Self {
            request,
            user_id: None,
            source,
            digests: Vec::new(),
            created: Vec::new(),
            not_created: Vec::new(),
        }
    }
}

/// Sink for access records. Implementations must not fail the request.
pub trait AccessLog: Send + Sync + 'static {
    fn record_get(&self, item: GetLogItem);
    fn record_put(&self, item: PutLogItem);
}

/// Production sink: structured events on the `access` target, picked up by
/// whatever subscriber the binary installed.
pub struct TracingAccessLog;

impl AccessLog for TracingAccessLog {
    fn record_get(&self, item: GetLogItem) {
        tracing::info!(
            target: "access",
            source = %item.source,
            user_id = item.user_id,
            method = %item.request.method,
            uri = %item.request.uri,
            found = ?item.found,
            not_found = ?item.not_found,
            "get"
        );
    }

    fn record_put(&self, item: PutLogItem) {
        tracing::info!(
            target: "access",
            source = %item.source,
            user_id = item.user_id,
            method = %item.request.method,
            uri = %item.request.uri,
            created = ?item.created,
            not_created = ?item.not_created,
            "put"
        );
    }
}

/// Test sink retaining every record in memory.
#[derive(Default)]
pub struct MemoryAccessLog {
    gets: Mutex<Vec<GetLogItem>>,
    puts: Mutex<Vec<PutLogItem>>,
}

impl MemoryAccessLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gets(&self) -> Vec<GetLogItem> {
        self.gets.lock().expect("access log lock poisoned").clone()
    }

    pub fn puts(&self) -> Vec<PutLogItem> {
        self.puts.lock().expect("access log lock poisoned").clone()
    }
}

impl AccessLog for MemoryAccessLog {
    fn record_get(&self, item: GetLogItem) {
        self.gets.lock().expect("access log lock poisoned").push(item);
    }

    fn record_put(&self, item: PutLogItem) {
        self.puts.lock().expect("access log lock poisoned").push(item);
    }
}
