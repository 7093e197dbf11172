//! HTTP client mirroring the server protocols.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use cairn_core::api::{
    API_KEY_HEADER, BLOBS_GET, BLOBS_PUT, Base64Blob, ENTRIES, EntryFrame, EntryMetadata,
    GetRequest, GetResponse, PutRequest, PutResponse, TAGS_GET, TAGS_SET,
};
use cairn_core::{Digest, STREAM_CHUNK_SIZE};
use cairn_registry::tag::{GetTagRequest, GetTagResponse, SetTagRequest, SignedTag};
use cairn_store::{ObjectRead, ObjectWrite, StoreError, StoreResult};
use reqwest::{StatusCode, Url};

/// A remote cairn store reached over its HTTP surface.
///
/// Implements the object capability traits so remotes can participate in
/// layered ([`Sequence`](cairn_store::Sequence)) stores like any local tier.
#[derive(Clone)]
pub struct RemoteStore {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

/// Split a blob into transfer chunks for a streamed put.
pub fn chunk_blob(data: &[u8]) -> Vec<Bytes> {
    if data.is_empty() {
        return Vec::new();
    }
    data.chunks(STREAM_CHUNK_SIZE)
        .map(Bytes::copy_from_slice)
        .collect()
}

impl RemoteStore {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self> {
        let base_url = Url::parse(base_url).context("invalid server URL")?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: api_key.map(str::to_string),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).context("failed to build API URL")
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header(API_KEY_HEADER, key),
            None => req,
        }
    }

    /// Bulk get: traversal targets plus recursion depth per item.
    pub async fn get_nodes(&self, req: &GetRequest) -> Result<GetResponse> {
        let url = self.url(BLOBS_GET)?;
        let response = self.authed(self.http.post(url).json(req)).send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("bulk get failed ({status})");
        }
        Ok(response.json().await?)
    }

    /// Bulk put: returns one digest per blob, in input order.
    pub async fn put_blobs(&self, blobs: Vec<Vec<u8>>) -> Result<Vec<Digest>> {
        let url = self.url(BLOBS_PUT)?;
        let req = PutRequest {
            blobs: blobs.into_iter().map(Base64Blob).collect(),
        };
        let response = self.authed(self.http.post(url).json(&req)).send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("bulk put failed ({status})");
        }
        let res: PutResponse = response.json().await?;
        Ok(res.digest)
    }

    /// Streamed get: parse the frame stream and return the entry bytes.
    pub async fn get_entry(&self, digest: &Digest) -> Result<Vec<u8>> {
        let url = self.url(&format!("{ENTRIES}/{digest}"))?;
        let response = self.authed(self.http.get(url)).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            anyhow::bail!("entry not found: {digest}");
        }
        if !status.is_success() {
            anyhow::bail!("streamed get failed ({status})");
        }
        let body = response.text().await?;
        let frames = parse_frames(&body)?;
        let mut saw_metadata = false;
        let mut data = Vec::new();
        for frame in frames {
            match frame {
                EntryFrame::Metadata(_) => saw_metadata = true,
                EntryFrame::Chunk(chunk) => data.extend_from_slice(&chunk.data),
            }
        }
        anyhow::ensure!(saw_metadata, "stream carried no metadata frame");
        Ok(data)
    }

    /// Streamed put: ship `data` in chunks, return the digest the server
    /// computed over the concatenation.
    pub async fn put_entry(&self, data: Vec<u8>) -> Result<Digest> {
        let url = self.url(ENTRIES)?;
        let chunks = chunk_blob(&data);
        let body = reqwest::Body::wrap_stream(futures::stream::iter(
            chunks.into_iter().map(Ok::<Bytes, std::io::Error>),
        ));
        let response = self.authed(self.http.post(url).body(body)).send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("streamed put failed ({status})");
        }
        let metadata: EntryMetadata = response.json().await?;
        let wire = metadata
            .digests
            .first()
            .context("response carried no digest")?;
        Ok(Digest::from_wire(wire)?)
    }

    /// Existence probe.
    pub async fn entry_metadata(&self, digest: &Digest) -> Result<Option<EntryMetadata>> {
        let url = self.url(&format!("{ENTRIES}/{digest}/metadata"))?;
        let response = self.authed(self.http.get(url)).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => anyhow::bail!("metadata probe failed ({status})"),
        }
    }

    /// The newest signed tag for `(public key, label)`.
    pub async fn get_tag(&self, public_key: &[u8], label: &str) -> Result<Option<SignedTag>> {
        let url = self.url(TAGS_GET)?;
        let req = GetTagRequest {
            public_key: public_key.to_vec(),
            label: label.to_string(),
        };
        let response = self.authed(self.http.post(url).json(&req)).send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("tag get failed ({status})");
        }
        let res: GetTagResponse = response.json().await?;
        Ok(res.signed_tag)
    }

    /// Publish a signed tag.
    pub async fn set_tag(&self, signed_tag: SignedTag) -> Result<()> {
        let url = self.url(TAGS_SET)?;
        let req = SetTagRequest { signed_tag };
        let response = self.authed(self.http.post(url).json(&req)).send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("tag set failed ({status})");
        }
        Ok(())
    }
}

/// Parse a newline-delimited frame stream.
pub fn parse_frames(body: &str) -> Result<Vec<EntryFrame>> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).context("invalid frame"))
        .collect()
}

#[async_trait]
impl ObjectRead for RemoteStore {
    async fn get(&self, digest: &Digest) -> StoreResult<Bytes> {
        let url = self
            .url(&format!("/raw/{digest}"))
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let response = self
            .authed(self.http.get(url))
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        match response.status() {
            StatusCode::NOT_FOUND => return Err(StoreError::NotFound(digest.to_string())),
            status if !status.is_success() => {
                return Err(StoreError::Backend(format!("remote get failed ({status})")));
            }
            _ => {}
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        // Never trust remote bytes without re-deriving the digest.
        let actual = Digest::compute_with(digest.codec(), &bytes);
        if &actual != digest {
            return Err(StoreError::DigestMismatch {
                expected: digest.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(bytes)
    }

    async fn has(&self, digest: &Digest) -> StoreResult<bool> {
        match self.entry_metadata(digest).await {
            Ok(found) => Ok(found.is_some()),
            Err(e) => Err(StoreError::Backend(e.to_string())),
        }
    }
}

#[async_trait]
impl ObjectWrite for RemoteStore {
    async fn put(&self, bytes: Bytes) -> StoreResult<Digest> {
        let url = self
            .url("/raw")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let local = Digest::compute(&bytes);
        let response = self
            .authed(self.http.put(url).body(bytes))
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Backend(format!("remote put failed ({status})")));
        }
        // The server names the stored blob in the Location header; disagreement
        // means one of the two sides is broken.
        if let Some(location) = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            && let Some(remote_text) = location.strip_prefix("/raw/")
        {
            let remote = Digest::parse(remote_text)?;
            if remote != local {
                return Err(StoreError::DigestMismatch {
                    expected: local.to_string(),
                    actual: remote.to_string(),
                });
            }
        }
        Ok(local)
    }
}
