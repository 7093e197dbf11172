//! DAG node wire format.
//!
//! A serialized node is `bytes_len: u64 BE | links_len: u64 BE | bytes |
//! link_0 … link_{n-1}` with each link self-delimiting. The framing is fixed
//! rather than negotiable so that any implementation emitting the same
//! logical `(bytes, links)` produces bit-identical output, and therefore the
//! same digest.

use crate::error::{Error, Result};
use crate::link::Link;
use bytes::{BufMut, Bytes, BytesMut};

const HEADER_LEN: usize = 16;

/// A structured node: opaque payload plus an ordered list of links.
///
/// Link order is observable and part of the node's identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DagNode {
    pub bytes: Bytes,
    pub links: Vec<Link>,
}

impl DagNode {
    pub fn new(bytes: impl Into<Bytes>, links: Vec<Link>) -> Self {
        Self {
            bytes: bytes.into(),
            links,
        }
    }

    /// Serialize to the canonical wire form.
    pub fn serialize(&self) -> Bytes {
        let links_len: usize = self.links.iter().map(Link::encoded_len).sum();
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.bytes.len() + links_len);
        buf.put_u64(self.bytes.len() as u64);
        buf.put_u64(self.links.len() as u64);
        buf.put_slice(&self.bytes);
        for link in &self.links {
            link.encode(&mut buf);
        }
        buf.freeze()
    }

    /// Parse the canonical wire form. No trailing bytes are permitted.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(Error::InvalidNode(format!(
                "{} bytes is shorter than the header",
                data.len()
            )));
        }
        let bytes_len = u64::from_be_bytes(data[0..8].try_into().expect("8 bytes"));
        let links_len = u64::from_be_bytes(data[8..16].try_into().expect("8 bytes"));

        let remaining = (data.len() - HEADER_LEN) as u64;
        if bytes_len > remaining {
            return Err(Error::InvalidNode(format!(
                "payload length {bytes_len} exceeds remaining {remaining} bytes"
            )));
        }
        let bytes_end = HEADER_LEN + bytes_len as usize;
        let bytes = Bytes::copy_from_slice(&data[HEADER_LEN..bytes_end]);

        let mut cursor = &data[bytes_end..];
        // Each link is at least four bytes, so an absurd count is rejected
        // before any allocation is attempted.
        if links_len > cursor.len() as u64 {
            return Err(Error::InvalidNode(format!(
                "link count {links_len} exceeds remaining {} bytes",
                cursor.len()
            )));
        }
        let mut links = Vec::new();
        for index in 0..links_len {
            let link = Link::decode(&mut cursor)
                .map_err(|e| Error::InvalidNode(format!("link #{index}: {e}")))?;
            links.push(link);
        }
        if !cursor.is_empty() {
            return Err(Error::InvalidNode(format!(
                "{} trailing bytes after the last link",
                cursor.len()
            )));
        }
        Ok(Self { bytes, links })
    }
}
