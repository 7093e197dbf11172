//! Links between blobs (content identifiers), selectors and paths.
//!
//! A link is a CID v1: `<version=1><codec><multihash>`, all varints apart
//! from the multihash bytes. Links are self-delimiting and concatenable in a
//! stream, which is what the DAG node wire format relies on.

use crate::digest::{Digest, HashCodec};
use crate::error::{Error, Result};
use crate::varint::{read_uvarint, write_uvarint};
use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};
use std::fmt;

const CID_VERSION: u64 = 1;

/// Content codec of the blob a link points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    /// Opaque leaf bytes.
    Raw,
    /// A structured DAG node.
    Dag,
}

impl Codec {
    pub const fn code(self) -> u64 {
        match self {
            Self::Raw => 0x55,
            Self::Dag => 0x70,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Dag => "dag",
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0x55 => Some(Self::Raw),
            0x70 => Some(Self::Dag),
            _ => None,
        }
    }
}

/// A content identifier pointing at another blob.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub codec: Codec,
    pub digest: Digest,
}

impl Link {
    pub fn raw(digest: Digest) -> Self {
        Self {
            codec: Codec::Raw,
            digest,
        }
    }

    pub fn dag(digest: Digest) -> Self {
        Self {
            codec: Codec::Dag,
            digest,
        }
    }

    /// Append the wire encoding to `buf`.
    pub fn encode(&self, buf: &mut impl BufMut) {
        write_uvarint(buf, CID_VERSION);
        write_uvarint(buf, self.codec.code());
        buf.put_slice(self.digest.as_bytes());
    }

    /// Decode one link from the front of `buf`, leaving the remainder.
    pub fn decode(buf: &mut impl Buf) -> Result<Self> {
        let version =
            read_uvarint(buf).map_err(|e| Error::InvalidNode(format!("link version: {e}")))?;
        if version != CID_VERSION {
            return Err(Error::InvalidNode(format!(
                "unsupported link version {version}"
            )));
        }
        let code =
            read_uvarint(buf).map_err(|e| Error::InvalidNode(format!("link codec: {e}")))?;
        let codec = Codec::from_code(code)
            .ok_or_else(|| Error::InvalidNode(format!("unknown link codec {code:#x}")))?;

        let hash_code =
            read_uvarint(buf).map_err(|e| Error::InvalidNode(format!("link hash: {e}")))?;
        let hash_codec = HashCodec::from_code(hash_code)
            .ok_or_else(|| Error::InvalidNode(format!("unknown hash codec {hash_code:#x}")))?;
        let len =
            read_uvarint(buf).map_err(|e| Error::InvalidNode(format!("link hash: {e}")))?;
        if len as usize != hash_codec.digest_len() {
            return Err(Error::InvalidNode(format!(
                "hash length {len} does not match {}",
                hash_codec.name()
            )));
        }
        if buf.remaining() < len as usize {
            return Err(Error::InvalidNode("truncated link hash".to_string()));
        }
        let mut hash = vec![0u8; len as usize];
        buf.copy_to_slice(&mut hash);
        let digest = Digest::from_parts(hash_codec, &hash)
            .map_err(|e| Error::InvalidNode(e.to_string()))?;
        Ok(Self { codec, digest })
    }

    /// The encoded length in bytes.
    pub fn encoded_len(&self) -> usize {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf.len()
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.codec.name(), self.digest)
    }
}

/// Index of the link to follow within a node.
pub type Selector = u64;

/// An ordered sequence of selectors; the empty path names the current node.
pub type Path = Vec<Selector>;

/// Parse a path of the form `/1/0/2` (empty and `/` mean the empty path).
pub fn parse_path(text: &str) -> Result<Path> {
    let mut path = Vec::new();
    for segment in text.split('/') {
        if segment.is_empty() {
            continue;
        }
        let selector = segment
            .parse::<u64>()
            .map_err(|e| Error::InvalidRecord(format!("invalid selector {segment:?}: {e}")))?;
        path.push(selector);
    }
    Ok(path)
}

/// Format a path as `/1/0/2`; the empty path formats as an empty string.
pub fn format_path(path: &[Selector]) -> String {
    path.iter().map(|s| format!("/{s}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_roundtrip() {
        let digest = Digest::compute(b"linked blob");
        for link in [Link::raw(digest.clone()), Link::dag(digest)] {
            let mut buf = Vec::new();
            link.encode(&mut buf);
            let mut slice = buf.as_slice();
            let decoded = Link::decode(&mut slice).unwrap();
            assert_eq!(decoded, link);
            assert!(slice.is_empty());
        }
    }

    #[test]
    fn test_links_concatenate() {
        let a = Link::raw(Digest::compute(b"a"));
        let b = Link::dag(Digest::compute(b"b"));
        let mut buf = Vec::new();
        a.encode(&mut buf);
        b.encode(&mut buf);

        let mut slice = buf.as_slice();
        assert_eq!(Link::decode(&mut slice).unwrap(), a);
        assert_eq!(Link::decode(&mut slice).unwrap(), b);
        assert!(slice.is_empty());
    }

    #[test]
    fn test_decode_rejects_bad_version() {
        let link = Link::raw(Digest::compute(b"x"));
        let mut buf = Vec::new();
        link.encode(&mut buf);
        buf[0] = 2;
        assert!(Link::decode(&mut buf.as_slice()).is_err());
    }

    #[test]
    fn test_decode_rejects_truncated_hash() {
        let link = Link::raw(Digest::compute(b"x"));
        let mut buf = Vec::new();
        link.encode(&mut buf);
        buf.truncate(buf.len() - 1);
        assert!(Link::decode(&mut buf.as_slice()).is_err());
    }

    #[test]
    fn test_path_parse_and_format() {
        assert_eq!(parse_path("").unwrap(), Vec::<u64>::new());
        assert_eq!(parse_path("/").unwrap(), Vec::<u64>::new());
        assert_eq!(parse_path("/1/0/2").unwrap(), vec![1, 0, 2]);
        assert_eq!(format_path(&[1, 0, 2]), "/1/0/2");
        assert_eq!(format_path(&[]), "");
        assert!(parse_path("/x").is_err());
    }
}
