//! Tags, signed tags and persisted map entries.

use cairn_core::digest::base64_bytes;
use cairn_core::{Digest, FieldRecord, WireDigest};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// An assertion that a label currently names a target digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub label: String,
    pub target: Digest,
}

impl Tag {
    /// Deterministic serialization signed by tag owners: field records
    /// `(0, bytes, label)`, `(1, int, hash code)`, `(2, bytes, hash bytes)`.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let wire = self.target.to_wire();
        let mut buf = Vec::new();
        FieldRecord::bytes(0, self.label.as_bytes().to_vec()).encode(&mut buf);
        FieldRecord::int(1, wire.code).encode(&mut buf);
        FieldRecord::bytes(2, wire.digest).encode(&mut buf);
        buf
    }
}

/// A tag plus the ECDSA public key that owns it and an ASN.1-DER signature
/// over the tag's canonical serialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTag {
    pub tag: Tag,
    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
}

/// One persisted registry entry. The numbered serde names match the document
/// schema the entries are stored under; the sequence of entries is
/// append-only and the newest `creation_time` wins at read time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapEntry {
    #[serde(rename = "0", with = "base64_bytes")]
    pub public_key: Vec<u8>,
    #[serde(rename = "1")]
    pub label: String,
    #[serde(rename = "2")]
    pub target: WireDigest,
    #[serde(rename = "3", with = "base64_bytes")]
    pub signature: Vec<u8>,
    #[serde(rename = "4", with = "time::serde::rfc3339")]
    pub creation_time: OffsetDateTime,
    #[serde(rename = "5", default, skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    #[serde(rename = "6", default, skip_serializing_if = "Option::is_none")]
    pub request_bytes: Option<Vec<u8>>,
}

impl MapEntry {
    /// Rebuild the signed tag this entry persisted.
    pub fn to_signed_tag(&self) -> cairn_core::Result<SignedTag> {
        Ok(SignedTag {
            tag: Tag {
                label: self.label.clone(),
                target: Digest::from_wire(&self.target)?,
            },
            public_key: self.public_key.clone(),
            signature: self.signature.clone(),
        })
    }
}

/// Wire request for a tag lookup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GetTagRequest {
    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,
    pub label: String,
}

/// Wire response for a tag lookup; `signed_tag` is absent when the label has
/// never been set for the key.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GetTagResponse {
    pub signed_tag: Option<SignedTag>,
}

/// Wire request to publish a signed tag.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetTagRequest {
    pub signed_tag: SignedTag,
}

/// Wire response for a successful publish.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SetTagResponse {}
