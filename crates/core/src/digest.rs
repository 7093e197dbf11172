//! Self-describing content digests.
//!
//! A [`Digest`] holds a canonical multihash encoding:
//! `<codec varint><length varint><hash bytes>`. Equality, ordering and
//! hashing are byte-wise on that encoding, so two digests are equal iff
//! they name the same hash under the same codec.

use crate::error::{Error, Result};
use crate::varint::{read_uvarint, write_uvarint};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Digest as _;
use std::fmt;
use std::str::FromStr;

/// Size of the fixed array form used as an in-memory map key.
pub const DIGEST_KEY_LEN: usize = 64;

/// Registered hash codecs understood by this store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HashCodec {
    Sha2_256,
    Sha2_512,
    Sha3_512,
    Sha3_384,
    Sha3_256,
}

impl HashCodec {
    /// The multicodec code.
    pub const fn code(self) -> u64 {
        match self {
            Self::Sha2_256 => 0x12,
            Self::Sha2_512 => 0x13,
            Self::Sha3_512 => 0x14,
            Self::Sha3_384 => 0x15,
            Self::Sha3_256 => 0x16,
        }
    }

    /// The canonical multicodec name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha2_256 => "sha2-256",
            Self::Sha2_512 => "sha2-512",
            Self::Sha3_512 => "sha3-512",
            Self::Sha3_384 => "sha3-384",
            Self::Sha3_256 => "sha3-256",
        }
    }

    /// Length in bytes of a hash produced by this codec.
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Sha2_256 | Self::Sha3_256 => 32,
            Self::Sha3_384 => 48,
            Self::Sha2_512 | Self::Sha3_512 => 64,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0x12 => Some(Self::Sha2_256),
            0x13 => Some(Self::Sha2_512),
            0x14 => Some(Self::Sha3_512),
            0x15 => Some(Self::Sha3_384),
            0x16 => Some(Self::Sha3_256),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sha2-256" => Some(Self::Sha2_256),
            "sha2-512" => Some(Self::Sha2_512),
            "sha3-512" => Some(Self::Sha3_512),
            "sha3-384" => Some(Self::Sha3_384),
            "sha3-256" => Some(Self::Sha3_256),
            _ => None,
        }
    }

    /// Hash `data` with this codec.
    pub fn hash(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha2_256 => sha2::Sha256::digest(data).to_vec(),
            Self::Sha2_512 => sha2::Sha512::digest(data).to_vec(),
            Self::Sha3_256 => sha3::Sha3_256::digest(data).to_vec(),
            Self::Sha3_384 => sha3::Sha3_384::digest(data).to_vec(),
            Self::Sha3_512 => sha3::Sha3_512::digest(data).to_vec(),
        }
    }
}

/// The process-wide default hash for newly computed digests.
pub const DEFAULT_HASH: HashCodec = HashCodec::Sha2_256;

/// A content digest in canonical multihash encoding.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(Vec<u8>);

impl Digest {
    /// Compute the digest of `data` with the default hash (SHA-256).
    pub fn compute(data: &[u8]) -> Self {
        Self::compute_with(DEFAULT_HASH, data)
    }

    /// Compute the digest of `data` with an explicit codec.
    pub fn compute_with(codec: HashCodec, data: &[u8]) -> Self {
        Self::from_parts_unchecked(codec, &codec.hash(data))
    }

    /// Build a digest from a codec and raw hash bytes, checking the length.
    pub fn from_parts(codec: HashCodec, hash: &[u8]) -> Result<Self> {
        if hash.len() != codec.digest_len() {
            return Err(Error::InvalidDigest(format!(
                "{} expects {} hash bytes, got {}",
                codec.name(),
                codec.digest_len(),
                hash.len()
            )));
        }
        Ok(Self::from_parts_unchecked(codec, hash))
    }

    fn from_parts_unchecked(codec: HashCodec, hash: &[u8]) -> Self {
        let mut buf = Vec::with_capacity(2 + hash.len());
        write_uvarint(&mut buf, codec.code());
        write_uvarint(&mut buf, hash.len() as u64);
        buf.extend_from_slice(hash);
        Self(buf)
    }

    /// Validate and adopt canonical multihash bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = bytes;
        let code = read_uvarint(&mut cursor)
            .map_err(|e| Error::InvalidDigest(format!("bad codec varint: {e}")))?;
        let codec = HashCodec::from_code(code)
            .ok_or_else(|| Error::InvalidDigest(format!("unknown hash codec {code:#x}")))?;
        let len = read_uvarint(&mut cursor)
            .map_err(|e| Error::InvalidDigest(format!("bad length varint: {e}")))?;
        if len as usize != codec.digest_len() {
            return Err(Error::InvalidDigest(format!(
                "declared length {len} does not match {}",
                codec.name()
            )));
        }
        if cursor.len() != len as usize {
            return Err(Error::InvalidDigest(format!(
                "expected {len} hash bytes, got {}",
                cursor.len()
            )));
        }
        Ok(Self(bytes.to_vec()))
    }

    /// Parse a textual digest. Accepted forms, tried in order: hex of the
    /// full multihash, base58 of the full multihash, and `<name>:<hex>` with
    /// the hex covering only the hash bytes.
    pub fn parse(text: &str) -> Result<Self> {
        if let Ok(bytes) = hex::decode(text)
            && let Ok(digest) = Self::from_bytes(&bytes)
        {
            return Ok(digest);
        }
        if let Ok(bytes) = bs58::decode(text).into_vec()
            && let Ok(digest) = Self::from_bytes(&bytes)
        {
            return Ok(digest);
        }
        if let Some((name, rest)) = text.split_once(':') {
            let codec = HashCodec::from_name(name)
                .ok_or_else(|| Error::InvalidDigest(format!("unknown codec name {name:?}")))?;
            let hash = hex::decode(rest)
                .map_err(|e| Error::InvalidDigest(format!("bad hash hex: {e}")))?;
            return Self::from_parts(codec, &hash);
        }
        Err(Error::InvalidDigest(format!("unrecognized digest {text:?}")))
    }

    /// The hash codec this digest was computed with.
    pub fn codec(&self) -> HashCodec {
        let mut cursor = self.0.as_slice();
        let code = read_uvarint(&mut cursor).expect("validated at construction");
        HashCodec::from_code(code).expect("validated at construction")
    }

    /// The raw hash bytes, without the multihash prefix.
    pub fn hash_bytes(&self) -> &[u8] {
        let mut cursor = self.0.as_slice();
        read_uvarint(&mut cursor).expect("validated at construction");
        read_uvarint(&mut cursor).expect("validated at construction");
        cursor
    }

    /// The canonical multihash bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Hex of the full multihash encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Base58 of the full multihash encoding.
    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    /// Human form `<name>:<hex of hash bytes>`, also the `Display` output.
    pub fn to_human(&self) -> String {
        format!("{}:{}", self.codec().name(), hex::encode(self.hash_bytes()))
    }

    /// Fixed-size array form for use as an in-memory map key, zero padded.
    ///
    /// # Panics
    ///
    /// Panics if the canonical encoding exceeds [`DIGEST_KEY_LEN`] bytes;
    /// callers only key caches by digests of in-range codecs.
    pub fn to_key(&self) -> [u8; DIGEST_KEY_LEN] {
        assert!(
            self.0.len() <= DIGEST_KEY_LEN,
            "digest encoding of {} bytes does not fit a map key",
            self.0.len()
        );
        let mut key = [0u8; DIGEST_KEY_LEN];
        key[..self.0.len()].copy_from_slice(&self.0);
        key
    }

    /// Recover a digest from its fixed-size map key form.
    pub fn from_key(key: &[u8; DIGEST_KEY_LEN]) -> Result<Self> {
        let mut cursor = &key[..];
        let code = read_uvarint(&mut cursor)
            .map_err(|e| Error::InvalidDigest(format!("bad key prefix: {e}")))?;
        let codec = HashCodec::from_code(code)
            .ok_or_else(|| Error::InvalidDigest(format!("unknown hash codec {code:#x}")))?;
        let len = read_uvarint(&mut cursor)
            .map_err(|e| Error::InvalidDigest(format!("bad key prefix: {e}")))?;
        if len as usize != codec.digest_len() || cursor.len() < len as usize {
            return Err(Error::InvalidDigest("malformed key".to_string()));
        }
        Ok(Self::from_parts_unchecked(codec, &cursor[..len as usize]))
    }

    /// Split into the `{ code, digest }` wire form.
    pub fn to_wire(&self) -> WireDigest {
        WireDigest {
            code: self.codec().code(),
            digest: self.hash_bytes().to_vec(),
        }
    }

    /// Rebuild from the `{ code, digest }` wire form.
    pub fn from_wire(wire: &WireDigest) -> Result<Self> {
        let codec = HashCodec::from_code(wire.code)
            .ok_or_else(|| Error::InvalidDigest(format!("unknown hash codec {:#x}", wire.code)))?;
        Self::from_parts(codec, &wire.digest)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_human())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let human = self.to_human();
        let shortened = human.split_at(human.len().min(24)).0;
        write!(f, "Digest({shortened}…)")
    }
}

impl FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_human())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// The multihash split into `{ code, digest }` as carried on the wire by the
/// streamed entry protocol and by persisted tag entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireDigest {
    pub code: u64,
    #[serde(with = "base64_bytes")]
    pub digest: Vec<u8>,
}

/// Base64 (standard alphabet) encoding for byte fields in JSON documents.
pub mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &[u8],
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(&text)
            .map_err(serde::de::Error::custom)
    }
}
