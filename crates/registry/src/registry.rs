//! The tag registry: verify-before-write over an append-only entry store.

use crate::entries::EntryStore;
use crate::error::{RegistryError, RegistryResult};
use crate::tag::{MapEntry, SignedTag, Tag};
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::{DecodePublicKey, EncodePublicKey};
use std::sync::Arc;
use time::OffsetDateTime;

/// Signed `(public key, label) → digest` map.
///
/// The entry sequence is the only mutable state in the system and it is
/// append-only; "current" exists only as the newest-by-time rule applied at
/// read time.
pub struct Registry {
    entries: Arc<dyn EntryStore>,
}

impl Registry {
    pub fn new(entries: Arc<dyn EntryStore>) -> Self {
        Self { entries }
    }

    /// Verify and persist a signed tag. The registry never deletes prior
    /// entries for the same `(public key, label)`.
    pub async fn set_tag(
        &self,
        signed: &SignedTag,
        client_ip: Option<String>,
        request_bytes: Option<Vec<u8>>,
    ) -> RegistryResult<()> {
        verify_signed_tag(signed)?;
        let entry = MapEntry {
            public_key: signed.public_key.clone(),
            label: signed.tag.label.clone(),
            target: signed.tag.target.to_wire(),
            signature: signed.signature.clone(),
            creation_time: OffsetDateTime::now_utc(),
            client_ip,
            request_bytes,
        };
        self.entries.append(entry).await?;
        tracing::info!(label = %signed.tag.label, target = %signed.tag.target, "tag set");
        Ok(())
    }

    /// The most recent signed tag for `(public key, label)`, if any.
    pub async fn get_tag(
        &self,
        public_key: &[u8],
        label: &str,
    ) -> RegistryResult<Option<SignedTag>> {
        let mut found = self.entries.find(public_key, label).await?;
        found.sort_by_key(|e| e.creation_time);
        match found.pop() {
            Some(entry) => Ok(Some(entry.to_signed_tag()?)),
            None => Ok(None),
        }
    }
}

fn parse_verifying_key(bytes: &[u8]) -> RegistryResult<VerifyingKey> {
    // DER SPKI is the interchange form; bare SEC1 points are accepted for
    // compatibility with raw-key clients.
    VerifyingKey::from_public_key_der(bytes)
        .or_else(|_| VerifyingKey::from_sec1_bytes(bytes))
        .map_err(|e| RegistryError::InvalidKey(e.to_string()))
}

/// Check a signed tag's ECDSA-P256 ASN.1-DER signature over the canonical
/// tag serialization.
pub fn verify_signed_tag(signed: &SignedTag) -> RegistryResult<()> {
    let key = parse_verifying_key(&signed.public_key)?;
    let signature =
        Signature::from_der(&signed.signature).map_err(|_| RegistryError::InvalidSignature)?;
    key.verify(&signed.tag.canonical_bytes(), &signature)
        .map_err(|_| RegistryError::InvalidSignature)
}

/// Sign a tag with a P-256 key, producing the submission form.
pub fn sign_tag(key: &SigningKey, tag: Tag) -> RegistryResult<SignedTag> {
    let signature: Signature = key.sign(&tag.canonical_bytes());
    let public_key = key
        .verifying_key()
        .to_public_key_der()
        .map_err(|e| RegistryError::InvalidKey(e.to_string()))?;
    Ok(SignedTag {
        tag,
        public_key: public_key.as_bytes().to_vec(),
        signature: signature.to_der().as_bytes().to_vec(),
    })
}

/// Generate a fresh P-256 signing key.
pub fn generate_key() -> SigningKey {
    SigningKey::random(&mut rand_core::OsRng)
}
