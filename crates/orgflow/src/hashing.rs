//! Identity pseudonymization.
//!
//! Employee identifiers leave the engine only in hashed form. The hash is
//! keyed so identifiers cannot be recovered by rainbow-table lookup, while
//! staying stable across sync runs of the same connector.

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Maps a raw identifier to its stable pseudonym.
///
/// Implementations must be deterministic: the same input always produces
/// the same output within one connector's lifetime.
pub trait HashFunction: Send + Sync {
    fn hash(&self, value: &str) -> String;
}

/// Keyed HMAC-SHA256 hash, hex-encoded.
pub struct HmacSha256HashFunction {
    key: Vec<u8>,
}

impl HmacSha256HashFunction {
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        Self {
            key: key.as_ref().to_vec(),
        }
    }
}

impl HashFunction for HmacSha256HashFunction {
    fn hash(&self, value: &str) -> String {
        // HMAC accepts keys of any length, so this cannot fail.
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key)
            .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
        mac.update(value.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}
