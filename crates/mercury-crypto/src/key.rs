use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use zeroize::Zeroizing;

use mercury_core::KEY_SIZE_BYTES;

/// A freshly generated AES-256 key, held as a zeroizing buffer until it is
/// base64-encoded for storage. The raw bytes never leave this module: callers
/// only ever see the encoded string, since raw key bytes must never be
/// logged or retained in process memory longer than necessary.
pub struct GeneratedKey {
    bytes: Zeroizing<[u8; KEY_SIZE_BYTES]>,
}

impl GeneratedKey {
    /// Generate 32 bytes from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self {
            bytes: Zeroizing::new(bytes),
        }
    }

    /// Standard base64 encoding of the raw key, suitable for storage and for
    /// returning to the caller over HTTP.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&*self.bytes)
    }
}

impl std::fmt::Debug for GeneratedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedKey").field("bytes", &"<redacted>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_32_bytes_base64_encoded() {
        let key = GeneratedKey::generate();
        let encoded = key.to_base64();
        let decoded = STANDARD.decode(&encoded).unwrap();
        assert_eq!(decoded.len(), KEY_SIZE_BYTES);
    }

    #[test]
    fn two_generated_keys_differ() {
        let a = GeneratedKey::generate().to_base64();
        let b = GeneratedKey::generate().to_base64();
        assert_ne!(a, b);
    }

    #[test]
    fn debug_never_prints_raw_bytes() {
        let key = GeneratedKey::generate();
        let debug = format!("{key:?}");
        assert!(!debug.contains(&key.to_base64()));
    }
}
