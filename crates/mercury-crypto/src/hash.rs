use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex HMAC-SHA256 tag over `package_uuid` using `server_secret`.
///
/// This tag travels with a bound key so a downstream consumer can later
/// prove a key claimed to come from this service actually did. It is
/// deliberately independent of the pipeline name, and is never itself
/// stored — only computed on demand and handed back to the caller.
pub fn hmac_tag(server_secret: &str, package_uuid: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(server_secret.as_bytes())
        .expect("HMAC accepts a key of any length");
    mac.update(package_uuid.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time verification of a previously issued HMAC tag.
pub fn verify_hmac_tag(server_secret: &str, package_uuid: &str, tag_hex: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(server_secret.as_bytes()) else {
        return false;
    };
    mac.update(package_uuid.as_bytes());
    let Ok(expected) = hex::decode(tag_hex) else {
        return false;
    };
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_is_64_hex_chars() {
        let tag = hmac_tag("secret", "e6de8dd5-4e9a-4c6b-8f3a-1234567890ab");
        assert_eq!(tag.len(), 64);
        assert!(tag.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tag_does_not_vary_by_pipeline() {
        // hmac_tag never takes a pipeline argument, so two binds of the same
        // uuid against different pipelines always produce the same tag.
        let a = hmac_tag("secret", "same-uuid");
        let b = hmac_tag("secret", "same-uuid");
        assert_eq!(a, b);
    }

    #[test]
    fn different_uuids_produce_different_tags() {
        let a = hmac_tag("secret", "uuid-a");
        let b = hmac_tag("secret", "uuid-b");
        assert_ne!(a, b);
    }

    #[test]
    fn verify_round_trips() {
        let tag = hmac_tag("secret", "u");
        assert!(verify_hmac_tag("secret", "u", &tag));
        assert!(!verify_hmac_tag("wrong-secret", "u", &tag));
        assert!(!verify_hmac_tag("secret", "other-uuid", &tag));
    }
}
