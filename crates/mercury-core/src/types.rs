use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// Integer credit balance for a quota deduction.
pub type Credits = i64;

// ── PackageUuid ──────────────────────────────────────────────────────────────

/// A caller-chosen unique identifier for an encrypted artifact — the key-store key.
///
/// Deliberately a thin wrapper over `String` rather than `uuid::Uuid`: the
/// spec never requires the value to *be* a RFC 4122 UUID, only that callers
/// treat it as an opaque namespace they own. Validation (non-empty) happens
/// at the API boundary, not here.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageUuid(pub String);

impl PackageUuid {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PackageUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackageUuid({})", self.0)
    }
}

// ── PipelineName / GroupName / Caller ───────────────────────────────────────

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct PipelineName(pub String);

impl fmt::Display for PipelineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct GroupName(pub String);

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The identity presented by a caller of `bind`. An empty caller is the
/// documented service-to-service escape hatch — represented here as
/// `Caller::Anonymous` rather than an empty string so the bypass is a
/// type-level fact, not a string comparison scattered across the codebase.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Caller {
    Named(String),
    Anonymous,
}

impl Caller {
    pub fn from_input(raw: &str) -> Self {
        if raw.is_empty() {
            Caller::Anonymous
        } else {
            Caller::Named(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Caller::Named(s) => s,
            Caller::Anonymous => "",
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Caller::Anonymous)
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── RequestId ────────────────────────────────────────────────────────────────

/// Fresh 8-byte random hex string identifying one bind attempt.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 8];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", self.0)
    }
}

// ── RequestState ─────────────────────────────────────────────────────────────

/// Lifecycle state of a single bind attempt. Transitions allowed:
/// `∅ → Approved`, `∅ → Rejected`, `Approved → Consumed`. All other
/// transitions are illegal and unreachable through the tracker's API.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    Approved,
    Rejected,
    Consumed,
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestState::Approved => "approved",
            RequestState::Rejected => "rejected",
            RequestState::Consumed => "consumed",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_caller_is_anonymous() {
        assert!(Caller::from_input("").is_anonymous());
        assert_eq!(Caller::from_input("").as_str(), "");
    }

    #[test]
    fn non_empty_caller_is_named() {
        let c = Caller::from_input("alice");
        assert!(!c.is_anonymous());
        assert_eq!(c.as_str(), "alice");
    }

    #[test]
    fn request_id_is_16_hex_chars() {
        let id = RequestId::generate();
        assert_eq!(id.as_str().len(), 16);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn request_ids_are_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a.as_str(), b.as_str());
    }

    #[test]
    fn request_state_serializes_lowercase() {
        let json = serde_json::to_string(&RequestState::Approved).unwrap();
        assert_eq!(json, "\"approved\"");
    }
}
