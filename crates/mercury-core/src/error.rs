use thiserror::Error;

/// Unified error taxonomy for the xzmercury core. Every admission-pipeline
/// failure mode maps to exactly one variant here, and `http_status_code` is
/// the single place that maps a variant to an HTTP status code — handlers in
/// `mercury-api` never choose a status code themselves.
#[derive(Debug, Error)]
pub enum MercuryError {
    // ── Input errors (400) ───────────────────────────────────────────────────
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    // ── Authorization (403) ──────────────────────────────────────────────────
    #[error("caller {caller} is not a member of required group {group}")]
    NotAuthorized { caller: String, group: String },

    // ── Quota exhaustion (429) ───────────────────────────────────────────────
    #[error("hourly quota exceeded for group {group}")]
    QuotaExceeded { group: String },

    // ── Not found (404) ──────────────────────────────────────────────────────
    #[error("key not found or already consumed")]
    KeyNotFound,

    #[error("request not found: {0}")]
    RequestNotFound(String),

    // ── Upstream / storage errors (500) ──────────────────────────────────────
    #[error("directory error: {0}")]
    Directory(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("quota script error: {0}")]
    Quota(String),

    #[error("tracker error: {0}")]
    Tracker(String),

    #[error("request timed out")]
    Timeout,

    // ── Startup / configuration errors (not runtime errors) ──────────────────
    #[error("configuration error: {0}")]
    Config(String),

    #[error("privilege violation: {0}")]
    Privilege(String),
}

impl MercuryError {
    /// The one and only place an error variant becomes an HTTP status code.
    pub fn http_status_code(&self) -> u16 {
        match self {
            MercuryError::MissingField(_) | MercuryError::MalformedBody(_) => 400,
            MercuryError::NotAuthorized { .. } => 403,
            MercuryError::QuotaExceeded { .. } => 429,
            MercuryError::KeyNotFound | MercuryError::RequestNotFound(_) => 404,
            MercuryError::Directory(_)
            | MercuryError::Store(_)
            | MercuryError::Quota(_)
            | MercuryError::Tracker(_)
            | MercuryError::Timeout => 500,
            MercuryError::Config(_) | MercuryError::Privilege(_) => 500,
        }
    }
}
