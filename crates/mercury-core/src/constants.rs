//! ─── xzmercury constants ────────────────────────────────────────────────────
//!
//! Defaults for every TTL and size the service depends on. All of these are
//! overridable from `MercuryConfig`; these are only the fallback values used
//! when a config field is absent.

/// AES-256 key size in bytes.
pub const KEY_SIZE_BYTES: usize = 32;

/// Default TTL for a bound key (`mercury:key:{uuid}`).
pub const DEFAULT_KEY_TTL_SECS: u64 = 5 * 60;

/// TTL for a quota balance (`quota:{group}:{YYYYMMDDHH}`) — always exactly
/// one hour; not configurable, since the window itself is the hour.
pub const QUOTA_TTL_SECS: u64 = 3600;

/// Default TTL for a directory membership cache entry.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 120;

/// TTL for a persisted request record.
pub const REQUEST_TTL_SECS: u64 = 24 * 3600;

/// Default request-level timeout for the admission pipeline.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default HTTP server bind address.
pub const DEFAULT_SERVER_ADDR: &str = ":3000";

/// Default read/write timeouts for the HTTP server.
pub const DEFAULT_SERVER_READ_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SERVER_WRITE_TIMEOUT_SECS: u64 = 10;

/// Environment variable carrying the HMAC server secret as a fallback for
/// `security.server_secret` in the config file.
pub const SERVER_SECRET_ENV_VAR: &str = "MERCURY_SERVER_SECRET";

/// Pub/sub channel that every request-state transition is published on.
pub const EVENTS_CHANNEL: &str = "xzmercury:events";

/// Key-layout prefixes — part of the persistent cross-implementation contract
/// (spec §6). Never change these without a migration plan.
pub const KEY_PREFIX: &str = "mercury:key";
pub const QUOTA_PREFIX: &str = "quota";
pub const MEMBER_CACHE_PREFIX: &str = "ldap:member";
pub const REQUEST_PREFIX: &str = "request";
