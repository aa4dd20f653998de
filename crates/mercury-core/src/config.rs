use std::fmt;

use serde::Deserialize;

use crate::constants::{
    DEFAULT_CACHE_TTL_SECS, DEFAULT_KEY_TTL_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_SERVER_ADDR, DEFAULT_SERVER_READ_TIMEOUT_SECS, DEFAULT_SERVER_WRITE_TIMEOUT_SECS,
    SERVER_SECRET_ENV_VAR,
};
use crate::error::MercuryError;

/// Top-level configuration, loaded once at startup from a YAML file.
///
/// `security.server_secret` additionally falls back to the
/// `MERCURY_SERVER_SECRET` environment variable when the config value is
/// absent or empty.
#[derive(Clone, Deserialize)]
pub struct MercuryConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub mercury: RedisConfig,
    pub pipeline: RedisConfig,
    pub security: SecurityConfig,
    #[serde(default)]
    pub ldap: LdapConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default = "default_key_ttl_secs")]
    pub key_ttl_secs: u64,
}

fn default_key_ttl_secs() -> u64 {
    DEFAULT_KEY_TTL_SECS
}

/// Hand-written `Debug` so secrets never end up in a log line or panic
/// message via a derived impl.
impl fmt::Debug for MercuryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MercuryConfig")
            .field("server", &self.server)
            .field("mercury", &self.mercury)
            .field("pipeline", &self.pipeline)
            .field("security", &self.security)
            .field("ldap", &self.ldap)
            .field("quota", &self.quota)
            .field("key_ttl_secs", &self.key_ttl_secs)
            .finish()
    }
}

#[derive(Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_addr")]
    pub addr: String,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_write_timeout")]
    pub write_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_server_addr() -> String {
    DEFAULT_SERVER_ADDR.to_string()
}
fn default_read_timeout() -> u64 {
    DEFAULT_SERVER_READ_TIMEOUT_SECS
}
fn default_write_timeout() -> u64 {
    DEFAULT_SERVER_WRITE_TIMEOUT_SECS
}
fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
            read_timeout_secs: default_read_timeout(),
            write_timeout_secs: default_write_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("addr", &self.addr)
            .field("read_timeout_secs", &self.read_timeout_secs)
            .field("write_timeout_secs", &self.write_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Connection parameters for one of the two Redis-shaped stores (`mercury`,
/// the volatile key store, or `pipeline`, the persistent store).
#[derive(Clone, Deserialize)]
pub struct RedisConfig {
    pub addr: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub db: i64,
}

impl RedisConfig {
    /// Build a `redis://` connection URL. Never logged in full — see `Debug`.
    pub fn connection_url(&self) -> String {
        match &self.password {
            Some(pw) if !pw.is_empty() => format!("redis://:{pw}@{}/{}", self.addr, self.db),
            _ => format!("redis://{}/{}", self.addr, self.db),
        }
    }
}

impl fmt::Debug for RedisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConfig")
            .field("addr", &self.addr)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("db", &self.db)
            .finish()
    }
}

#[derive(Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub server_secret: Option<String>,
    #[serde(default)]
    pub rate_limit: Option<u32>,
}

impl SecurityConfig {
    /// Resolve the effective HMAC secret: config value first, then
    /// `MERCURY_SERVER_SECRET`. Fails startup if neither is set.
    pub fn resolve_server_secret(&self) -> Result<String, MercuryError> {
        if let Some(s) = &self.server_secret {
            if !s.is_empty() {
                return Ok(s.clone());
            }
        }
        std::env::var(SERVER_SECRET_ENV_VAR).map_err(|_| {
            MercuryError::Config(format!(
                "security.server_secret is not set and {SERVER_SECRET_ENV_VAR} is not set"
            ))
        })
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("server_secret", &self.server_secret.as_ref().map(|_| "<redacted>"))
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}

#[derive(Clone, Deserialize)]
pub struct LdapConfig {
    #[serde(default)]
    pub addr: Option<String>,
    #[serde(default)]
    pub bind_dn: Option<String>,
    #[serde(default)]
    pub bind_password: Option<String>,
    #[serde(default)]
    pub base_dn: Option<String>,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default)]
    pub mock_users_file: Option<String>,
    #[serde(default)]
    pub acl_file: Option<String>,
}

fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

impl Default for LdapConfig {
    fn default() -> Self {
        Self {
            addr: None,
            bind_dn: None,
            bind_password: None,
            base_dn: None,
            cache_ttl_secs: default_cache_ttl(),
            mock_users_file: None,
            acl_file: None,
        }
    }
}

impl fmt::Debug for LdapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LdapConfig")
            .field("addr", &self.addr)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &self.bind_password.as_ref().map(|_| "<redacted>"))
            .field("base_dn", &self.base_dn)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("mock_users_file", &self.mock_users_file)
            .field("acl_file", &self.acl_file)
            .finish()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct QuotaConfig {
    #[serde(default = "default_hourly")]
    pub default_hourly: i64,
    #[serde(default)]
    pub acl_file: Option<String>,
}

fn default_hourly() -> i64 {
    100
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            default_hourly: default_hourly(),
            acl_file: None,
        }
    }
}

impl MercuryConfig {
    /// Load and parse a YAML config file from `path`.
    pub fn load(path: &std::path::Path) -> Result<Self, MercuryError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| MercuryError::Config(format!("reading {}: {e}", path.display())))?;
        serde_yaml::from_str(&text)
            .map_err(|e| MercuryError::Config(format!("parsing {}: {e}", path.display())))
    }
}
