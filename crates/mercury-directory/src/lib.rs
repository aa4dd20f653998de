//! Group-membership lookups used by the admission pipeline's ACL gate.
//!
//! Three implementations share one trait: [`MockDirectoryClient`] reads a
//! JSON fixture for tests and air-gapped deployments, [`LdapDirectoryClient`]
//! binds to a real LDAP/AD tree, and [`DirectoryCache`] wraps either behind a
//! short-lived Redis cache so a busy pipeline doesn't round-trip to LDAP on
//! every bind.

pub mod cache;
pub mod ldap;
pub mod mock;

use async_trait::async_trait;
use mercury_core::MercuryError;

/// A source of truth for "is this user transitively a member of this group".
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn is_member(&self, user: &str, group: &str) -> Result<bool, MercuryError>;
}

pub use cache::DirectoryCache;
pub use ldap::LdapDirectoryClient;
pub use mock::MockDirectoryClient;
