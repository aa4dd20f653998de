use async_trait::async_trait;
use ldap3::{LdapConnAsync, Scope, SearchEntry};
use mercury_core::MercuryError;
use tracing::warn;

use crate::DirectoryClient;

/// Binds to a real LDAP/Active Directory tree for each lookup.
///
/// Membership is resolved transitively via the AD-specific
/// `1.2.840.113556.1.4.1941` matching rule, which walks nested groups
/// server-side in a single search rather than requiring this client to
/// recurse. Directories without that OID extension (plain OpenLDAP) fall
/// back to a direct `memberOf` equality check, which only covers direct
/// membership — acceptable given the ACL model assumes group membership is
/// already flattened upstream in that case.
pub struct LdapDirectoryClient {
    addr: String,
    bind_dn: String,
    bind_password: String,
    base_dn: String,
    transitive: bool,
}

impl LdapDirectoryClient {
    pub fn new(addr: String, bind_dn: String, bind_password: String, base_dn: String) -> Self {
        Self {
            addr,
            bind_dn,
            bind_password,
            base_dn,
            transitive: true,
        }
    }

    /// Disable the AD transitive-membership OID and fall back to a direct
    /// `memberOf` check — for plain OpenLDAP directories.
    pub fn without_transitive_membership(mut self) -> Self {
        self.transitive = false;
        self
    }

    /// Filter that finds the user entry itself, constraining on its
    /// `memberOf` attribute — searching from the user side (rather than
    /// walking the group's `member` attribute) is what lets the transitive
    /// OID do the nested-group walk server-side.
    fn member_filter(&self, user: &str, group_dn: &str) -> String {
        if self.transitive {
            format!("(&(sAMAccountName={user})(memberOf:1.2.840.113556.1.4.1941:={group_dn}))")
        } else {
            format!("(&(sAMAccountName={user})(memberOf={group_dn}))")
        }
    }
}

#[async_trait]
impl DirectoryClient for LdapDirectoryClient {
    async fn is_member(&self, user: &str, group: &str) -> Result<bool, MercuryError> {
        let (conn, mut ldap) = LdapConnAsync::new(&self.addr)
            .await
            .map_err(|e| MercuryError::Directory(format!("connecting to {}: {e}", self.addr)))?;
        ldap3::drive!(conn);

        ldap.simple_bind(&self.bind_dn, &self.bind_password)
            .await
            .map_err(|e| MercuryError::Directory(format!("binding as {}: {e}", self.bind_dn)))?
            .success()
            .map_err(|e| MercuryError::Directory(format!("bind rejected: {e}")))?;

        let group_dn = format!("cn={group},{}", self.base_dn);
        let filter = self.member_filter(user, &group_dn);

        let (results, _res) = ldap
            .search(&self.base_dn, Scope::Subtree, &filter, vec!["dn"])
            .await
            .map_err(|e| MercuryError::Directory(format!("search failed: {e}")))?
            .success()
            .map_err(|e| MercuryError::Directory(format!("search rejected: {e}")))?;

        if let Err(e) = ldap.unbind().await {
            warn!(error = %e, "ldap unbind failed, continuing");
        }

        Ok(!results.into_iter().map(SearchEntry::construct).collect::<Vec<_>>().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> LdapDirectoryClient {
        LdapDirectoryClient::new(
            "ldap://dc.example.com".to_string(),
            "cn=svc,dc=example,dc=com".to_string(),
            "secret".to_string(),
            "dc=example,dc=com".to_string(),
        )
    }

    #[test]
    fn transitive_filter_searches_by_samaccountname_and_memberof_oid() {
        let filter = client().member_filter("alice", "cn=eng,dc=example,dc=com");
        assert_eq!(
            filter,
            "(&(sAMAccountName=alice)(memberOf:1.2.840.113556.1.4.1941:=cn=eng,dc=example,dc=com))"
        );
    }

    #[test]
    fn non_transitive_filter_drops_the_oid() {
        let filter = client()
            .without_transitive_membership()
            .member_filter("alice", "cn=eng,dc=example,dc=com");
        assert_eq!(filter, "(&(sAMAccountName=alice)(memberOf=cn=eng,dc=example,dc=com))");
    }
}
