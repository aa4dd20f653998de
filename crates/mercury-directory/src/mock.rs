use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use mercury_core::MercuryError;
use serde::Deserialize;

use crate::DirectoryClient;

#[derive(Deserialize)]
struct MockUser {
    username: String,
    #[serde(default)]
    groups: Vec<String>,
}

/// A fixed-membership directory backed by a JSON fixture file, shaped
/// `[{"username": "...", "groups": ["..."]}]`. Used in place of a real LDAP
/// tree for tests and for deployments small enough not to run one.
pub struct MockDirectoryClient {
    memberships: HashMap<String, Vec<String>>,
}

impl MockDirectoryClient {
    pub fn from_file(path: &Path) -> Result<Self, MercuryError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| MercuryError::Directory(format!("reading {}: {e}", path.display())))?;
        let users: Vec<MockUser> = serde_json::from_str(&text)
            .map_err(|e| MercuryError::Directory(format!("parsing {}: {e}", path.display())))?;
        Ok(Self::from_users(users.into_iter().map(|u| (u.username, u.groups))))
    }

    pub fn from_users<I: IntoIterator<Item = (String, Vec<String>)>>(users: I) -> Self {
        Self {
            memberships: users.into_iter().collect(),
        }
    }
}

#[async_trait]
impl DirectoryClient for MockDirectoryClient {
    async fn is_member(&self, user: &str, group: &str) -> Result<bool, MercuryError> {
        Ok(self
            .memberships
            .get(user)
            .map(|groups| groups.iter().any(|g| g == group))
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> MockDirectoryClient {
        MockDirectoryClient::from_users([
            ("alice".to_string(), vec!["export-pipelines".to_string()]),
            ("bob".to_string(), vec![]),
        ])
    }

    #[tokio::test]
    async fn known_member_is_true() {
        assert!(client().is_member("alice", "export-pipelines").await.unwrap());
    }

    #[tokio::test]
    async fn non_member_is_false() {
        assert!(!client().is_member("bob", "export-pipelines").await.unwrap());
    }

    #[tokio::test]
    async fn unknown_user_is_false() {
        assert!(!client().is_member("nobody", "export-pipelines").await.unwrap());
    }
}
