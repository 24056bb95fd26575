use std::sync::Arc;

use sha2::{Digest, Sha256};
use signplay_core::model::{UserAggregate, UserId};
use storage::repository::{NewUserRecord, StorageError, UserRepository};
use tracing::info;
use uuid::Uuid;

use crate::error::StatsError;

/// A verified caller, as produced by `UserService::authenticate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub name: String,
}

impl From<&UserAggregate> for Identity {
    fn from(user: &UserAggregate) -> Self {
        Self {
            user_id: user.user_id(),
            name: user.name().to_owned(),
        }
    }
}

/// A freshly created account and the only copy of its access token.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: UserAggregate,
    pub token: String,
}

/// Account creation and bearer-token verification.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Create a player with zeroed statistics and issue an access token.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::User` for an invalid name, or `StatsError::Storage`
    /// if the insert fails.
    pub async fn register(&self, name: &str) -> Result<Registration, StatsError> {
        UserAggregate::new(UserId::new(0), name)?;
        let token = Uuid::new_v4().simple().to_string();
        let user = self
            .users
            .insert_user(NewUserRecord {
                name: name.to_owned(),
                token_digest: token_digest(&token),
            })
            .await?;
        info!(user_id = %user.user_id(), "registered player");
        Ok(Registration { user, token })
    }

    /// Resolve a bearer token to its owner.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Unauthorized` for blank or unknown tokens.
    pub async fn authenticate(&self, token: &str) -> Result<Identity, StatsError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(StatsError::Unauthorized);
        }
        match self.users.find_by_token_digest(&token_digest(token)).await {
            Ok(user) => Ok(Identity::from(&user)),
            Err(StorageError::NotFound) => Err(StatsError::Unauthorized),
            Err(other) => Err(StatsError::Storage(other)),
        }
    }
}

/// Lowercase hex SHA-256 of `token`; the form kept in storage.
#[must_use]
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;

    fn service() -> UserService {
        UserService::new(Arc::new(InMemoryRepository::new()))
    }

    #[test]
    fn digest_is_sha256_hex() {
        assert_eq!(
            token_digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn registered_token_authenticates() {
        let users = service();
        let reg = users.register("ada").await.unwrap();
        assert_eq!(reg.user.total_games_played(), 0);
        assert_eq!(reg.token.len(), 32);

        let who = users.authenticate(&reg.token).await.unwrap();
        assert_eq!(who.user_id, reg.user.user_id());
        assert_eq!(who.name, "ada");
    }

    #[tokio::test]
    async fn unknown_or_blank_tokens_are_unauthorized() {
        let users = service();
        users.register("ada").await.unwrap();
        for token in ["", "   ", "not-a-token"] {
            assert!(matches!(
                users.authenticate(token).await,
                Err(StatsError::Unauthorized)
            ));
        }
    }

    #[tokio::test]
    async fn blank_name_is_a_user_error() {
        let err = service().register("  ").await.unwrap_err();
        assert!(matches!(err, StatsError::User(_)));
    }
}
