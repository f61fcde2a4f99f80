//! Authentication session for the client.
//!
//! [`AuthSession`] pairs an [`ApiClient`] with the signed-in [`SessionUser`].
//! The token itself lives in the client (and its store); the session only adds
//! who the token belongs to, so `is_authenticated` holds exactly when both a
//! user and a token are present.

use api::{ApiClient, ApiResult, AuthResponse};
use store::{MemoryStore, TokenStore};

use crate::claims::decode_claims;

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
}

pub struct AuthSession<S = MemoryStore> {
    client: ApiClient<S>,
    user: Option<SessionUser>,
}

impl<S: TokenStore> AuthSession<S> {
    /// Start a session from whatever token `client` restored from its store.
    ///
    /// The user is read from the token's claims without asking the backend. A
    /// token whose claims cannot be read is discarded from memory and storage.
    pub fn restore(mut client: ApiClient<S>) -> Self {
        let user = match client.token().map(decode_claims) {
            None => None,
            Some(Ok(claims)) => Some(SessionUser {
                id: claims.user_id,
                username: claims.sub,
            }),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Discarding unreadable stored token");
                client.set_token(None);
                None
            }
        };
        Self { client, user }
    }

    pub fn client(&self) -> &ApiClient<S> {
        &self.client
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.client.token()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.client.token().is_some()
    }

    /// Log in and adopt the returned token. On failure the session is left
    /// untouched and the backend's error is returned as-is.
    pub async fn login(&mut self, username: &str, password: &str) -> ApiResult<&SessionUser> {
        let auth = self.client.login(username, password).await?;
        Ok(self.establish(auth))
    }

    /// Create an account and sign in as it.
    pub async fn register(&mut self, username: &str, password: &str) -> ApiResult<&SessionUser> {
        let auth = self.client.register(username, password).await?;
        Ok(self.establish(auth))
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            tracing::info!(user_id = user.id, "Signed out");
        }
        self.client.set_token(None);
    }

    fn establish(&mut self, auth: AuthResponse) -> &SessionUser {
        tracing::info!(user_id = auth.user_id, username = %auth.username, "Signed in");
        self.client.set_token(Some(auth.access_token));
        self.user.insert(SessionUser {
            id: auth.user_id,
            username: auth.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::testing::{fake_jwt, StubBackend};

    #[tokio::test]
    async fn test_login_stores_token_and_user() {
        let backend = StubBackend::spawn().await;
        backend.create_user("alice", "x", false);
        let store = MemoryStore::new();
        let mut session = AuthSession::restore(ApiClient::new(backend.base_url(), store.clone()));
        assert!(!session.is_authenticated());

        let user = session.login("alice", "x").await.unwrap().clone();
        assert_eq!(user.username, "alice");
        assert!(session.is_authenticated());
        assert_eq!(store.load().as_deref(), session.token());

        session.client().get_own_profile().await.unwrap();
        let request = backend.last_request().unwrap();
        assert_eq!(request.authorization.len(), 1);
        assert_eq!(
            request.authorization[0],
            format!("Bearer {}", session.token().unwrap())
        );
    }

    #[tokio::test]
    async fn test_failed_login_keeps_previous_session() {
        let backend = StubBackend::spawn().await;
        backend.create_user("alice", "x", false);
        let mut session = AuthSession::restore(ApiClient::in_memory(backend.base_url()));
        session.login("alice", "x").await.unwrap();
        let token = session.token().map(str::to_string);

        let err = session.login("alice", "nope").await.unwrap_err();
        assert_eq!(err.message(), "Incorrect username or password");
        assert!(session.is_authenticated());
        assert_eq!(session.token().map(str::to_string), token);
    }

    #[tokio::test]
    async fn test_register_signs_in() {
        let backend = StubBackend::spawn().await;
        let mut session = AuthSession::restore(ApiClient::in_memory(backend.base_url()));

        let user = session.register("newbie", "pw").await.unwrap();
        assert_eq!(user.username, "newbie");
        assert!(session.is_authenticated());

        let err = session.register("newbie", "pw").await.unwrap_err();
        assert_eq!(err.message(), "Username already exists");
    }

    #[tokio::test]
    async fn test_logout_clears_storage() {
        let backend = StubBackend::spawn().await;
        backend.create_user("alice", "x", false);
        let store = MemoryStore::new();
        let mut session = AuthSession::restore(ApiClient::new(backend.base_url(), store.clone()));
        session.login("alice", "x").await.unwrap();

        session.logout();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
        assert!(session.token().is_none());
        assert!(store.load().is_none());
    }

    #[test]
    fn test_restore_reads_user_from_token() {
        let store = MemoryStore::with_token(fake_jwt("carol", 7, 0));
        let session = AuthSession::restore(ApiClient::new("http://localhost:8000/api", store));
        assert!(session.is_authenticated());
        assert_eq!(
            session.user(),
            Some(&SessionUser {
                id: 7,
                username: "carol".into()
            })
        );
    }

    #[test]
    fn test_restore_discards_unreadable_token() {
        let store = MemoryStore::with_token("not-a-jwt");
        let session = AuthSession::restore(ApiClient::new("http://localhost:8000/api", store.clone()));
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
        assert!(store.load().is_none());
    }

    #[test]
    fn test_restore_without_token() {
        let session = AuthSession::restore(ApiClient::in_memory("http://localhost:8000/api"));
        assert!(session.user().is_none());
        assert!(!session.is_authenticated());
    }
}
