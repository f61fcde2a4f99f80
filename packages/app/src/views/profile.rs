use api::{ApiClient, ApiResult, UserProfile};
use store::TokenStore;

/// The signed-in user's own profile page.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnProfile {
    pub profile: UserProfile,
}

impl OwnProfile {
    pub async fn load<S: TokenStore>(client: &ApiClient<S>) -> ApiResult<Self> {
        let profile = client.get_own_profile().await?;
        Ok(Self { profile })
    }

    pub fn is_private(&self) -> bool {
        self.profile.is_private
    }

    /// Switch between public and private. The value the backend confirms is
    /// the one kept.
    pub async fn set_private<S: TokenStore>(&mut self, client: &ApiClient<S>, is_private: bool) -> ApiResult<()> {
        let confirmed = client.update_privacy(is_private).await?;
        tracing::info!(is_private = confirmed.is_private, "Privacy updated");
        self.profile.is_private = confirmed.is_private;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::testing::StubBackend;

    #[tokio::test]
    async fn test_load_counts() {
        let backend = StubBackend::spawn().await;
        let (alice, token) = backend.create_user("alice", "pw", false);
        let (bob, _) = backend.create_user("bob", "pw", false);
        backend.follow(bob, alice);
        let mut client = ApiClient::in_memory(backend.base_url());
        client.set_token(Some(token));

        let own = OwnProfile::load(&client).await.unwrap();
        assert_eq!(own.profile.id, alice);
        assert_eq!(own.profile.username, "alice");
        assert_eq!(own.profile.followers_count, 1);
        assert_eq!(own.profile.following_count, 0);
        assert!(!own.is_private());
    }

    #[tokio::test]
    async fn test_toggle_privacy() {
        let backend = StubBackend::spawn().await;
        let (_, token) = backend.create_user("alice", "pw", false);
        let mut client = ApiClient::in_memory(backend.base_url());
        client.set_token(Some(token));

        let mut own = OwnProfile::load(&client).await.unwrap();
        own.set_private(&client, true).await.unwrap();
        assert!(own.is_private());

        let reloaded = OwnProfile::load(&client).await.unwrap();
        assert!(reloaded.is_private());
    }

    #[tokio::test]
    async fn test_requires_sign_in() {
        let backend = StubBackend::spawn().await;
        let client = ApiClient::in_memory(backend.base_url());

        let err = OwnProfile::load(&client).await.unwrap_err();
        assert!(err.is_unauthorized());
    }
}
