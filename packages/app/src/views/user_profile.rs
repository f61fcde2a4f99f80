use api::{ApiClient, ApiResult, TopRatedBook, UserProfileWithBooks};
use store::TokenStore;

/// Another user's profile as seen by the signed-in user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfilePage {
    pub user_id: i64,
    pub data: UserProfileWithBooks,
}

impl UserProfilePage {
    pub async fn load<S: TokenStore>(client: &ApiClient<S>, user_id: i64) -> ApiResult<Self> {
        let data = client.get_user_profile(user_id).await?;
        Ok(Self { user_id, data })
    }

    pub fn is_following(&self) -> bool {
        self.data.profile.is_following
    }

    pub fn can_view(&self) -> bool {
        self.data.profile.can_view
    }

    /// Top-rated books, or nothing when the profile is private to this viewer.
    pub fn top_rated_books(&self) -> &[TopRatedBook] {
        if self.can_view() {
            &self.data.top_rated_books
        } else {
            &[]
        }
    }

    /// Follow or unfollow depending on the current state, then reload so the
    /// counts and visibility match the backend. The follow state flips as soon
    /// as the backend accepts the change, even if the reload fails.
    pub async fn toggle_follow<S: TokenStore>(&mut self, client: &ApiClient<S>) -> ApiResult<()> {
        if self.is_following() {
            client.unfollow_user(self.user_id).await?;
        } else {
            client.follow_user(self.user_id).await?;
        }
        self.data.profile.is_following = !self.is_following();
        self.data = client.get_user_profile(self.user_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::testing::{StatusCode, StubBackend};

    struct World {
        backend: StubBackend,
        viewer: ApiClient,
        author_id: i64,
    }

    /// A viewer plus an author who has rated and reviewed one book.
    async fn world(author_private: bool) -> World {
        let backend = StubBackend::spawn().await;
        backend.add_catalog_book("OL1W", "Dune", "Frank Herbert");

        let (author_id, author_token) = backend.create_user("author", "pw", author_private);
        let mut author = ApiClient::in_memory(backend.base_url());
        author.set_token(Some(author_token));
        let book_id = author.add_book("OL1W").await.unwrap().book_id;
        author.create_or_update_rating(book_id, 5).await.unwrap();
        author.create_diary_entry(book_id, "Spice").await.unwrap();

        let (_, viewer_token) = backend.create_user("viewer", "pw", false);
        let mut viewer = ApiClient::in_memory(backend.base_url());
        viewer.set_token(Some(viewer_token));

        World {
            backend,
            viewer,
            author_id,
        }
    }

    #[tokio::test]
    async fn test_public_profile_shows_books() {
        let w = world(false).await;

        let page = UserProfilePage::load(&w.viewer, w.author_id).await.unwrap();
        assert!(page.can_view());
        assert!(!page.is_following());
        let books = page.top_rated_books();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].rating, 5);
        assert_eq!(books[0].review.as_deref(), Some("Spice"));
        assert_eq!(
            w.backend.last_request().unwrap().path,
            format!("/api/users/{}/profile", w.author_id)
        );
    }

    #[tokio::test]
    async fn test_private_profile_unlocks_after_follow() {
        let w = world(true).await;

        let mut page = UserProfilePage::load(&w.viewer, w.author_id).await.unwrap();
        assert!(!page.can_view());
        assert!(page.top_rated_books().is_empty());

        page.toggle_follow(&w.viewer).await.unwrap();
        assert!(page.is_following());
        assert!(page.can_view());
        assert_eq!(page.data.profile.followers_count, 1);
        assert_eq!(page.top_rated_books().len(), 1);

        page.toggle_follow(&w.viewer).await.unwrap();
        assert!(!page.is_following());
        assert!(!page.can_view());
        assert_eq!(page.data.profile.followers_count, 0);
    }

    #[tokio::test]
    async fn test_follow_state_survives_failed_reload() {
        let w = world(false).await;
        let mut page = UserProfilePage::load(&w.viewer, w.author_id).await.unwrap();

        let toggle = page.toggle_follow(&w.viewer);
        let arm_reload_failure = async {
            while !w.backend.requests().iter().any(|r| r.path.ends_with("/follow")) {
                tokio::task::yield_now().await;
            }
            w.backend.respond_next(StatusCode::SERVICE_UNAVAILABLE, "");
        };
        let (result, ()) = futures::join!(toggle, arm_reload_failure);
        assert_eq!(result.unwrap_err().status(), Some(503));
        assert!(page.is_following());

        page.toggle_follow(&w.viewer).await.unwrap();
        assert!(!page.is_following());
        assert_eq!(w.backend.requests().iter().filter(|r| r.method == "DELETE").count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let w = world(false).await;

        let err = UserProfilePage::load(&w.viewer, 9999).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.message(), "User not found");
    }
}
