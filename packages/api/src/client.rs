//! # Backend gateway client
//!
//! [`ApiClient`] maps each REST endpoint of the BlueberryBooks backend to one
//! typed async method. Every method makes exactly one HTTP attempt and resolves
//! to an [`ApiResult`]; nothing is retried, cached or batched.
//!
//! ## Requests
//!
//! Every request carries `Content-Type: application/json`. When a token is set
//! it also carries `Authorization: Bearer <token>`, exactly once. An expired
//! token is not refreshed: the backend answers 401 and the caller sees an
//! [`ApiError::Http`] it can surface as-is.
//!
//! ## Token lifecycle
//!
//! The token is plain state of the client instance, seeded from its
//! [`TokenStore`] at construction. [`ApiClient::set_token`] is the only way to
//! change it and writes through to the store. Because it takes `&mut self`, no
//! request can be in flight with a stale token.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use store::{MemoryStore, TokenStore};

use crate::error::{ApiError, ApiResult};
use crate::models::*;
use crate::settings::Settings;

/// Result size used by the book search page.
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// Typed client for the BlueberryBooks REST API.
pub struct ApiClient<S = MemoryStore> {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    store: S,
}

impl ApiClient<MemoryStore> {
    /// Client with a throwaway in-memory token store.
    pub fn in_memory(base_url: impl Into<String>) -> Self {
        Self::new(base_url, MemoryStore::new())
    }
}

impl<S: TokenStore> ApiClient<S> {
    /// Create a client for `base_url`, restoring any token persisted in `store`.
    pub fn new(base_url: impl Into<String>, store: S) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let token = store.load().filter(|token| !token.is_empty());
        Self {
            http: reqwest::Client::new(),
            base_url,
            token,
            store,
        }
    }

    pub fn from_settings(settings: &Settings, store: S) -> Self {
        Self::new(settings.base_url(), store)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replace the bearer token. `None` or an empty string clears both the
    /// in-memory token and the persisted copy.
    pub fn set_token(&mut self, token: Option<String>) {
        match token.filter(|token| !token.is_empty()) {
            Some(token) => {
                self.store.save(&token);
                self.token = Some(token);
            }
            None => {
                self.store.clear();
                self.token = None;
            }
        }
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, endpoint))
            .header(CONTENT_TYPE, "application/json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let request = builder.build().map_err(ApiError::network)?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        tracing::debug!(%method, %path, "API request");

        let response = match self.http.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%method, %path, error = %e, "API request failed to send");
                return Err(ApiError::network(e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::from_response(status, &body);
            tracing::warn!(%method, %path, status = status.as_u16(), error = %err, "API request rejected");
            return Err(err);
        }

        let body = response.text().await.map_err(ApiError::network)?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(%method, %path, error = %e, "API response did not decode");
            ApiError::Decode(format!("Invalid response body: {e}"))
        })
    }

    // Authentication

    pub async fn register(&self, username: &str, password: &str) -> ApiResult<AuthResponse> {
        let body = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.send(self.request(Method::POST, "/auth/register").json(&body))
            .await
    }

    /// Log in. Always returns a fresh token for valid credentials; storing it is
    /// the caller's decision (see [`ApiClient::set_token`]).
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<AuthResponse> {
        let body = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.send(self.request(Method::POST, "/auth/login").json(&body))
            .await
    }

    // Books

    /// Search the external catalog through the backend proxy.
    pub async fn search_books(
        &self,
        query: &str,
        limit: u32,
    ) -> ApiResult<SearchResults<BookSearchResult>> {
        let limit = limit.to_string();
        self.send(
            self.request(Method::GET, "/books/search")
                .query(&[("q", query), ("limit", limit.as_str())]),
        )
        .await
    }

    pub async fn get_book(&self, book_id: i64) -> ApiResult<Book> {
        self.send(self.request(Method::GET, &format!("/books/{book_id}")))
            .await
    }

    /// Import a catalog book, or look up the existing import. Idempotent.
    pub async fn add_book(&self, open_library_id: &str) -> ApiResult<AddBookResponse> {
        self.send(
            self.request(Method::POST, "/books/add")
                .query(&[("open_library_id", open_library_id)]),
        )
        .await
    }

    pub async fn mark_book_as_read(&self, book_id: i64) -> ApiResult<MessageResponse> {
        self.send(self.request(Method::POST, &format!("/books/{book_id}/read")))
            .await
    }

    pub async fn get_user_read_books(&self) -> ApiResult<Vec<Book>> {
        self.send(self.request(Method::GET, "/books/user/read"))
            .await
    }

    // Diary entries

    pub async fn get_diary_entries(&self) -> ApiResult<Vec<DiaryEntryWithBook>> {
        self.send(self.request(Method::GET, "/diary")).await
    }

    /// The current user's entry for `book_id`. 404 when there is none.
    pub async fn get_diary_entry(&self, book_id: i64) -> ApiResult<DiaryEntryWithBook> {
        self.send(self.request(Method::GET, &format!("/diary/{book_id}")))
            .await
    }

    pub async fn create_diary_entry(&self, book_id: i64, entry_text: &str) -> ApiResult<DiaryEntry> {
        let body = CreateDiaryEntry {
            book_id,
            entry_text: entry_text.to_string(),
        };
        self.send(self.request(Method::POST, "/diary").json(&body))
            .await
    }

    pub async fn update_diary_entry(&self, entry_id: i64, entry_text: &str) -> ApiResult<DiaryEntry> {
        let body = UpdateDiaryEntry {
            entry_text: entry_text.to_string(),
        };
        self.send(
            self.request(Method::PUT, &format!("/diary/{entry_id}"))
                .json(&body),
        )
        .await
    }

    pub async fn delete_diary_entry(&self, entry_id: i64) -> ApiResult<MessageResponse> {
        self.send(self.request(Method::DELETE, &format!("/diary/{entry_id}")))
            .await
    }

    // Ratings

    pub async fn get_ratings(&self) -> ApiResult<Vec<RatingWithBook>> {
        self.send(self.request(Method::GET, "/ratings")).await
    }

    pub async fn get_top10_ratings(&self) -> ApiResult<Vec<RatingWithBook>> {
        self.send(self.request(Method::GET, "/ratings/top10"))
            .await
    }

    /// The current user's rating for `book_id`. 404 when there is none.
    pub async fn get_rating(&self, book_id: i64) -> ApiResult<RatingWithBook> {
        self.send(self.request(Method::GET, &format!("/ratings/{book_id}")))
            .await
    }

    /// Create the rating for `book_id`, or update it when one exists.
    pub async fn create_or_update_rating(&self, book_id: i64, rating: u8) -> ApiResult<Rating> {
        let body = UpsertRating { book_id, rating };
        self.send(self.request(Method::POST, "/ratings").json(&body))
            .await
    }

    pub async fn delete_rating(&self, rating_id: i64) -> ApiResult<MessageResponse> {
        self.send(self.request(Method::DELETE, &format!("/ratings/{rating_id}")))
            .await
    }

    // Users

    pub async fn search_users(&self, query: &str) -> ApiResult<SearchResults<UserSearchResult>> {
        self.send(
            self.request(Method::GET, "/users/search")
                .query(&[("q", query)]),
        )
        .await
    }

    pub async fn get_user_profile(&self, user_id: i64) -> ApiResult<UserProfileWithBooks> {
        self.send(self.request(Method::GET, &format!("/users/{user_id}/profile")))
            .await
    }

    pub async fn get_own_profile(&self) -> ApiResult<UserProfile> {
        self.send(self.request(Method::GET, "/users/me/profile"))
            .await
    }

    pub async fn follow_user(&self, user_id: i64) -> ApiResult<MessageResponse> {
        self.send(self.request(Method::POST, &format!("/users/{user_id}/follow")))
            .await
    }

    pub async fn unfollow_user(&self, user_id: i64) -> ApiResult<MessageResponse> {
        self.send(self.request(Method::DELETE, &format!("/users/{user_id}/follow")))
            .await
    }

    pub async fn update_privacy(&self, is_private: bool) -> ApiResult<PrivacyResponse> {
        self.send(
            self.request(Method::PUT, "/users/me/privacy")
                .json(&UpdatePrivacy { is_private }),
        )
        .await
    }
}
