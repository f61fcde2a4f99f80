use api::{ApiClient, ApiError, ApiResult, Book, DiaryEntry, Rating};
use store::TokenStore;
use tracing::{debug, warn};

use super::absent_on_404;

/// Everything the book page shows for one work, plus the signed-in user's
/// diary entry, rating and read status for it.
#[derive(Debug, Clone, PartialEq)]
pub struct BookDetail {
    pub book: Book,
    pub diary_entry: Option<DiaryEntry>,
    pub rating: Option<Rating>,
    pub is_read: bool,
    /// Failures of the per-user lookups. The book itself still loaded; the
    /// affected fields fall back to "none" and "not read".
    pub errors: Vec<ApiError>,
}

impl BookDetail {
    /// Open a book by its Open Library work id.
    ///
    /// The work is imported first (get-or-create), so the page always has a
    /// local id to attach diary entries and ratings to. Missing diary entries
    /// and ratings are normal and come back as `None`. Only the import and the
    /// book fetch can fail the page; other failures are kept in `errors`.
    pub async fn open<S: TokenStore>(client: &ApiClient<S>, open_library_id: &str) -> ApiResult<Self> {
        let book_id = client.add_book(open_library_id).await?.book_id;
        let book = client.get_book(book_id).await?;

        let (diary, rating, read_books) = futures::join!(
            client.get_diary_entry(book_id),
            client.get_rating(book_id),
            client.get_user_read_books(),
        );
        let mut errors = Vec::new();
        let diary_entry = section(absent_on_404(diary), &mut errors)
            .flatten()
            .map(|d| d.entry);
        let rating = section(absent_on_404(rating), &mut errors)
            .flatten()
            .map(|r| r.rating);
        let is_read = section(read_books, &mut errors)
            .is_some_and(|books| books.iter().any(|b| b.id == book_id));

        debug!(book_id, open_library_id, is_read, failed = errors.len(), "Opened book");
        Ok(Self {
            book,
            diary_entry,
            rating,
            is_read,
            errors,
        })
    }

    pub fn book_id(&self) -> i64 {
        self.book.id
    }

    pub async fn mark_read<S: TokenStore>(&mut self, client: &ApiClient<S>) -> ApiResult<()> {
        client.mark_book_as_read(self.book.id).await?;
        self.is_read = true;
        Ok(())
    }

    /// Create the diary entry, or update it when one already exists.
    pub async fn save_diary_entry<S: TokenStore>(
        &mut self,
        client: &ApiClient<S>,
        entry_text: &str,
    ) -> ApiResult<&DiaryEntry> {
        let entry = match &self.diary_entry {
            Some(existing) => client.update_diary_entry(existing.id, entry_text).await?,
            None => client.create_diary_entry(self.book.id, entry_text).await?,
        };
        Ok(&*self.diary_entry.insert(entry))
    }

    /// Remove the diary entry. Does nothing when there is none.
    pub async fn delete_diary_entry<S: TokenStore>(&mut self, client: &ApiClient<S>) -> ApiResult<()> {
        if let Some(entry) = &self.diary_entry {
            client.delete_diary_entry(entry.id).await?;
            self.diary_entry = None;
        }
        Ok(())
    }

    /// Set the star rating. The backend rejects values outside 1..=5.
    pub async fn rate<S: TokenStore>(&mut self, client: &ApiClient<S>, stars: u8) -> ApiResult<&Rating> {
        let rating = client.create_or_update_rating(self.book.id, stars).await?;
        Ok(&*self.rating.insert(rating))
    }

    pub async fn clear_rating<S: TokenStore>(&mut self, client: &ApiClient<S>) -> ApiResult<()> {
        if let Some(rating) = &self.rating {
            client.delete_rating(rating.id).await?;
            self.rating = None;
        }
        Ok(())
    }
}

fn section<T>(result: ApiResult<T>, errors: &mut Vec<ApiError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, "Book page section failed to load");
            errors.push(e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::testing::{RecordedRequest, StatusCode, StubBackend};

    async fn signed_in(backend: &StubBackend) -> ApiClient {
        backend.add_catalog_book("OL45804W", "Fantastic Mr Fox", "Roald Dahl");
        let (_, token) = backend.create_user("alice", "pw", false);
        let mut client = ApiClient::in_memory(backend.base_url());
        client.set_token(Some(token));
        client
    }

    #[tokio::test]
    async fn test_open_fresh_book() {
        let backend = StubBackend::spawn().await;
        let client = signed_in(&backend).await;

        let detail = BookDetail::open(&client, "OL45804W").await.unwrap();
        assert_eq!(detail.book.title, "Fantastic Mr Fox");
        assert_eq!(detail.book.open_library_id, "OL45804W");
        assert!(detail.diary_entry.is_none());
        assert!(detail.rating.is_none());
        assert!(!detail.is_read);
        assert!(detail.errors.is_empty());
    }

    #[tokio::test]
    async fn test_failed_lookup_keeps_book() {
        let backend = StubBackend::spawn().await;
        let client = signed_in(&backend).await;
        let book_id = client.add_book("OL45804W").await.unwrap().book_id;
        client.mark_book_as_read(book_id).await.unwrap();
        client.create_or_update_rating(book_id, 2).await.unwrap();
        client.create_diary_entry(book_id, "Foxy").await.unwrap();

        // Import and fetch succeed; the first of the three joined lookups fails.
        let open = BookDetail::open(&client, "OL45804W");
        let watcher = async {
            let fetched = |r: &RecordedRequest| r.method == "GET" && r.path.starts_with("/api/books/");
            while !backend.requests().iter().any(fetched) {
                tokio::task::yield_now().await;
            }
            backend.respond_next(StatusCode::INTERNAL_SERVER_ERROR, "oops");
        };
        let (detail, ()) = futures::join!(open, watcher);
        let detail = detail.unwrap();

        assert_eq!(detail.book.title, "Fantastic Mr Fox");
        assert_eq!(detail.errors.len(), 1);
        assert_eq!(detail.errors[0].message(), "Internal Server Error");
        let loaded = [
            detail.diary_entry.is_some(),
            detail.rating.is_some(),
            detail.is_read,
        ];
        assert_eq!(loaded.iter().filter(|ok| **ok).count(), 2);
    }

    #[tokio::test]
    async fn test_reopen_reflects_saved_state() {
        let backend = StubBackend::spawn().await;
        let client = signed_in(&backend).await;

        let mut detail = BookDetail::open(&client, "OL45804W").await.unwrap();
        detail.mark_read(&client).await.unwrap();
        detail.save_diary_entry(&client, "Great!").await.unwrap();
        detail.rate(&client, 4).await.unwrap();

        let reopened = BookDetail::open(&client, "OL45804W").await.unwrap();
        assert_eq!(reopened.book_id(), detail.book_id());
        assert!(reopened.is_read);
        assert_eq!(reopened.diary_entry.as_ref().unwrap().entry_text, "Great!");
        assert_eq!(reopened.rating.as_ref().unwrap().rating, 4);
    }

    #[tokio::test]
    async fn test_save_diary_entry_updates_existing() {
        let backend = StubBackend::spawn().await;
        let client = signed_in(&backend).await;

        let mut detail = BookDetail::open(&client, "OL45804W").await.unwrap();
        let first_id = detail.save_diary_entry(&client, "First").await.unwrap().id;
        let updated = detail.save_diary_entry(&client, "Second").await.unwrap();
        assert_eq!(updated.id, first_id);
        assert_eq!(updated.entry_text, "Second");
        assert_eq!(backend.last_request().unwrap().method, "PUT");

        detail.delete_diary_entry(&client).await.unwrap();
        assert!(detail.diary_entry.is_none());
        let reopened = BookDetail::open(&client, "OL45804W").await.unwrap();
        assert!(reopened.diary_entry.is_none());
    }

    #[tokio::test]
    async fn test_rating_lifecycle() {
        let backend = StubBackend::spawn().await;
        let client = signed_in(&backend).await;

        let mut detail = BookDetail::open(&client, "OL45804W").await.unwrap();
        let rating_id = detail.rate(&client, 3).await.unwrap().id;
        assert_eq!(detail.rate(&client, 5).await.unwrap().id, rating_id);

        let err = detail.rate(&client, 6).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(detail.rating.as_ref().unwrap().rating, 5);

        detail.clear_rating(&client).await.unwrap();
        assert!(detail.rating.is_none());
        assert!(client.get_ratings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_work_is_an_error() {
        let backend = StubBackend::spawn().await;
        let client = signed_in(&backend).await;

        let err = BookDetail::open(&client, "OL0W").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.message(), "Book not found in Open Library");
    }
}
