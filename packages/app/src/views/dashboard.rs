use api::{ApiClient, ApiError, ApiResult, Book, DiaryEntryWithBook, RatingWithBook};
use store::TokenStore;

/// The three sections of the dashboard. Each is fetched independently, so one
/// failing section does not hide the others.
#[derive(Debug)]
pub struct Dashboard {
    pub read_books: ApiResult<Vec<Book>>,
    pub top_ratings: ApiResult<Vec<RatingWithBook>>,
    pub diary_entries: ApiResult<Vec<DiaryEntryWithBook>>,
}

impl Dashboard {
    /// Fetch all sections concurrently.
    pub async fn load<S: TokenStore>(client: &ApiClient<S>) -> Self {
        let (read_books, top_ratings, diary_entries) = futures::join!(
            client.get_user_read_books(),
            client.get_top10_ratings(),
            client.get_diary_entries(),
        );
        Self {
            read_books,
            top_ratings,
            diary_entries,
        }
    }

    pub fn read_books(&self) -> &[Book] {
        self.read_books.as_deref().unwrap_or_default()
    }

    pub fn top_ratings(&self) -> &[RatingWithBook] {
        self.top_ratings.as_deref().unwrap_or_default()
    }

    pub fn diary_entries(&self) -> &[DiaryEntryWithBook] {
        self.diary_entries.as_deref().unwrap_or_default()
    }

    /// Errors from sections that failed to load.
    pub fn errors(&self) -> Vec<&ApiError> {
        [
            self.read_books.as_ref().err(),
            self.top_ratings.as_ref().err(),
            self.diary_entries.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
