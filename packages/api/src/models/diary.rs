use serde::{Deserialize, Serialize};

use super::BookSummary;

/// A user's diary entry for a book. At most one per `(user, book)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub entry_text: String,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Diary entry as returned by the list and by-book endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryEntryWithBook {
    #[serde(flatten)]
    pub entry: DiaryEntry,
    #[serde(default)]
    pub book: Option<BookSummary>,
}

/// Body of `POST /diary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDiaryEntry {
    pub book_id: i64,
    pub entry_text: String,
}

/// Body of `PUT /diary/{entry_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDiaryEntry {
    pub entry_text: String,
}
