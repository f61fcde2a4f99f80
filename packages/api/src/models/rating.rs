use serde::{Deserialize, Serialize};

use super::BookSummary;

/// A 1-5 star rating. At most one per `(user, book)`; posting again updates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub rating: u8,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingWithBook {
    #[serde(flatten)]
    pub rating: Rating,
    #[serde(default)]
    pub book: Option<BookSummary>,
}

/// Body of `POST /ratings`, which creates or updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertRating {
    pub book_id: i64,
    pub rating: u8,
}
