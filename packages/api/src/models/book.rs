use serde::{Deserialize, Serialize};

/// A catalog hit from `GET /books/search`. Not yet imported, so it carries only
/// the external Open Library identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSearchResult {
    pub open_library_id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub published_year: Option<i32>,
}

/// A book imported into the backend. `id` is assigned on first import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub open_library_id: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub published_year: Option<i32>,
}

/// Abbreviated book embedded in diary and rating responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSummary {
    pub id: i64,
    #[serde(default)]
    pub open_library_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
}

impl BookSummary {
    /// Identifier used to link to the book page: the external id when known,
    /// otherwise the internal one.
    pub fn link_id(&self) -> String {
        self.open_library_id
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// Result of `POST /books/add`. The backend returns the existing id when the
/// book was imported before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddBookResponse {
    pub book_id: i64,
    pub message: String,
}
