//! # Wire models for the BlueberryBooks REST API
//!
//! Plain records mirrored from the backend's JSON. The client never mutates or
//! caches them; they live only as long as the page state holding them.
//!
//! | Module | Types |
//! |--------|-------|
//! | [`auth`] | [`Credentials`], [`AuthResponse`] |
//! | [`book`] | [`Book`], [`BookSearchResult`], [`BookSummary`], [`AddBookResponse`] |
//! | [`diary`] | [`DiaryEntry`], [`DiaryEntryWithBook`] and request bodies |
//! | [`rating`] | [`Rating`], [`RatingWithBook`] and request bodies |
//! | [`user`] | [`UserSearchResult`], [`UserProfile`], [`UserProfileWithBooks`], [`TopRatedBook`] |
//!
//! Fields the backend may omit or send as `null` are `Option`s. Timestamps are
//! kept as the ISO-8601 strings the backend sends.

use serde::{Deserialize, Serialize};

pub mod auth;
pub mod book;
pub mod diary;
pub mod rating;
pub mod user;

pub use auth::{AuthResponse, Credentials};
pub use book::{AddBookResponse, Book, BookSearchResult, BookSummary};
pub use diary::{CreateDiaryEntry, DiaryEntry, DiaryEntryWithBook, UpdateDiaryEntry};
pub use rating::{Rating, RatingWithBook, UpsertRating};
pub use user::{
    PrivacyResponse, TopRatedBook, UpdatePrivacy, UserProfile, UserProfileWithBooks,
    UserSearchResult,
};

/// Acknowledgement returned by mutating endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Envelope used by the search endpoints: `{"results": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults<T> {
    pub results: Vec<T>,
}
