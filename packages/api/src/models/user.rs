//! # Social models
//!
//! A [`UserProfile`] carries follower counts and the requester's relationship to
//! the profile owner. `can_view` is computed by the backend from `is_private`
//! and the follow graph; when it is `false` the backend sends no
//! `top_rated_books`, which deserializes to an empty list.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSearchResult {
    pub id: i64,
    pub username: String,
    pub is_private: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub is_private: bool,
    pub followers_count: u64,
    pub following_count: u64,
    #[serde(default)]
    pub is_following: bool,
    #[serde(default)]
    pub is_friend: bool,
    #[serde(default = "default_can_view")]
    pub can_view: bool,
}

fn default_can_view() -> bool {
    true
}

/// A rated book shown on another user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopRatedBook {
    pub book_id: i64,
    #[serde(default)]
    pub open_library_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    pub rating: u8,
    #[serde(default)]
    pub review: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfileWithBooks {
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(default)]
    pub top_rated_books: Vec<TopRatedBook>,
}

/// Body of `PUT /users/me/privacy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePrivacy {
    pub is_private: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacyResponse {
    pub message: String,
    pub is_private: bool,
}
