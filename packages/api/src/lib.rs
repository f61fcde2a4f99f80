//! # API crate: typed gateway to the BlueberryBooks backend
//!
//! Every page of the BlueberryBooks client talks to the backend through this
//! crate. It owns the wire models, the HTTP client, the error taxonomy and the
//! client configuration; it depends on nothing else in the workspace except the
//! [`store`] crate for token persistence.
//!
//! ## Modules
//!
//! | Module | Feature gate | Purpose |
//! |--------|-------------|---------|
//! | [`client`] | - | [`ApiClient`]: one async method per REST endpoint, bearer-token attachment |
//! | [`error`] | - | [`ApiError`] / [`ApiResult`]: network, HTTP and decode failures flattened to a message |
//! | [`models`] | - | Serde records mirrored from the backend's JSON |
//! | [`settings`] | - | [`Settings`] loaded from defaults, `blueberry.toml` and `BLUEBERRY_*` env vars |
//! | [`testing`] | `test-support` | [`testing::StubBackend`], an in-process axum server speaking the same contract |
//!
//! ## Endpoints
//!
//! - **Authentication**: `register`, `login`
//! - **Books**: `search_books`, `get_book`, `add_book`, `mark_book_as_read`, `get_user_read_books`
//! - **Diary**: `get_diary_entries`, `get_diary_entry`, `create_diary_entry`, `update_diary_entry`, `delete_diary_entry`
//! - **Ratings**: `get_ratings`, `get_top10_ratings`, `get_rating`, `create_or_update_rating`, `delete_rating`
//! - **Users**: `search_users`, `get_user_profile`, `get_own_profile`, `follow_user`, `unfollow_user`, `update_privacy`

pub mod client;
pub mod error;
pub mod models;
pub mod settings;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use client::{ApiClient, DEFAULT_SEARCH_LIMIT};
pub use error::{ApiError, ApiResult};
pub use models::*;
pub use settings::Settings;
