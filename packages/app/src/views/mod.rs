//! Page workflows.
//!
//! Each module holds the request sequence behind one page of the client. They
//! take the gateway by reference and return plain data; the frontend decides
//! how to render it and shows any [`api::ApiError`] message verbatim.

mod book;
mod dashboard;
mod profile;
mod search;
mod user_profile;

pub use book::BookDetail;
pub use dashboard::Dashboard;
pub use profile::OwnProfile;
pub use search::{search_books, search_users};
pub use user_profile::UserProfilePage;

use api::ApiResult;

/// Treat a 404 as "nothing there yet".
pub(crate) fn absent_on_404<T>(result: ApiResult<T>) -> ApiResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
