use api::{ApiClient, ApiResult, BookSearchResult, UserSearchResult, DEFAULT_SEARCH_LIMIT};
use store::TokenStore;

/// Search the catalog as the search page does. A blank query returns no
/// results without contacting the backend; any other query is sent as typed.
pub async fn search_books<S: TokenStore>(
    client: &ApiClient<S>,
    query: &str,
) -> ApiResult<Vec<BookSearchResult>> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(client.search_books(query, DEFAULT_SEARCH_LIMIT).await?.results)
}

/// Find other users by username.
pub async fn search_users<S: TokenStore>(
    client: &ApiClient<S>,
    query: &str,
) -> ApiResult<Vec<UserSearchResult>> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(client.search_users(query).await?.results)
}
