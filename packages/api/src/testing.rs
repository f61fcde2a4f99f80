//! # In-process stub backend
//!
//! [`StubBackend`] is a small axum server that speaks the BlueberryBooks REST
//! contract against in-memory state. Tests point an [`crate::ApiClient`] at
//! [`StubBackend::base_url`] and then inspect [`StubBackend::requests`] to see
//! exactly what went over the wire.
//!
//! It mirrors the backend's observable behaviour (status codes, `detail`
//! messages, get-or-create import, upserted ratings, `can_view` gating) but
//! none of its persistence. Tokens are unsigned JWT-shaped strings whose
//! payload carries `sub` and `user_id`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Query, Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::*;

pub use axum::http::StatusCode;

const TIMESTAMP: &str = "2024-01-01T12:00:00+00:00";

/// A request as the stub received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    /// Every `Authorization` header value, in order.
    pub authorization: Vec<String>,
    pub content_type: Vec<String>,
}

#[derive(Debug, Clone)]
struct StubUser {
    id: i64,
    username: String,
    password: String,
    is_private: bool,
}

#[derive(Debug, Default)]
struct BackendState {
    next_id: i64,
    users: Vec<StubUser>,
    tokens: HashMap<String, i64>,
    catalog: Vec<BookSearchResult>,
    books: Vec<Book>,
    read: Vec<(i64, i64)>,
    diary: Vec<DiaryEntry>,
    ratings: Vec<Rating>,
    follows: Vec<(i64, i64)>,
    requests: Vec<RecordedRequest>,
    canned: Option<(StatusCode, String)>,
}

impl BackendState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: i64) -> Option<&StubUser> {
        self.users.iter().find(|u| u.id == id)
    }

    fn book(&self, id: i64) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    fn summary(&self, book_id: i64) -> Option<BookSummary> {
        self.book(book_id).map(|b| BookSummary {
            id: b.id,
            open_library_id: Some(b.open_library_id.clone()),
            title: b.title.clone(),
            author: b.author.clone(),
            cover_image_url: b.cover_image_url.clone(),
        })
    }

    fn issue_token(&mut self, user_id: i64) -> String {
        let username = self
            .user(user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default();
        let token = fake_jwt(&username, user_id, self.tokens.len());
        self.tokens.insert(token.clone(), user_id);
        token
    }

    fn ratings_for(&self, user_id: i64) -> Vec<Rating> {
        let mut ratings: Vec<Rating> = self
            .ratings
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        ratings.sort_by(|a, b| b.rating.cmp(&a.rating).then(b.id.cmp(&a.id)));
        ratings
    }

    fn with_book(&self, rating: Rating) -> RatingWithBook {
        let book = self.summary(rating.book_id);
        RatingWithBook { rating, book }
    }
}

type Shared = Arc<Mutex<BackendState>>;
type Reject = (StatusCode, Json<Value>);
type Handled<T> = Result<Json<T>, Reject>;

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn reject(status: StatusCode, detail: &str) -> Reject {
    (status, Json(json!({ "detail": detail })))
}

/// Build an unsigned token shaped like the backend's HS256 JWTs.
pub fn fake_jwt(username: &str, user_id: i64, nonce: usize) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        json!({ "sub": username, "user_id": user_id, "exp": 4_102_444_800i64, "n": nonce })
            .to_string(),
    );
    format!("{header}.{payload}.stub-signature")
}

fn current_user(state: &BackendState, headers: &HeaderMap) -> Result<i64, Reject> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Authentication required"))?;
    state
        .tokens
        .get(token)
        .copied()
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Invalid authentication credentials"))
}

/// Handle to a running stub backend. The server task lives until the test's
/// runtime shuts down.
#[derive(Clone)]
pub struct StubBackend {
    base_url: String,
    state: Shared,
}

impl StubBackend {
    /// Bind to an ephemeral localhost port and start serving.
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState::default()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub backend");
        let addr = listener.local_addr().expect("Stub backend has no address");

        let router = router(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        lock(&self.state).requests.last().cloned()
    }

    /// Answer the next request with `status` and a raw `body`, bypassing routing.
    pub fn respond_next(&self, status: StatusCode, body: impl Into<String>) {
        lock(&self.state).canned = Some((status, body.into()));
    }

    /// Make a work available to search and import.
    pub fn add_catalog_book(&self, open_library_id: &str, title: &str, author: &str) {
        lock(&self.state).catalog.push(BookSearchResult {
            open_library_id: open_library_id.into(),
            title: title.into(),
            author: author.into(),
            isbn: None,
            cover_image_url: Some(format!("https://covers.example/{open_library_id}.jpg")),
            published_year: Some(1965),
        });
    }

    /// Create a user directly and return `(user_id, token)`.
    pub fn create_user(&self, username: &str, password: &str, is_private: bool) -> (i64, String) {
        let mut state = lock(&self.state);
        let id = state.next_id();
        state.users.push(StubUser {
            id,
            username: username.into(),
            password: password.into(),
            is_private,
        });
        let token = state.issue_token(id);
        (id, token)
    }

    /// Record that `follower` follows `followed`.
    pub fn follow(&self, follower: i64, followed: i64) {
        lock(&self.state).follows.push((follower, followed));
    }
}

fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/books/search", get(search_books))
        .route("/books/add", post(add_book))
        .route("/books/user/read", get(read_books))
        .route("/books/{id}", get(get_book))
        .route("/books/{id}/read", post(mark_read))
        .route("/diary", get(list_diary).post(create_diary))
        .route(
            "/diary/{id}",
            get(get_diary).put(update_diary).delete(delete_diary),
        )
        .route("/ratings", get(list_ratings).post(upsert_rating))
        .route("/ratings/top10", get(top_ratings))
        .route("/ratings/{id}", get(get_rating).delete(delete_rating))
        .route("/users/search", get(search_users))
        .route("/users/me/profile", get(own_profile))
        .route("/users/me/privacy", put(update_privacy))
        .route("/users/{id}/profile", get(user_profile))
        .route("/users/{id}/follow", post(follow).delete(unfollow))
        .with_state(state.clone());

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(state, record))
}

fn header_values(headers: &HeaderMap, name: header::HeaderName) -> Vec<String> {
    headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let recorded = RecordedRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
        authorization: header_values(request.headers(), header::AUTHORIZATION),
        content_type: header_values(request.headers(), header::CONTENT_TYPE),
    };

    let canned = {
        let mut state = lock(&state);
        state.requests.push(recorded);
        state.canned.take()
    };
    match canned {
        Some((status, body)) => (status, body).into_response(),
        None => next.run(request).await,
    }
}

async fn register(State(state): State<Shared>, Json(body): Json<Credentials>) -> Handled<AuthResponse> {
    let mut state = lock(&state);
    if state.users.iter().any(|u| u.username == body.username) {
        return Err(reject(StatusCode::BAD_REQUEST, "Username already exists"));
    }
    let id = state.next_id();
    state.users.push(StubUser {
        id,
        username: body.username.clone(),
        password: body.password,
        is_private: false,
    });
    let access_token = state.issue_token(id);
    Ok(Json(AuthResponse {
        access_token,
        token_type: "bearer".into(),
        user_id: id,
        username: body.username,
    }))
}

async fn login(State(state): State<Shared>, Json(body): Json<Credentials>) -> Handled<AuthResponse> {
    let mut state = lock(&state);
    let user = state
        .users
        .iter()
        .find(|u| u.username == body.username && u.password == body.password)
        .cloned()
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Incorrect username or password"))?;
    let access_token = state.issue_token(user.id);
    Ok(Json(AuthResponse {
        access_token,
        token_type: "bearer".into(),
        user_id: user.id,
        username: user.username,
    }))
}

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
    #[serde(default)]
    limit: Option<usize>,
}

async fn search_books(
    State(state): State<Shared>,
    Query(query): Query<SearchQuery>,
) -> Handled<SearchResults<BookSearchResult>> {
    if query.q.trim().is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, "Search query is required"));
    }
    let needle = query.q.trim().to_lowercase();
    let state = lock(&state);
    let results = state
        .catalog
        .iter()
        .filter(|b| {
            b.title.to_lowercase().contains(&needle)
                || b.author.to_lowercase().contains(&needle)
                || b.open_library_id.to_lowercase() == needle
        })
        .take(query.limit.unwrap_or(20))
        .cloned()
        .collect();
    Ok(Json(SearchResults { results }))
}

async fn get_book(State(state): State<Shared>, Path(id): Path<i64>) -> Handled<Book> {
    lock(&state)
        .book(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Book not found"))
}

#[derive(Deserialize)]
struct AddQuery {
    open_library_id: String,
}

async fn add_book(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<AddQuery>,
) -> Handled<AddBookResponse> {
    let mut state = lock(&state);
    current_user(&state, &headers)?;
    if let Some(book) = state
        .books
        .iter()
        .find(|b| b.open_library_id == query.open_library_id)
    {
        return Ok(Json(AddBookResponse {
            book_id: book.id,
            message: "Book already exists".into(),
        }));
    }
    let work = state
        .catalog
        .iter()
        .find(|b| b.open_library_id == query.open_library_id)
        .cloned()
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Book not found in Open Library"))?;
    let id = state.next_id();
    state.books.push(Book {
        id,
        open_library_id: work.open_library_id,
        title: work.title,
        author: Some(work.author),
        isbn: work.isbn,
        cover_image_url: work.cover_image_url,
        description: None,
        published_year: work.published_year,
    });
    Ok(Json(AddBookResponse {
        book_id: id,
        message: "Book added successfully".into(),
    }))
}

async fn mark_read(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Handled<MessageResponse> {
    let mut state = lock(&state);
    let user_id = current_user(&state, &headers)?;
    if state.book(id).is_none() {
        return Err(reject(StatusCode::NOT_FOUND, "Book not found"));
    }
    let message = if state.read.contains(&(user_id, id)) {
        "Book already marked as read"
    } else {
        state.read.push((user_id, id));
        "Book marked as read"
    };
    Ok(Json(MessageResponse {
        message: message.into(),
    }))
}

async fn read_books(State(state): State<Shared>, headers: HeaderMap) -> Handled<Vec<Book>> {
    let state = lock(&state);
    let user_id = current_user(&state, &headers)?;
    let books = state
        .read
        .iter()
        .filter(|(user, _)| *user == user_id)
        .filter_map(|(_, book)| state.book(*book).cloned())
        .collect();
    Ok(Json(books))
}

async fn list_diary(State(state): State<Shared>, headers: HeaderMap) -> Handled<Vec<DiaryEntryWithBook>> {
    let state = lock(&state);
    let user_id = current_user(&state, &headers)?;
    let entries = state
        .diary
        .iter()
        .rev()
        .filter(|e| e.user_id == user_id)
        .map(|e| DiaryEntryWithBook {
            entry: e.clone(),
            book: state.summary(e.book_id),
        })
        .collect();
    Ok(Json(entries))
}

async fn create_diary(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CreateDiaryEntry>,
) -> Handled<DiaryEntry> {
    let mut state = lock(&state);
    let user_id = current_user(&state, &headers)?;
    if state.book(body.book_id).is_none() {
        return Err(reject(StatusCode::NOT_FOUND, "Book not found"));
    }
    if state
        .diary
        .iter()
        .any(|e| e.user_id == user_id && e.book_id == body.book_id)
    {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "Diary entry already exists for this book. Use update endpoint to modify it.",
        ));
    }
    let entry = DiaryEntry {
        id: state.next_id(),
        user_id,
        book_id: body.book_id,
        entry_text: body.entry_text,
        created_at: TIMESTAMP.into(),
        updated_at: None,
    };
    state.diary.push(entry.clone());
    Ok(Json(entry))
}

async fn get_diary(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(book_id): Path<i64>,
) -> Handled<DiaryEntryWithBook> {
    let state = lock(&state);
    let user_id = current_user(&state, &headers)?;
    let entry = state
        .diary
        .iter()
        .find(|e| e.user_id == user_id && e.book_id == book_id)
        .cloned()
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Diary entry not found"))?;
    let book = state.summary(book_id);
    Ok(Json(DiaryEntryWithBook { entry, book }))
}

async fn update_diary(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(entry_id): Path<i64>,
    Json(body): Json<UpdateDiaryEntry>,
) -> Handled<DiaryEntry> {
    let mut state = lock(&state);
    let user_id = current_user(&state, &headers)?;
    let entry = state
        .diary
        .iter_mut()
        .find(|e| e.id == entry_id && e.user_id == user_id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Diary entry not found"))?;
    entry.entry_text = body.entry_text;
    entry.updated_at = Some(TIMESTAMP.into());
    Ok(Json(entry.clone()))
}

async fn delete_diary(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(entry_id): Path<i64>,
) -> Handled<MessageResponse> {
    let mut state = lock(&state);
    let user_id = current_user(&state, &headers)?;
    let before = state.diary.len();
    state
        .diary
        .retain(|e| !(e.id == entry_id && e.user_id == user_id));
    if state.diary.len() == before {
        return Err(reject(StatusCode::NOT_FOUND, "Diary entry not found"));
    }
    Ok(Json(MessageResponse {
        message: "Diary entry deleted successfully".into(),
    }))
}

async fn upsert_rating(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<UpsertRating>,
) -> Handled<RatingWithBook> {
    let mut state = lock(&state);
    let user_id = current_user(&state, &headers)?;
    if !(1..=5).contains(&body.rating) {
        return Err(reject(StatusCode::BAD_REQUEST, "Rating must be between 1 and 5"));
    }
    if state.book(body.book_id).is_none() {
        return Err(reject(StatusCode::NOT_FOUND, "Book not found"));
    }
    let existing = state
        .ratings
        .iter()
        .position(|r| r.user_id == user_id && r.book_id == body.book_id);
    let rating = match existing {
        Some(idx) => {
            let rating = &mut state.ratings[idx];
            rating.rating = body.rating;
            rating.updated_at = Some(TIMESTAMP.into());
            rating.clone()
        }
        None => {
            let rating = Rating {
                id: state.next_id(),
                user_id,
                book_id: body.book_id,
                rating: body.rating,
                created_at: TIMESTAMP.into(),
                updated_at: None,
            };
            state.ratings.push(rating.clone());
            rating
        }
    };
    Ok(Json(state.with_book(rating)))
}

async fn list_ratings(State(state): State<Shared>, headers: HeaderMap) -> Handled<Vec<RatingWithBook>> {
    let state = lock(&state);
    let user_id = current_user(&state, &headers)?;
    let ratings = state
        .ratings_for(user_id)
        .into_iter()
        .map(|r| state.with_book(r))
        .collect();
    Ok(Json(ratings))
}

async fn top_ratings(State(state): State<Shared>, headers: HeaderMap) -> Handled<Vec<RatingWithBook>> {
    let state = lock(&state);
    let user_id = current_user(&state, &headers)?;
    let ratings = state
        .ratings_for(user_id)
        .into_iter()
        .take(10)
        .map(|r| state.with_book(r))
        .collect();
    Ok(Json(ratings))
}

async fn get_rating(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(book_id): Path<i64>,
) -> Handled<RatingWithBook> {
    let state = lock(&state);
    let user_id = current_user(&state, &headers)?;
    let rating = state
        .ratings
        .iter()
        .find(|r| r.user_id == user_id && r.book_id == book_id)
        .cloned()
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Rating not found"))?;
    Ok(Json(state.with_book(rating)))
}

async fn delete_rating(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(rating_id): Path<i64>,
) -> Handled<MessageResponse> {
    let mut state = lock(&state);
    let user_id = current_user(&state, &headers)?;
    let before = state.ratings.len();
    state
        .ratings
        .retain(|r| !(r.id == rating_id && r.user_id == user_id));
    if state.ratings.len() == before {
        return Err(reject(StatusCode::NOT_FOUND, "Rating not found"));
    }
    Ok(Json(MessageResponse {
        message: "Rating deleted successfully".into(),
    }))
}

#[derive(Deserialize)]
struct UserQuery {
    q: String,
}

async fn search_users(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
) -> Handled<SearchResults<UserSearchResult>> {
    let state = lock(&state);
    let user_id = current_user(&state, &headers)?;
    if query.q.trim().is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, "Search query is required"));
    }
    let needle = query.q.trim().to_lowercase();
    let results = state
        .users
        .iter()
        .filter(|u| u.id != user_id && u.username.to_lowercase().contains(&needle))
        .take(20)
        .map(|u| UserSearchResult {
            id: u.id,
            username: u.username.clone(),
            is_private: u.is_private,
        })
        .collect();
    Ok(Json(SearchResults { results }))
}

fn profile_of(state: &BackendState, viewer: i64, target: &StubUser) -> UserProfile {
    let is_following = state.follows.contains(&(viewer, target.id));
    let is_friend = is_following && state.follows.contains(&(target.id, viewer));
    UserProfile {
        id: target.id,
        username: target.username.clone(),
        is_private: target.is_private,
        followers_count: state.follows.iter().filter(|(_, f)| *f == target.id).count() as u64,
        following_count: state.follows.iter().filter(|(f, _)| *f == target.id).count() as u64,
        is_following,
        is_friend,
        can_view: !target.is_private || is_following || viewer == target.id,
    }
}

async fn own_profile(State(state): State<Shared>, headers: HeaderMap) -> Handled<UserProfile> {
    let state = lock(&state);
    let user_id = current_user(&state, &headers)?;
    let user = state
        .user(user_id)
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "User not found"))?;
    let mut profile = profile_of(&state, user_id, user);
    profile.is_following = false;
    profile.is_friend = false;
    Ok(Json(profile))
}

async fn update_privacy(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<UpdatePrivacy>,
) -> Handled<PrivacyResponse> {
    let mut state = lock(&state);
    let user_id = current_user(&state, &headers)?;
    if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
        user.is_private = body.is_private;
    }
    Ok(Json(PrivacyResponse {
        message: "Privacy setting updated".into(),
        is_private: body.is_private,
    }))
}

async fn user_profile(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(target_id): Path<i64>,
) -> Handled<UserProfileWithBooks> {
    let state = lock(&state);
    let viewer = current_user(&state, &headers)?;
    let target = state
        .user(target_id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "User not found"))?;
    let profile = profile_of(&state, viewer, target);
    let top_rated_books = if profile.can_view {
        state
            .ratings_for(target_id)
            .into_iter()
            .take(10)
            .filter_map(|r| {
                let book = state.book(r.book_id)?;
                let review = state
                    .diary
                    .iter()
                    .find(|e| e.user_id == target_id && e.book_id == r.book_id)
                    .map(|e| e.entry_text.clone());
                Some(TopRatedBook {
                    book_id: book.id,
                    open_library_id: Some(book.open_library_id.clone()),
                    title: book.title.clone(),
                    author: book.author.clone(),
                    cover_image_url: book.cover_image_url.clone(),
                    rating: r.rating,
                    review,
                })
            })
            .collect()
    } else {
        Vec::new()
    };
    Ok(Json(UserProfileWithBooks {
        profile,
        top_rated_books,
    }))
}

async fn follow(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(target_id): Path<i64>,
) -> Handled<MessageResponse> {
    let mut state = lock(&state);
    let viewer = current_user(&state, &headers)?;
    if viewer == target_id {
        return Err(reject(StatusCode::BAD_REQUEST, "Cannot follow yourself"));
    }
    if state.user(target_id).is_none() {
        return Err(reject(StatusCode::NOT_FOUND, "User not found"));
    }
    let message = if state.follows.contains(&(viewer, target_id)) {
        "Already following this user"
    } else {
        state.follows.push((viewer, target_id));
        "Successfully followed user"
    };
    Ok(Json(MessageResponse {
        message: message.into(),
    }))
}

async fn unfollow(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(target_id): Path<i64>,
) -> Handled<MessageResponse> {
    let mut state = lock(&state);
    let viewer = current_user(&state, &headers)?;
    if !state.follows.contains(&(viewer, target_id)) {
        return Err(reject(StatusCode::NOT_FOUND, "Not following this user"));
    }
    state.follows.retain(|pair| *pair != (viewer, target_id));
    Ok(Json(MessageResponse {
        message: "Successfully unfollowed user".into(),
    }))
}
