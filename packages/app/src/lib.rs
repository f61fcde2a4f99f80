//! This crate contains the session and page workflows shared by every
//! BlueberryBooks frontend.
//!
//! Rendering is left to the frontend. What lives here is everything a page does
//! between "the user clicked" and "show this data or this error": restoring and
//! mutating the [`AuthSession`], and the per-page request sequences in
//! [`views`].

mod claims;
pub use claims::{decode_claims, ClaimsError, TokenClaims};

mod auth;
pub use auth::{AuthSession, SessionUser};

mod platform;
pub use platform::{connect, make_token_store};

pub mod views;
