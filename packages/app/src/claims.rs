use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

/// Payload of a backend-issued JWT. Only read, never verified: the backend
/// remains the judge of whether the token is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// Username.
    pub sub: String,
    pub user_id: i64,
    #[serde(default)]
    pub exp: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ClaimsError {
    #[error("token is not a JWT")]
    Malformed,
    #[error("token payload is not base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("token payload is not valid claims: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode the claims segment of `token`.
pub fn decode_claims(token: &str) -> Result<TokenClaims, ClaimsError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ClaimsError::Malformed);
    };
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    Ok(serde_json::from_slice(&bytes)?)
}
