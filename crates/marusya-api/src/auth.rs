//! Password hashing, session tokens and the session-cookie extractor.
//!
//! A login issues a random token in an HTTP-only cookie. The store only ever
//! sees the token's SHA-256 digest.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use marusya_core::{session::User, store::AccountStore};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::{AppState, error::ApiError};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "marusya_session";

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

/// Check `password` against a stored PHC string.
pub fn verify_password(password: &str, password_hash: &str) -> Result<(), ApiError> {
  let parsed = PasswordHash::new(password_hash).map_err(|_| ApiError::InvalidCredentials)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .map_err(|_| ApiError::InvalidCredentials)
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

/// A fresh 256-bit session token, base64url-encoded.
pub fn new_session_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  B64.encode(bytes)
}

/// The form under which a token is persisted.
pub fn token_digest(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

// ─── Cookies ─────────────────────────────────────────────────────────────────

pub fn session_cookie(token: &str, secure: bool) -> String {
  let secure = if secure { "; Secure" } else { "" };
  format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax{secure}")
}

pub fn cleared_session_cookie() -> String {
  format!("{SESSION_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
}

/// Extract the session token from the request's `Cookie` headers.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|value| value.to_str().ok())
    .flat_map(|value| value.split(';'))
    .find_map(|pair| {
      let (name, value) = pair.trim().split_once('=')?;
      (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_owned())
    })
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// Present in a handler means the request carried a live session.
pub struct CurrentSession {
  pub user:   User,
  pub digest: String,
}

impl<S> FromRequestParts<AppState<S>> for CurrentSession
where
  S: AccountStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = session_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
    let digest = token_digest(&token);

    let user = state
      .store
      .session_user(&digest)
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Unauthorized)?;

    Ok(CurrentSession { user, digest })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::HeaderValue;

  #[test]
  fn password_round_trip() {
    let hash = hash_password("secret").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("secret", &hash).is_ok());
    assert!(matches!(
      verify_password("wrong", &hash),
      Err(ApiError::InvalidCredentials)
    ));
  }

  #[test]
  fn malformed_hash_is_invalid_credentials() {
    assert!(matches!(
      verify_password("secret", "not-a-phc-string"),
      Err(ApiError::InvalidCredentials)
    ));
  }

  #[test]
  fn tokens_are_unique_and_digest_is_stable() {
    let a = new_session_token();
    let b = new_session_token();
    assert_ne!(a, b);
    assert_eq!(a.len(), 43);
    assert_eq!(token_digest(&a), token_digest(&a));
    assert_eq!(token_digest(&a).len(), 64);
    assert_ne!(token_digest(&a), a);
  }

  #[test]
  fn session_token_found_among_other_cookies() {
    let mut headers = HeaderMap::new();
    headers.insert(
      header::COOKIE,
      HeaderValue::from_static("theme=dark; marusya_session=abc123; lang=en"),
    );
    assert_eq!(session_token(&headers).as_deref(), Some("abc123"));
  }

  #[test]
  fn empty_or_missing_cookie_is_none() {
    let mut headers = HeaderMap::new();
    assert_eq!(session_token(&headers), None);
    headers.insert(header::COOKIE, HeaderValue::from_static("marusya_session="));
    assert_eq!(session_token(&headers), None);
  }

  #[test]
  fn cookie_attributes() {
    let cookie = session_cookie("tok", true);
    assert!(cookie.starts_with("marusya_session=tok;"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.ends_with("; Secure"));
    assert!(!session_cookie("tok", false).contains("Secure"));
    assert!(cleared_session_cookie().contains("Max-Age=0"));
  }
}
