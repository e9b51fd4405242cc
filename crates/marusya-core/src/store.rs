//! The `AccountStore` trait: server-side persistence for accounts, login
//! sessions and per-user favorites.
//!
//! Implemented by storage backends (e.g. `marusya-store-sqlite`). The HTTP
//! layer (`marusya-api`) depends on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  movie::MovieId,
  session::{NewUser, User},
};

/// An account together with its stored argon2 password hash.
#[derive(Debug, Clone)]
pub struct StoredUser {
  pub user:          User,
  pub password_hash: String,
}

/// A favorite entry. Membership is the only thing that matters; `added_at`
/// orders the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
  #[serde(rename = "id")]
  pub movie_id: MovieId,
  pub added_at: DateTime<Utc>,
}

/// Abstraction over a Marusya account store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait AccountStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Accounts ──────────────────────────────────────────────────────────

  /// Create an account. Returns `None` if the email is already registered.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up an account by email (case-insensitive), including its hash.
  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<StoredUser>, Self::Error>> + Send + 'a;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Persist a login session keyed by the digest of its token.
  fn create_session(
    &self,
    token_digest: String,
    user_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Resolve a session token digest to its user, if the session exists.
  fn session_user<'a>(
    &'a self,
    token_digest: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Remove a session. Removing an unknown session is not an error.
  fn delete_session<'a>(
    &'a self,
    token_digest: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Favorites ─────────────────────────────────────────────────────────

  /// All favorites for `user_id`, oldest first.
  fn list_favorites(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Favorite>, Self::Error>> + Send + '_;

  /// Add a favorite. Idempotent; returns `true` if it was newly added.
  fn add_favorite<'a>(
    &'a self,
    user_id: Uuid,
    movie_id: &'a MovieId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Remove a favorite. Idempotent; returns `true` if it existed.
  fn remove_favorite<'a>(
    &'a self,
    user_id: Uuid,
    movie_id: &'a MovieId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
