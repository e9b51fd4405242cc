//! Client-side collaborator traits: the Authentication Service and the
//! Favorites Source of Truth as seen from the toggle controllers.
//!
//! The HTTP client in `marusya-cli` implements both; tests substitute
//! in-process fakes.

use std::{collections::HashSet, future::Future};

use crate::{
  movie::MovieId,
  session::{Credentials, Identity, Registration},
};

/// Remote per-user favorites collection.
pub trait FavoritesService: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the full set of favorite movie ids for `identity`.
  fn list_favorites<'a>(
    &'a self,
    identity: &'a Identity,
  ) -> impl Future<Output = Result<HashSet<MovieId>, Self::Error>> + Send + 'a;

  fn add_favorite<'a>(
    &'a self,
    identity: &'a Identity,
    movie: &'a MovieId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn remove_favorite<'a>(
    &'a self,
    identity: &'a Identity,
    movie: &'a MovieId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Login, sign-up and session lookup.
pub trait AuthService: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Perform a login and return the identity it established.
  fn login<'a>(
    &'a self,
    credentials: &'a Credentials,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + 'a;

  /// Create an account. Does not sign in.
  fn register<'a>(
    &'a self,
    registration: &'a Registration,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// The identity of the current session, or `None` when signed out. Used
  /// to re-derive the session after a reload.
  fn current_identity(
    &self,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + '_;

  fn logout(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
