//! HTTP backend for Marusya: accounts, cookie sessions and per-user
//! favorites.
//!
//! Exposes an axum [`Router`] backed by any [`AccountStore`]. TLS is the
//! caller's responsibility.

pub mod account;
pub mod auth;
pub mod error;
pub mod favorites;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get, post},
};
use marusya_core::store::AccountStore;
use serde::Deserialize;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `MARUSYA_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub store_path:       PathBuf,
  /// Mark the session cookie `Secure`. Enable when served over HTTPS.
  #[serde(default)]
  pub cookie_secure:    bool,
  /// Days a login session stays valid.
  #[serde(default = "default_session_ttl_days")]
  pub session_ttl_days: u16,
}

fn default_session_ttl_days() -> u16 { marusya_store_sqlite::DEFAULT_SESSION_TTL_DAYS }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: AccountStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: AccountStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Sessions
    .route("/auth/login",      post(account::login::<S>))
    .route("/auth/logout",     get(account::logout::<S>))
    .route("/profile",         get(account::profile))
    .route("/user",            post(account::register::<S>))
    // Favorites
    .route("/favorites",       get(favorites::list::<S>).post(favorites::add::<S>))
    .route("/favorites/{id}",  delete(favorites::remove::<S>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
