//! Async HTTP client for the marusya server.
//!
//! Implements both [`AuthService`] and [`FavoritesService`]. The session is
//! carried by the server's HTTP-only cookie, which the client keeps in its
//! own cookie jar; the `identity` arguments are therefore only used by the
//! caller for bookkeeping.

use std::{collections::HashSet, time::Duration};

use anyhow::Context as _;
use marusya_core::{
  movie::MovieId,
  remote::{AuthService, FavoritesService},
  session::{Credentials, Identity, Registration, User},
};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;

/// Connection settings for the marusya API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{method} {path} → {status}")]
  Status {
    method: Method,
    path:   String,
    status: StatusCode,
  },

  #[error("Invalid email or password")]
  InvalidCredentials,

  #[error("User already exists")]
  UserExists,

  #[error("not signed in")]
  Unauthorized,
}

/// Clones share the connection pool and the cookie jar.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  base:   Url,
}

/// One entry of `GET /favorites`; only the id is used.
#[derive(Deserialize)]
struct FavoriteEntry {
  id: MovieId,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
    let base = Url::parse(&config.base_url)
      .with_context(|| format!("invalid server URL {:?}", config.base_url))?;
    anyhow::ensure!(!base.cannot_be_a_base(), "invalid server URL {:?}", config.base_url);

    let client = Client::builder()
      .cookie_store(true)
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, base })
  }

  /// Build a URL from path segments; each segment is percent-encoded.
  fn url(&self, segments: &[&str]) -> Url {
    let mut url = self.base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  async fn send(
    &self,
    method: Method,
    segments: &[&str],
    build: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
  ) -> Result<Response, ClientError> {
    let url = self.url(segments);
    let resp = build(self.client.request(method.clone(), url.clone()))
      .send()
      .await?;

    match resp.status() {
      status if status.is_success() => Ok(resp),
      StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
      status => Err(ClientError::Status {
        method,
        path: url.path().to_owned(),
        status,
      }),
    }
  }

  /// `GET /profile`
  async fn profile(&self) -> Result<User, ClientError> {
    let resp = self.send(Method::GET, &["profile"], |req| req).await?;
    Ok(resp.json().await?)
  }
}

// ─── AuthService ─────────────────────────────────────────────────────────────

impl AuthService for ApiClient {
  type Error = ClientError;

  /// `POST /auth/login`, then `GET /profile` to learn who we are.
  async fn login(&self, credentials: &Credentials) -> Result<Identity, ClientError> {
    match self
      .send(Method::POST, &["auth", "login"], |req| req.json(credentials))
      .await
    {
      Ok(_) => {}
      Err(ClientError::Unauthorized) => return Err(ClientError::InvalidCredentials),
      Err(e) => return Err(e),
    }
    let user = self.profile().await?;
    Ok(Identity::from(&user))
  }

  /// `POST /user` with form `email, password, name, surname`
  async fn register(&self, registration: &Registration) -> Result<(), ClientError> {
    let form = [
      ("email", registration.email.trim()),
      ("password", registration.password.as_str()),
      ("name", registration.name.trim()),
      ("surname", registration.surname.trim()),
    ];
    match self.send(Method::POST, &["user"], |req| req.form(&form)).await {
      Ok(_) => Ok(()),
      Err(ClientError::Status { status: StatusCode::CONFLICT, .. }) => Err(ClientError::UserExists),
      Err(e) => Err(e),
    }
  }

  async fn current_identity(&self) -> Result<Option<Identity>, ClientError> {
    match self.profile().await {
      Ok(user) => Ok(Some(Identity::from(&user))),
      Err(ClientError::Unauthorized) => Ok(None),
      Err(e) => Err(e),
    }
  }

  /// `GET /auth/logout`
  async fn logout(&self) -> Result<(), ClientError> {
    self.send(Method::GET, &["auth", "logout"], |req| req).await?;
    Ok(())
  }
}

// ─── FavoritesService ────────────────────────────────────────────────────────

impl FavoritesService for ApiClient {
  type Error = ClientError;

  /// `GET /favorites`
  async fn list_favorites(&self, _identity: &Identity) -> Result<HashSet<MovieId>, ClientError> {
    let resp = self.send(Method::GET, &["favorites"], |req| req).await?;
    let entries: Vec<FavoriteEntry> = resp.json().await?;
    Ok(entries.into_iter().map(|entry| entry.id).collect())
  }

  /// `POST /favorites` with form `id=<movie>`
  async fn add_favorite(&self, _identity: &Identity, movie: &MovieId) -> Result<(), ClientError> {
    self
      .send(Method::POST, &["favorites"], |req| req.form(&[("id", movie.as_str())]))
      .await?;
    Ok(())
  }

  /// `DELETE /favorites/{id}`
  async fn remove_favorite(&self, _identity: &Identity, movie: &MovieId) -> Result<(), ClientError> {
    self
      .send(Method::DELETE, &["favorites", movie.as_str()], |req| req)
      .await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(base: &str) -> ApiClient {
    ApiClient::new(ApiConfig { base_url: base.into() }).unwrap()
  }

  #[test]
  fn urls_join_segments() {
    let c = client("http://localhost:8080");
    assert_eq!(c.url(&["favorites"]).as_str(), "http://localhost:8080/favorites");

    let c = client("http://localhost:8080/api/");
    assert_eq!(
      c.url(&["auth", "login"]).as_str(),
      "http://localhost:8080/api/auth/login"
    );
  }

  #[test]
  fn movie_ids_are_percent_encoded() {
    let c = client("http://localhost:8080");
    assert_eq!(
      c.url(&["favorites", "a b/c"]).as_str(),
      "http://localhost:8080/favorites/a%20b%2Fc"
    );
  }

  #[test]
  fn rejects_unusable_base_url() {
    assert!(ApiClient::new(ApiConfig { base_url: "not a url".into() }).is_err());
    assert!(ApiClient::new(ApiConfig { base_url: "mailto:a@b.c".into() }).is_err());
  }
}
