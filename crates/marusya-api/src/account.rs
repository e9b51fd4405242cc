//! Handlers for account and session endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/login` | Body: `{"email":…,"password":…}`; sets the session cookie |
//! | `GET`  | `/auth/logout` | Ends the session, clears the cookie |
//! | `GET`  | `/profile` | 401 without a live session |
//! | `POST` | `/user` | Form: `email`, `password`, `name`, `surname`; 409 if taken |

use axum::{
  Form, Json,
  extract::State,
  http::{HeaderMap, StatusCode, header},
  response::IntoResponse,
};
use marusya_core::{
  session::{NewUser, User},
  store::AccountStore,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
  AppState,
  auth::{
    CurrentSession, cleared_session_cookie, hash_password, new_session_token, session_cookie,
    session_token, token_digest, verify_password,
  },
  error::ApiError,
};

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AccountStore + Clone + Send + Sync + 'static,
{
  let stored = state
    .store
    .find_user_by_email(&body.email)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::InvalidCredentials)?;

  verify_password(&body.password, &stored.password_hash)?;

  let token = new_session_token();
  state
    .store
    .create_session(token_digest(&token), stored.user.user_id)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(user = %stored.user.user_id, "login");

  Ok((
    [(header::SET_COOKIE, session_cookie(&token, state.config.cookie_secure))],
    Json(json!({ "success": true })),
  ))
}

// ─── Logout ───────────────────────────────────────────────────────────────────

/// `GET /auth/logout`. Succeeds whether or not a session was present.
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError>
where
  S: AccountStore + Clone + Send + Sync + 'static,
{
  if let Some(token) = session_token(&headers) {
    state
      .store
      .delete_session(&token_digest(&token))
      .await
      .map_err(ApiError::store)?;
  }

  Ok((
    [(header::SET_COOKIE, cleared_session_cookie())],
    Json(json!({ "success": true })),
  ))
}

// ─── Profile ──────────────────────────────────────────────────────────────────

/// `GET /profile`
pub async fn profile(session: CurrentSession) -> Json<User> { Json(session.user) }

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
  pub email:    String,
  pub password: String,
  pub name:     String,
  #[serde(default)]
  pub surname:  String,
}

/// `POST /user`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Form(form): Form<RegisterForm>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AccountStore + Clone + Send + Sync + 'static,
{
  if form.email.trim().is_empty() || form.password.is_empty() {
    return Err(ApiError::BadRequest("email and password are required".into()));
  }

  let created = state
    .store
    .create_user(NewUser {
      email:         form.email,
      name:          form.name,
      surname:       form.surname,
      password_hash: hash_password(&form.password)?,
    })
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::Conflict("User already exists".into()))?;

  tracing::info!(user = %created.user_id, "registered");

  Ok((StatusCode::CREATED, Json(json!({ "success": true }))))
}
