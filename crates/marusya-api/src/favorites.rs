//! Handlers for `/favorites` endpoints. Every route requires a session.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/favorites` | `[{"id":…,"added_at":…}]` |
//! | `POST`   | `/favorites` | Form: `id`; adding twice is not an error |
//! | `DELETE` | `/favorites/{id}` | Removing an absent id is not an error |

use axum::{
  Form, Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use marusya_core::{
  movie::MovieId,
  store::{AccountStore, Favorite},
};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, auth::CurrentSession, error::ApiError};

fn movie_id(raw: String) -> Result<MovieId, ApiError> {
  let raw = raw.trim();
  if raw.is_empty() {
    return Err(ApiError::BadRequest("movie id is required".into()));
  }
  Ok(MovieId::from(raw))
}

/// `GET /favorites`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  session: CurrentSession,
) -> Result<Json<Vec<Favorite>>, ApiError>
where
  S: AccountStore + Clone + Send + Sync + 'static,
{
  let favorites = state
    .store
    .list_favorites(session.user.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(favorites))
}

#[derive(Debug, Deserialize)]
pub struct AddForm {
  pub id: String,
}

/// `POST /favorites`
pub async fn add<S>(
  State(state): State<AppState<S>>,
  session: CurrentSession,
  Form(form): Form<AddForm>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AccountStore + Clone + Send + Sync + 'static,
{
  let movie = movie_id(form.id)?;
  let inserted = state
    .store
    .add_favorite(session.user.user_id, &movie)
    .await
    .map_err(ApiError::store)?;

  tracing::debug!(user = %session.user.user_id, %movie, inserted, "favorite added");
  Ok((StatusCode::CREATED, Json(json!({ "success": true }))))
}

/// `DELETE /favorites/{id}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  session: CurrentSession,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AccountStore + Clone + Send + Sync + 'static,
{
  let movie = movie_id(id)?;
  let removed = state
    .store
    .remove_favorite(session.user.user_id, &movie)
    .await
    .map_err(ApiError::store)?;

  tracing::debug!(user = %session.user.user_id, %movie, removed, "favorite removed");
  Ok(Json(json!({ "success": true })))
}
