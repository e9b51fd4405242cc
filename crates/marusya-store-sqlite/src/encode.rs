//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use marusya_core::{
  movie::MovieId,
  session::User,
  store::{Favorite, StoredUser},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Raw rows ─────────────────────────────────────────────────────────────────

/// Column values of a `users` row, decoded lazily outside the DB thread.
pub struct RawUser {
  pub user_id:       String,
  pub email:         String,
  pub name:          String,
  pub surname:       String,
  pub password_hash: String,
  pub created_at:    String,
}

/// Columns selected by every user query, in [`RawUser::from_row`] order.
pub const USER_COLUMNS: &str =
  "users.user_id, users.email, users.name, users.surname, users.password_hash, users.created_at";

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      email:         row.get(1)?,
      name:          row.get(2)?,
      surname:       row.get(3)?,
      password_hash: row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn into_stored(self) -> Result<StoredUser> {
    Ok(StoredUser {
      user:          User {
        user_id:    decode_uuid(&self.user_id)?,
        email:      self.email,
        name:       self.name,
        surname:    self.surname,
        created_at: decode_dt(&self.created_at)?,
      },
      password_hash: self.password_hash,
    })
  }

  pub fn into_user(self) -> Result<User> { self.into_stored().map(|stored| stored.user) }
}

pub struct RawFavorite {
  pub movie_id: String,
  pub added_at: String,
}

impl RawFavorite {
  pub fn into_favorite(self) -> Result<Favorite> {
    Ok(Favorite {
      movie_id: MovieId::from(self.movie_id),
      added_at: decode_dt(&self.added_at)?,
    })
  }
}
