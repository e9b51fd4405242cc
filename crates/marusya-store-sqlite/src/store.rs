//! [`SqliteStore`], the SQLite implementation of [`AccountStore`].

use std::path::Path;

use chrono::{TimeDelta, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use marusya_core::{
  movie::MovieId,
  session::{NewUser, User},
  store::{AccountStore, Favorite, StoredUser},
};

use crate::{
  encode::{encode_dt, encode_uuid, RawFavorite, RawUser, USER_COLUMNS},
  schema::SCHEMA,
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Marusya account store backed by a single SQLite file.
///
/// Clones share one connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
  session_ttl:     TimeDelta,
}

/// How long a login session stays valid unless configured otherwise.
pub const DEFAULT_SESSION_TTL_DAYS: u16 = 30;

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self::with_conn(conn);
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self::with_conn(conn);
    store.init_schema().await?;
    Ok(store)
  }

  /// Sessions older than `days` are no longer accepted, and are deleted
  /// the next time a session is created.
  pub fn with_session_ttl_days(mut self, days: u16) -> Self {
    self.session_ttl = TimeDelta::days(days.into());
    self
  }

  fn with_conn(conn: tokio_rusqlite::Connection) -> Self {
    Self {
      conn,
      session_ttl: TimeDelta::days(DEFAULT_SESSION_TTL_DAYS.into()),
    }
  }

  /// Sessions created at or before this instant have expired.
  fn session_cutoff(&self) -> String { encode_dt(Utc::now() - self.session_ttl) }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── AccountStore impl ───────────────────────────────────────────────────────

impl AccountStore for SqliteStore {
  type Error = crate::Error;

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<Option<User>> {
    let user = User {
      user_id:    Uuid::new_v4(),
      email:      input.email.trim().to_owned(),
      name:       input.name,
      surname:    input.surname,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let at_str   = encode_dt(user.created_at);
    let email    = user.email.clone();
    let name     = user.name.clone();
    let surname  = user.surname.clone();
    let hash     = input.password_hash;

    let inserted = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "INSERT OR IGNORE INTO users (user_id, email, name, surname, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, email, name, surname, hash, at_str],
        )?;
        Ok(changed == 1)
      })
      .await?;

    Ok(inserted.then_some(user))
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<StoredUser>> {
    let email = email.trim().to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE users.email = ?1"),
            rusqlite::params![email],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_stored).transpose()
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn create_session(&self, token_digest: String, user_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(user_id);
    let at_str = encode_dt(Utc::now());
    let cutoff = self.session_cutoff();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM sessions WHERE julianday(created_at) <= julianday(?1)",
          rusqlite::params![cutoff],
        )?;
        tx.execute(
          "INSERT INTO sessions (token_digest, user_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![token_digest, id_str, at_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn session_user(&self, token_digest: &str) -> Result<Option<User>> {
    let digest = token_digest.to_owned();
    let cutoff = self.session_cutoff();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {USER_COLUMNS} FROM sessions
               JOIN users ON users.user_id = sessions.user_id
               WHERE sessions.token_digest = ?1
                 AND julianday(sessions.created_at) > julianday(?2)"
            ),
            rusqlite::params![digest, cutoff],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn delete_session(&self, token_digest: &str) -> Result<()> {
    let digest = token_digest.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM sessions WHERE token_digest = ?1",
          rusqlite::params![digest],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Favorites ─────────────────────────────────────────────────────────────

  async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<Favorite>> {
    let id_str = encode_uuid(user_id);

    let raws: Vec<RawFavorite> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT movie_id, added_at FROM favorites
           WHERE user_id = ?1
           ORDER BY added_at, movie_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawFavorite {
              movie_id: row.get(0)?,
              added_at: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFavorite::into_favorite).collect()
  }

  async fn add_favorite(&self, user_id: Uuid, movie_id: &MovieId) -> Result<bool> {
    let id_str    = encode_uuid(user_id);
    let movie_str = movie_id.as_str().to_owned();
    let at_str    = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO favorites (user_id, movie_id, added_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, movie_str, at_str],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  async fn remove_favorite(&self, user_id: Uuid, movie_id: &MovieId) -> Result<bool> {
    let id_str    = encode_uuid(user_id);
    let movie_str = movie_id.as_str().to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM favorites WHERE user_id = ?1 AND movie_id = ?2",
          rusqlite::params![id_str, movie_str],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }
}
