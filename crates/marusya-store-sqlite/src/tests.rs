//! Integration tests for `SqliteStore` against an in-memory database.

use marusya_core::{
  movie::MovieId,
  session::NewUser,
  store::AccountStore,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_user(email: &str) -> NewUser {
  NewUser {
    email:         email.into(),
    name:          "Ann".into(),
    surname:       "Lee".into(),
    password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
  }
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_find_user() {
  let s = store().await;

  let user = s
    .create_user(new_user("ann@example.com"))
    .await
    .unwrap()
    .expect("fresh email");
  assert_eq!(user.email, "ann@example.com");

  let found = s
    .find_user_by_email("ann@example.com")
    .await
    .unwrap()
    .expect("user exists");
  assert_eq!(found.user.user_id, user.user_id);
  assert!(found.password_hash.starts_with("$argon2id$"));
}

#[tokio::test]
async fn email_lookup_ignores_case() {
  let s = store().await;
  s.create_user(new_user("Ann@Example.com")).await.unwrap();

  let found = s.find_user_by_email("ann@example.COM").await.unwrap();
  assert!(found.is_some());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  assert!(s.create_user(new_user("ann@example.com")).await.unwrap().is_some());
  assert!(s.create_user(new_user("ANN@example.com")).await.unwrap().is_none());
}

#[tokio::test]
async fn missing_user_returns_none() {
  let s = store().await;
  assert!(s.find_user_by_email("nobody@example.com").await.unwrap().is_none());
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn session_round_trip() {
  let s = store().await;
  let user = s
    .create_user(new_user("ann@example.com"))
    .await
    .unwrap()
    .unwrap();

  s.create_session("digest-1".into(), user.user_id).await.unwrap();
  let resolved = s.session_user("digest-1").await.unwrap().expect("session");
  assert_eq!(resolved.user_id, user.user_id);

  s.delete_session("digest-1").await.unwrap();
  assert!(s.session_user("digest-1").await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_unknown_session_is_ok() {
  let s = store().await;
  s.delete_session("never-issued").await.unwrap();
}

async fn session_rows(s: &SqliteStore) -> i64 {
  s.conn
    .call(|conn| {
      Ok(conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get::<_, i64>(0))?)
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn expired_session_is_rejected() {
  let s = store().await.with_session_ttl_days(0);
  let user = s
    .create_user(new_user("ann@example.com"))
    .await
    .unwrap()
    .unwrap();

  s.create_session("digest-1".into(), user.user_id).await.unwrap();
  assert!(s.session_user("digest-1").await.unwrap().is_none());
}

#[tokio::test]
async fn creating_a_session_prunes_expired_ones() {
  let s = store().await.with_session_ttl_days(0);
  let user = s
    .create_user(new_user("ann@example.com"))
    .await
    .unwrap()
    .unwrap();

  s.create_session("digest-1".into(), user.user_id).await.unwrap();
  s.create_session("digest-2".into(), user.user_id).await.unwrap();
  assert_eq!(session_rows(&s).await, 1);

  // A store with the default lifetime keeps both.
  let s = store().await;
  let user = s
    .create_user(new_user("ann@example.com"))
    .await
    .unwrap()
    .unwrap();
  s.create_session("digest-1".into(), user.user_id).await.unwrap();
  s.create_session("digest-2".into(), user.user_id).await.unwrap();
  assert_eq!(session_rows(&s).await, 2);
  assert!(s.session_user("digest-1").await.unwrap().is_some());
}

// ─── Favorites ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_list_favorites() {
  let s = store().await;
  let user = s
    .create_user(new_user("ann@example.com"))
    .await
    .unwrap()
    .unwrap();

  assert!(s.add_favorite(user.user_id, &MovieId::from("M1")).await.unwrap());
  assert!(s.add_favorite(user.user_id, &MovieId::from("M2")).await.unwrap());

  let ids: Vec<_> = s
    .list_favorites(user.user_id)
    .await
    .unwrap()
    .into_iter()
    .map(|f| f.movie_id)
    .collect();
  assert_eq!(ids.len(), 2);
  assert!(ids.contains(&MovieId::from("M1")));
  assert!(ids.contains(&MovieId::from("M2")));
}

#[tokio::test]
async fn add_is_idempotent() {
  let s = store().await;
  let user = s
    .create_user(new_user("ann@example.com"))
    .await
    .unwrap()
    .unwrap();
  let m1 = MovieId::from("M1");

  assert!(s.add_favorite(user.user_id, &m1).await.unwrap());
  assert!(!s.add_favorite(user.user_id, &m1).await.unwrap());
  assert_eq!(s.list_favorites(user.user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn remove_favorite() {
  let s = store().await;
  let user = s
    .create_user(new_user("ann@example.com"))
    .await
    .unwrap()
    .unwrap();
  let m1 = MovieId::from("M1");

  s.add_favorite(user.user_id, &m1).await.unwrap();
  assert!(s.remove_favorite(user.user_id, &m1).await.unwrap());
  assert!(!s.remove_favorite(user.user_id, &m1).await.unwrap());
  assert!(s.list_favorites(user.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn favorites_are_per_user() {
  let s = store().await;
  let ann = s
    .create_user(new_user("ann@example.com"))
    .await
    .unwrap()
    .unwrap();
  let bob = s
    .create_user(new_user("bob@example.com"))
    .await
    .unwrap()
    .unwrap();

  s.add_favorite(ann.user_id, &MovieId::from("M1")).await.unwrap();
  assert!(s.list_favorites(bob.user_id).await.unwrap().is_empty());
  assert!(s.list_favorites(Uuid::new_v4()).await.unwrap().is_empty());
}
