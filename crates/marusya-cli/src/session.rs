//! The client-side session observer.
//!
//! Holds the identity of the signed-in user, if any, and notifies
//! subscribers when it changes. Re-announcing the same identity is not a
//! change.

use marusya_core::session::Identity;
use tokio::sync::watch;

pub struct SessionStore {
  tx: watch::Sender<Option<Identity>>,
}

impl Default for SessionStore {
  fn default() -> Self { Self::new() }
}

impl SessionStore {
  pub fn new() -> Self {
    let (tx, _rx) = watch::channel(None);
    Self { tx }
  }

  pub fn current(&self) -> Option<Identity> { self.tx.borrow().clone() }

  pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> { self.tx.subscribe() }

  pub fn sign_in(&self, identity: Identity) {
    self.tx.send_if_modified(|current| {
      if current.as_ref() == Some(&identity) {
        return false;
      }
      *current = Some(identity);
      true
    });
  }

  pub fn sign_out(&self) { self.tx.send_if_modified(|current| current.take().is_some()); }
}
