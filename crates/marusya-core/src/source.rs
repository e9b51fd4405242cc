//! The client's shared view of the favorites source of truth.
//!
//! One [`FavoritesSource`] exists per client, shared by every toggle. It is
//! keyed to a single session identity: switching identity throws away the
//! previous list, and load responses are matched against the ticket that
//! started them so a list fetched for an old identity (or superseded by a
//! newer fetch) is never applied.

use std::collections::HashSet;

use crate::{
  error::Error,
  movie::MovieId,
  session::Identity,
  toggle::FavoriteToggle,
};

/// Issued when a fetch starts; hand it back with the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
  pub generation: u64,
  pub identity:   Identity,
}

/// Coarse load status for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
  /// No session, nothing to load.
  Idle,
  /// A fetch is outstanding and nothing has settled yet.
  Loading,
  /// A list is available (possibly being refreshed).
  Settled,
  /// The last fetch failed and no list is available.
  Failed,
}

#[derive(Debug, Clone, Default)]
pub struct FavoritesSource {
  identity:   Option<Identity>,
  /// `Some` once a fetch for `identity` has succeeded.
  movies:     Option<HashSet<MovieId>>,
  /// Generation of the outstanding fetch, if any.
  loading:    Option<u64>,
  last_error: Option<String>,
  generation: u64,
}

impl FavoritesSource {
  pub fn new() -> Self { Self::default() }

  pub fn identity(&self) -> Option<&Identity> { self.identity.as_ref() }

  /// Follow a session change. Drops the previous identity's list and, when
  /// signed in, returns the ticket for the fetch that must now start.
  ///
  /// Re-announcing the current identity is a no-op.
  pub fn set_identity(&mut self, identity: Option<Identity>) -> Option<LoadTicket> {
    if self.identity == identity {
      return None;
    }
    self.identity = identity;
    self.movies = None;
    self.loading = None;
    self.last_error = None;
    self.begin_load()
  }

  /// Start a fresh fetch for the current identity, keeping the last settled
  /// list visible meanwhile. Any fetch already outstanding becomes stale.
  pub fn refetch(&mut self) -> Option<LoadTicket> { self.begin_load() }

  /// Start a fetch only if nothing is settled or loading yet.
  pub fn ensure_loaded(&mut self) -> Option<LoadTicket> {
    if self.movies.is_some() || self.loading.is_some() {
      return None;
    }
    self.begin_load()
  }

  /// Forget everything, as a full page reload does.
  pub fn reset(&mut self) {
    self.identity = None;
    self.movies = None;
    self.loading = None;
    self.last_error = None;
    self.generation += 1;
  }

  fn begin_load(&mut self) -> Option<LoadTicket> {
    self.generation += 1;
    let identity = self.identity.clone()?;
    self.loading = Some(self.generation);
    Some(LoadTicket {
      generation: self.generation,
      identity,
    })
  }

  /// Apply the result of the fetch started with `ticket`.
  ///
  /// A failure keeps whatever list was settled before and is reported as
  /// [`Error::LoadFailed`]. A ticket for a superseded fetch or another
  /// identity yields [`Error::StaleCallback`] and changes nothing.
  pub fn finish_load(
    &mut self,
    ticket: &LoadTicket,
    result: Result<HashSet<MovieId>, String>,
  ) -> Result<(), Error> {
    if self.loading != Some(ticket.generation)
      || self.identity.as_ref() != Some(&ticket.identity)
    {
      return Err(Error::StaleCallback);
    }
    self.loading = None;

    match result {
      Ok(movies) => {
        self.movies = Some(movies);
        self.last_error = None;
        Ok(())
      }
      Err(reason) => {
        self.last_error = Some(reason.clone());
        Err(Error::LoadFailed(reason))
      }
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  pub fn is_settled(&self) -> bool { self.movies.is_some() }

  pub fn is_loading(&self) -> bool { self.loading.is_some() }

  pub fn last_error(&self) -> Option<&str> { self.last_error.as_deref() }

  /// Authoritative membership of `movie`, or `None` until a load settles.
  pub fn membership(&self, movie: &MovieId) -> Option<bool> {
    self.movies.as_ref().map(|movies| movies.contains(movie))
  }

  pub fn status(&self) -> LoadStatus {
    match (&self.identity, &self.movies) {
      (None, _) => LoadStatus::Idle,
      (Some(_), Some(_)) => LoadStatus::Settled,
      (Some(_), None) if self.loading.is_some() => LoadStatus::Loading,
      (Some(_), None) if self.last_error.is_some() => LoadStatus::Failed,
      (Some(_), None) => LoadStatus::Loading,
    }
  }

  /// Reconcile `toggle` against this source. Returns `true` if its flag
  /// changed.
  pub fn reconcile(&self, toggle: &mut FavoriteToggle) -> bool {
    let membership = self.membership(toggle.movie());
    toggle.reconcile_from_source(membership.is_some(), membership.unwrap_or(false))
  }
}
