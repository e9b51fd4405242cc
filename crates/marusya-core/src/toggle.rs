//! The favorite toggle controller, one instance per displayed movie.
//!
//! The controller is a synchronous reducer. UI clicks, gate resolutions,
//! mutation outcomes and favorites loads are fed in as method calls; anything
//! that has to happen asynchronously comes back out as a value
//! ([`ToggleCommand`], [`MutationRequest`]) for the caller to execute.
//!
//! The local state is an explicit [`TogglePhase`] rather than independent
//! flags, so a pending gate action can never coexist with an in-flight
//! mutation.

use serde::{Deserialize, Serialize};

use crate::{
  error::Error,
  movie::MovieId,
  notify::Notification,
  session::Identity,
};

// ─── Actions ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteAction {
  Add,
  Remove,
}

impl FavoriteAction {
  /// The action a signed-in click expresses given the current flag.
  pub fn toggling(favorite: bool) -> Self {
    if favorite { Self::Remove } else { Self::Add }
  }

  /// The flag value this action leads to.
  pub fn target(self) -> bool { matches!(self, Self::Add) }
}

// ─── Requests and outcomes ───────────────────────────────────────────────────

/// Identifies one mutation issued by one controller.
///
/// A response whose ticket no longer matches the controller's in-flight
/// mutation is stale and is discarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MutationTicket {
  pub movie: MovieId,
  pub seq:   u64,
}

/// A mutation the caller must send to the favorites service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRequest {
  pub ticket: MutationTicket,
  pub action: FavoriteAction,
}

impl MutationRequest {
  pub fn movie(&self) -> &MovieId { &self.ticket.movie }
}

/// What the favorites service answered for a [`MutationRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
  Succeeded,
  Failed(String),
}

/// The settled result of a mutation, after rollback has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
  pub action: FavoriteAction,
  pub result: Result<(), Error>,
}

impl Settlement {
  pub fn notification(&self) -> Notification {
    match (&self.result, self.action) {
      (Ok(()), FavoriteAction::Add) => Notification::added(),
      (Ok(()), FavoriteAction::Remove) => Notification::removed(),
      (Err(_), _) => Notification::update_failed(),
    }
  }

  /// A successful write should be followed by a favorites re-fetch so other
  /// views of the same list stay consistent.
  pub fn needs_refetch(&self) -> bool { self.result.is_ok() }
}

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TogglePhase {
  /// Nothing outstanding.
  Idle,
  /// A signed-out click is waiting for the auth gate to resolve.
  Pending(FavoriteAction),
  /// A mutation is outstanding; `previous` is the flag to restore on failure.
  InFlight {
    action:   FavoriteAction,
    previous: bool,
    seq:      u64,
  },
}

/// What a click asks the caller to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleCommand {
  /// The click was swallowed (busy, or the gate is already pending).
  Ignored,
  /// No session: open the auth gate for this movie.
  OpenGate,
  /// Send this mutation.
  Mutate(MutationRequest),
}

/// The triple the UI renders for one movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToggleView {
  pub favorite: bool,
  pub busy:     bool,
  /// `true` once a favorites load has settled for the current session.
  pub settled:  bool,
}

#[derive(Debug, Clone)]
pub struct FavoriteToggle {
  movie:    MovieId,
  favorite: bool,
  settled:  bool,
  phase:    TogglePhase,
  seq:      u64,
}

impl FavoriteToggle {
  /// Create the controller for a movie that just became visible.
  ///
  /// The flag starts `false` and is not trusted until a favorites load
  /// settles via [`reconcile_from_source`](Self::reconcile_from_source).
  pub fn mount(movie: MovieId) -> Self {
    Self {
      movie,
      favorite: false,
      settled: false,
      phase: TogglePhase::Idle,
      seq: 0,
    }
  }

  pub fn movie(&self) -> &MovieId { &self.movie }

  pub fn is_favorite(&self) -> bool { self.favorite }

  pub fn is_busy(&self) -> bool { matches!(self.phase, TogglePhase::InFlight { .. }) }

  pub fn phase(&self) -> &TogglePhase { &self.phase }

  pub fn pending_action(&self) -> Option<FavoriteAction> {
    match self.phase {
      TogglePhase::Pending(action) => Some(action),
      _ => None,
    }
  }

  pub fn view(&self) -> ToggleView {
    ToggleView {
      favorite: self.favorite,
      busy:     self.is_busy(),
      settled:  self.settled,
    }
  }

  // ── Clicks ────────────────────────────────────────────────────────────

  /// Handle a click on the toggle.
  ///
  /// Busy clicks are dropped, not queued. Without a session the click always
  /// expresses "add", whatever the local flag says, and defers it behind the
  /// auth gate.
  pub fn on_toggle_clicked(&mut self, session: Option<&Identity>) -> ToggleCommand {
    if self.is_busy() {
      return ToggleCommand::Ignored;
    }

    match session {
      None => {
        if self.pending_action().is_some() {
          return ToggleCommand::Ignored;
        }
        self.phase = TogglePhase::Pending(FavoriteAction::Add);
        ToggleCommand::OpenGate
      }
      Some(_) => {
        let action = FavoriteAction::toggling(self.favorite);
        self
          .perform_action(action)
          .map_or(ToggleCommand::Ignored, ToggleCommand::Mutate)
      }
    }
  }

  /// Apply `action` optimistically and return the request to send.
  ///
  /// Returns `None` if a mutation is already in flight for this movie.
  pub fn perform_action(&mut self, action: FavoriteAction) -> Option<MutationRequest> {
    if self.is_busy() {
      return None;
    }

    let previous = self.favorite;
    self.favorite = action.target();
    self.seq += 1;
    self.phase = TogglePhase::InFlight {
      action,
      previous,
      seq: self.seq,
    };

    Some(MutationRequest {
      ticket: MutationTicket {
        movie: self.movie.clone(),
        seq:   self.seq,
      },
      action,
    })
  }

  // ── Gate ──────────────────────────────────────────────────────────────

  /// Resume or drop the deferred action once the auth gate closes.
  ///
  /// The pending slot is emptied before anything runs, so resolving the same
  /// gate session twice issues at most one request.
  pub fn on_auth_gate_resolved(&mut self, success: bool) -> Option<MutationRequest> {
    let TogglePhase::Pending(action) = self.phase else {
      return None;
    };
    self.phase = TogglePhase::Idle;

    if !success {
      return None;
    }
    self.perform_action(action)
  }

  // ── Mutation results ──────────────────────────────────────────────────

  /// Settle the in-flight mutation identified by `ticket`.
  ///
  /// On failure the flag is rolled back to its pre-action value. Either way
  /// the controller leaves the busy state. A ticket that does not match the
  /// current in-flight mutation yields [`Error::StaleCallback`] and changes
  /// nothing.
  pub fn on_mutation_settled(
    &mut self,
    ticket: &MutationTicket,
    outcome: MutationOutcome,
  ) -> Result<Settlement, Error> {
    if ticket.movie != self.movie {
      return Err(Error::StaleCallback);
    }
    let TogglePhase::InFlight { action, previous, seq } = self.phase else {
      return Err(Error::StaleCallback);
    };
    if seq != ticket.seq {
      return Err(Error::StaleCallback);
    }

    self.phase = TogglePhase::Idle;

    let result = match outcome {
      MutationOutcome::Succeeded => Ok(()),
      MutationOutcome::Failed(reason) => {
        self.favorite = previous;
        Err(Error::MutationFailed {
          movie: self.movie.clone(),
          reason,
        })
      }
    };

    Ok(Settlement { action, result })
  }

  // ── Reconciliation ────────────────────────────────────────────────────

  /// Overwrite the flag with the authoritative membership once it is known.
  ///
  /// While the source is still loading nothing changes. While a mutation is
  /// in flight the optimistic value wins. Returns `true` if the flag changed.
  pub fn reconcile_from_source(&mut self, source_settled: bool, membership: bool) -> bool {
    if !source_settled {
      return false;
    }
    self.settled = true;

    if self.is_busy() {
      return false;
    }
    let changed = self.favorite != membership;
    self.favorite = membership;
    changed
  }

  /// The session identity changed (login, logout or a different user).
  ///
  /// The cached flag belongs to the old identity, so it is reset and must
  /// wait for a fresh load. An in-flight mutation was issued for the old
  /// identity; its response will be stale. A pending gate action survives,
  /// since a login completing is exactly what it waits for.
  pub fn on_session_changed(&mut self) {
    self.favorite = false;
    self.settled = false;
    if self.is_busy() {
      self.phase = TogglePhase::Idle;
    }
  }
}
