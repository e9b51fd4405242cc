//! Auth gate coordination.
//!
//! The gate is a two-state machine shared by every toggle on screen. Toggles
//! that need a session register themselves while it is open; a single
//! resolution then releases all of them.

use crate::movie::MovieId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthGate {
  #[default]
  Closed,
  Open {
    /// Movies whose toggles are waiting on this gate session, in request
    /// order. Never empty while open.
    waiting: Vec<MovieId>,
  },
}

/// Whether a gate request actually opened the modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRequest {
  Opened,
  AlreadyOpen,
}

/// The outcome of closing the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateResolution {
  pub success: bool,
  pub waiting: Vec<MovieId>,
}

impl AuthGate {
  pub fn is_open(&self) -> bool { matches!(self, Self::Open { .. }) }

  pub fn waiting(&self) -> &[MovieId] {
    match self {
      Self::Closed => &[],
      Self::Open { waiting } => waiting,
    }
  }

  /// Open the gate on behalf of `movie`. Idempotent: an open gate stays open
  /// and records each movie at most once.
  pub fn request(&mut self, movie: &MovieId) -> GateRequest {
    match self {
      Self::Closed => {
        *self = Self::Open {
          waiting: vec![movie.clone()],
        };
        GateRequest::Opened
      }
      Self::Open { waiting } => {
        if !waiting.contains(movie) {
          waiting.push(movie.clone());
        }
        GateRequest::AlreadyOpen
      }
    }
  }

  /// Close the gate after a login (`success = true`) or a cancellation.
  ///
  /// Returns `None` if the gate was already closed, so a duplicated
  /// resolution cannot resume anything twice.
  pub fn resolve(&mut self, success: bool) -> Option<GateResolution> {
    match std::mem::take(self) {
      Self::Closed => None,
      Self::Open { waiting } => Some(GateResolution { success, waiting }),
    }
  }
}
