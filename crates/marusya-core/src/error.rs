//! Error taxonomy for the favorites synchronisation core.

use thiserror::Error;

use crate::movie::MovieId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// A favorite action was attempted without a session. The controller
  /// handles this by gating, so it only surfaces when a queued request loses
  /// its session before it can be sent.
  #[error("sign in to use favorites")]
  Unauthenticated,

  #[error("failed to update favorites for movie {movie}: {reason}")]
  MutationFailed { movie: MovieId, reason: String },

  #[error("failed to load favorites: {0}")]
  LoadFailed(String),

  /// A response arrived for a controller or load that no longer exists.
  #[error("discarded stale response")]
  StaleCallback,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
