//! User-visible notifications ("toasts") emitted by the favorites flow.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
  Success,
  Info,
  Warning,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
  pub level:   Level,
  pub message: String,
}

impl Notification {
  pub fn new(level: Level, message: impl Into<String>) -> Self {
    Self { level, message: message.into() }
  }

  pub fn added() -> Self { Self::new(Level::Success, "Movie added to favorites") }

  pub fn removed() -> Self { Self::new(Level::Success, "Movie removed from favorites") }

  pub fn update_failed() -> Self { Self::new(Level::Error, "Error updating favorites") }

  pub fn load_failed() -> Self { Self::new(Level::Warning, "Could not load favorites") }

  pub fn login_failed(reason: impl Into<String>) -> Self { Self::new(Level::Error, reason) }

  pub fn credentials_required() -> Self { Self::new(Level::Warning, "Enter email and password") }

  pub fn registration_incomplete(problem: &str) -> Self { Self::new(Level::Warning, problem) }

  pub fn restore_failed() -> Self { Self::new(Level::Warning, "Could not restore session") }

  pub fn logout_failed() -> Self { Self::new(Level::Error, "Could not sign out") }
}
