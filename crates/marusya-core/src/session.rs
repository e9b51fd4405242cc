//! Users, session identities and login credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account as returned by `GET /profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  #[serde(rename = "id")]
  pub user_id:    Uuid,
  pub email:      String,
  pub name:       String,
  pub surname:    String,
  #[serde(default = "Utc::now")]
  pub created_at: DateTime<Utc>,
}

/// Input for creating an account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:         String,
  pub name:          String,
  pub surname:       String,
  pub password_hash: String,
}

/// The authenticated-user identity a favorites list belongs to.
///
/// Two identities are the same session owner iff their `user_id`s match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
  pub user_id: Uuid,
  pub email:   String,
}

impl From<&User> for Identity {
  fn from(user: &User) -> Self {
    Self { user_id: user.user_id, email: user.email.clone() }
  }
}

/// Email/password pair entered in the auth gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
  pub email:    String,
  pub password: String,
}

impl Credentials {
  /// Blank fields are rejected before any request is made.
  pub fn is_complete(&self) -> bool {
    !self.email.trim().is_empty() && !self.password.trim().is_empty()
  }
}

/// Sign-up form entered in the auth gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
  pub email:            String,
  pub name:             String,
  pub surname:          String,
  pub password:         String,
  pub confirm_password: String,
}

impl Registration {
  /// The first thing wrong with the form, if anything.
  pub fn problem(&self) -> Option<&'static str> {
    if self.email.trim().is_empty() {
      Some("Enter email")
    } else if self.name.trim().is_empty() {
      Some("Enter first name")
    } else if self.surname.trim().is_empty() {
      Some("Enter last name")
    } else if self.password.trim().is_empty() {
      Some("Enter password")
    } else if self.confirm_password != self.password {
      Some("Passwords do not match")
    } else {
      None
    }
  }

  /// The login that follows a successful sign-up.
  pub fn credentials(&self) -> Credentials {
    Credentials {
      email:    self.email.trim().to_owned(),
      password: self.password.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn credentials_require_both_fields() {
    let blank = Credentials::default();
    assert!(!blank.is_complete());
    let missing_password = Credentials { email: "a@b.c".into(), password: "  ".into() };
    assert!(!missing_password.is_complete());
    let ok = Credentials { email: "a@b.c".into(), password: "secret".into() };
    assert!(ok.is_complete());
  }

  #[test]
  fn user_profile_uses_id_key() {
    let json = r#"{"id":"6f1c1c84-52d5-4a5e-9d1d-5b8a0f9e4a11","email":"a@b.c","name":"Ann","surname":"Lee"}"#;
    let user: User = serde_json::from_str(json).unwrap();
    assert_eq!(user.email, "a@b.c");
    let identity = Identity::from(&user);
    assert_eq!(identity.user_id, user.user_id);
  }

  #[test]
  fn registration_checks_every_field() {
    let mut form = Registration {
      email:            " ann@example.com ".into(),
      name:             "Ann".into(),
      surname:          "Lee".into(),
      password:         "secret".into(),
      confirm_password: "secret".into(),
    };
    assert_eq!(form.problem(), None);
    assert_eq!(form.credentials().email, "ann@example.com");

    form.confirm_password = "secreT".into();
    assert_eq!(form.problem(), Some("Passwords do not match"));

    form.surname = " ".into();
    assert_eq!(form.problem(), Some("Enter last name"));

    form.password.clear();
    form.name.clear();
    assert_eq!(form.problem(), Some("Enter first name"));

    assert_eq!(Registration::default().problem(), Some("Enter email"));
  }
}
