//! Core types, collaborator traits and state machines for Marusya favorites.
//!
//! No HTTP, database or async runtime in here. Every state transition is a
//! synchronous reducer step; the plumbing that feeds results back in lives
//! in `marusya-cli`.

// Trait methods return `impl Future + Send` explicitly; implementors use
// plain `async fn`.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod gate;
pub mod movie;
pub mod notify;
pub mod remote;
pub mod session;
pub mod source;
pub mod store;
pub mod toggle;

pub use error::{Error, Result};
