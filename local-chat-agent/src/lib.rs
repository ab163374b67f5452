//! Session logic for local-chat
//!
//! This crate provides the session controller, conversation auto-titling and
//! the command dispatch used by presentation layers.

pub mod command;
pub mod controller;
pub mod title;

#[cfg(test)]
mod testing;

pub use command::{Command, CommandResponse};
pub use controller::{Phase, SessionController, SessionState, TurnOutcome, SENTINEL_REPLY};
pub use title::{TitleNamer, TitleOutcome};
