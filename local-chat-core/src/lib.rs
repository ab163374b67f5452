//! Core types for local-chat
//!
//! This crate provides the conversation model, the conversation store and
//! its JSON persistence, configuration, logging and the shared error type
//! used by all other local-chat components.

pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod utils;

pub use error::{Error, Result};
