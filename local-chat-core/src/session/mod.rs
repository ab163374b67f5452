//! Conversation management
//!
//! Conversations are kept in memory by [`ConversationStore`] and written
//! as one JSON document by [`PersistenceGateway`].

pub mod manager;
pub mod persistence;
pub mod store;

pub use manager::ConversationStore;
pub use persistence::{ConversationSnapshot, PersistenceGateway};
pub use store::{Conversation, ConversationHandle, Message, Role};
