//! Conversation store for handling multiple conversations

use super::persistence::ConversationSnapshot;
use super::store::{Conversation, ConversationHandle, Message};
use crate::config::TitleCollision;
use crate::{Error, Result};
use tracing::{debug, warn};

/// Owns every conversation, keyed by display title in display order
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    collision: TitleCollision,
}

impl ConversationStore {
    /// Create an empty store
    pub fn new(collision: TitleCollision) -> Self {
        Self {
            conversations: Vec::new(),
            collision,
        }
    }

    /// Rebuild a store from a persisted snapshot
    pub fn from_snapshot(snapshot: ConversationSnapshot, collision: TitleCollision) -> Self {
        let conversations = snapshot
            .into_entries()
            .into_iter()
            .map(|(title, messages)| Conversation::with_messages(title, messages))
            .collect();
        Self {
            conversations,
            collision,
        }
    }

    /// Capture the current state for persistence
    pub fn snapshot(&self) -> ConversationSnapshot {
        let mut snapshot = ConversationSnapshot::new();
        for conversation in &self.conversations {
            snapshot.insert(conversation.title.clone(), conversation.messages.clone());
        }
        snapshot
    }

    /// Start an empty conversation under `title`.
    ///
    /// An existing conversation with the same title is reset in place and
    /// handles to it become stale.
    pub fn create(&mut self, title: impl Into<String>) -> ConversationHandle {
        let conversation = Conversation::new(title);
        let handle = conversation.handle();

        match self.position(conversation.title()) {
            Some(index) => {
                debug!("Resetting conversation '{}'", conversation.title());
                self.conversations[index] = conversation;
            }
            None => {
                debug!("Creating conversation '{}'", conversation.title());
                self.conversations.push(conversation);
            }
        }

        handle
    }

    /// Append a message to the conversation titled `title`
    pub fn append(&mut self, title: &str, message: Message) -> Result<()> {
        let index = self.require(title)?;
        self.conversations[index].messages.push(message);
        Ok(())
    }

    /// Append a message to the conversation behind `handle`
    pub fn append_to(&mut self, handle: ConversationHandle, message: Message) -> Result<()> {
        let index = self.require_handle(handle)?;
        self.conversations[index].messages.push(message);
        Ok(())
    }

    /// Move the history under `old_title` to `new_title`.
    ///
    /// Returns the title actually applied, which differs from `new_title`
    /// only under [`TitleCollision::Disambiguate`].
    pub fn rename(&mut self, old_title: &str, new_title: &str) -> Result<String> {
        let index = self.require(old_title)?;
        Ok(self.retitle(index, new_title))
    }

    /// Change the display title of the conversation behind `handle`
    pub fn set_display_title(
        &mut self,
        handle: ConversationHandle,
        new_title: &str,
    ) -> Result<String> {
        let index = self.require_handle(handle)?;
        Ok(self.retitle(index, new_title))
    }

    /// All titles in display order
    pub fn list(&self) -> Vec<String> {
        self.conversations.iter().map(|c| c.title.clone()).collect()
    }

    /// Message history of the conversation titled `title`
    pub fn get(&self, title: &str) -> Result<&[Message]> {
        let index = self.require(title)?;
        Ok(&self.conversations[index].messages)
    }

    /// Look up the conversation behind `handle`
    pub fn resolve(&self, handle: ConversationHandle) -> Result<&Conversation> {
        let index = self.require_handle(handle)?;
        Ok(&self.conversations[index])
    }

    /// Handle of the conversation currently titled `title`
    pub fn handle_of(&self, title: &str) -> Option<ConversationHandle> {
        self.position(title).map(|i| self.conversations[i].handle)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.position(title).is_some()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn collision_policy(&self) -> TitleCollision {
        self.collision
    }

    fn retitle(&mut self, index: usize, new_title: &str) -> String {
        if self.conversations[index].title == new_title {
            return new_title.to_string();
        }

        let target = match self.collision {
            TitleCollision::Overwrite => new_title.to_string(),
            TitleCollision::Disambiguate => self.unique_title(new_title),
        };

        let mut conversation = self.conversations.remove(index);
        let old_title = std::mem::replace(&mut conversation.title, target.clone());

        match self.position(&target) {
            Some(existing) => {
                warn!(
                    "Renaming '{}' to '{}' discards {} existing messages",
                    old_title,
                    target,
                    self.conversations[existing].messages.len()
                );
                self.conversations[existing] = conversation;
            }
            None => self.conversations.push(conversation),
        }

        debug!("Renamed conversation '{}' -> '{}'", old_title, target);
        target
    }

    fn unique_title(&self, base: &str) -> String {
        if !self.contains(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{} ({})", base, n))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    fn position(&self, title: &str) -> Option<usize> {
        self.conversations.iter().position(|c| c.title == title)
    }

    fn require(&self, title: &str) -> Result<usize> {
        self.position(title)
            .ok_or_else(|| Error::NotFound(format!("conversation '{}'", title)))
    }

    fn require_handle(&self, handle: ConversationHandle) -> Result<usize> {
        self.conversations
            .iter()
            .position(|c| c.handle == handle)
            .ok_or_else(|| Error::NotFound(format!("conversation {}", handle)))
    }
}
