//! Auto-titling of conversations from their opening message

use local_chat_core::session::{ConversationHandle, ConversationStore, Message};
use local_chat_core::{Error, Result};
use local_chat_providers::ChatProvider;
use std::sync::Arc;
use tracing::{debug, info, warn};

const TITLE_INSTRUCTION: &str = "Summarize this chat request in 3-5 words:";

/// What happened to a conversation's title after a turn
#[derive(Debug)]
pub enum TitleOutcome {
    /// The conversation was retitled
    Renamed { from: String, to: String },
    /// No titling was attempted
    Skipped,
    /// Summarization failed and the title was left unchanged
    Failed(Error),
}

impl TitleOutcome {
    pub fn new_title(&self) -> Option<&str> {
        match self {
            TitleOutcome::Renamed { to, .. } => Some(to),
            _ => None,
        }
    }
}

/// Derives short conversation titles through the completion service
pub struct TitleNamer {
    provider: Arc<dyn ChatProvider>,
}

impl TitleNamer {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    /// The one-shot instruction sent for `opening_user_message`
    pub fn prompt_for(opening_user_message: &str) -> String {
        format!("{}\n{}", TITLE_INSTRUCTION, opening_user_message)
    }

    /// Ask the service for a title. The reply content is returned verbatim.
    pub async fn summarize(&self, model: &str, opening_user_message: &str) -> Result<String> {
        let request = [Message::user(Self::prompt_for(opening_user_message))];
        let reply = self.provider.complete(model, &request).await?;
        debug!("Title candidate: {:?}", reply.content());
        Ok(reply.content().to_string())
    }

    /// Summarize the conversation behind `handle` and retitle it.
    ///
    /// Never fails: a summarization error leaves the title untouched and is
    /// returned as [`TitleOutcome::Failed`].
    pub async fn apply(
        &self,
        store: &mut ConversationStore,
        handle: ConversationHandle,
        model: &str,
    ) -> TitleOutcome {
        let (from, opening) = match store.resolve(handle) {
            Ok(conversation) => match conversation.opening_user_message() {
                Some(message) => (
                    conversation.title().to_string(),
                    message.content().to_string(),
                ),
                None => return TitleOutcome::Skipped,
            },
            Err(e) => return TitleOutcome::Failed(e),
        };

        let candidate = match self.summarize(model, &opening).await {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!("Could not title conversation '{}': {}", from, e);
                return TitleOutcome::Failed(e);
            }
        };

        match store.set_display_title(handle, &candidate) {
            Ok(to) => {
                info!("Conversation '{}' titled '{}'", from, to);
                TitleOutcome::Renamed { from, to }
            }
            Err(e) => TitleOutcome::Failed(e),
        }
    }
}
