//! Session controller: orchestrates conversations, completions, titling
//! and persistence in response to presentation-layer commands

use local_chat_core::config::SessionConfig;
use local_chat_core::session::{
    Conversation, ConversationHandle, ConversationStore, Message, PersistenceGateway,
};
use local_chat_core::utils::preview;
use local_chat_core::{Error, Result};
use local_chat_providers::ChatProvider;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::title::{TitleNamer, TitleOutcome};

/// Assistant reply recorded when the completion service fails
pub const SENTINEL_REPLY: &str = "An error occurred while querying the LLM.";

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingModelList,
    Ready,
}

/// Per-session mutable values, passed into every controller operation
#[derive(Debug, Clone)]
pub struct SessionState {
    phase: Phase,
    current_model: Option<String>,
    models: Vec<String>,
    current: Option<ConversationHandle>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            current_model: None,
            models: Vec::new(),
            current: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_model(&self) -> Option<&str> {
        self.current_model.as_deref()
    }

    /// Models known from the last listing
    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn current_handle(&self) -> Option<ConversationHandle> {
        self.current
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one `send_message` turn
#[derive(Debug)]
pub struct TurnOutcome {
    /// Title of the conversation once the turn finished
    pub conversation: String,
    /// The assistant message that was recorded
    pub reply: Message,
    /// Why the sentinel reply was recorded instead of a real one
    pub completion_error: Option<Error>,
    pub title: TitleOutcome,
}

impl TurnOutcome {
    /// Whether the recorded reply is the sentinel
    pub fn is_fallback(&self) -> bool {
        self.completion_error.is_some()
    }
}

/// Orchestrates one user's session against the completion service
pub struct SessionController {
    provider: Arc<dyn ChatProvider>,
    namer: TitleNamer,
    store: ConversationStore,
    gateway: PersistenceGateway,
    placeholder_title: String,
}

impl SessionController {
    /// Create a controller, loading persisted conversations through `gateway`
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        gateway: PersistenceGateway,
        config: &SessionConfig,
    ) -> Result<Self> {
        let snapshot = gateway.load()?;
        let store = ConversationStore::from_snapshot(snapshot, config.title_collision);
        info!(
            "Loaded {} conversations from {:?}",
            store.len(),
            gateway.path()
        );

        Ok(Self {
            namer: TitleNamer::new(provider.clone()),
            provider,
            store,
            gateway,
            placeholder_title: config.placeholder_title.clone(),
        })
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn placeholder_title(&self) -> &str {
        &self.placeholder_title
    }

    /// Fetch the model list, pick the first model and open a fresh
    /// conversation. On failure the session returns to `Idle`.
    pub async fn start(&mut self, state: &mut SessionState) -> Result<()> {
        self.connect(state).await?;
        self.start_conversation(state)?;
        Ok(())
    }

    /// Fetch the model list and pick the first model without touching any
    /// conversation. `send_message` opens one if none is selected later.
    pub async fn connect(&mut self, state: &mut SessionState) -> Result<()> {
        if state.phase != Phase::Idle {
            return Err(Error::InvalidState(format!(
                "session already started ({:?})",
                state.phase
            )));
        }

        state.phase = Phase::AwaitingModelList;
        let models = match self.provider.list_models().await {
            Ok(models) => models,
            Err(e) => {
                state.phase = Phase::Idle;
                return Err(e.into());
            }
        };

        state.current_model = models.first().cloned();
        state.models = models;
        state.phase = Phase::Ready;
        match &state.current_model {
            Some(model) => info!("Session ready with model {}", model),
            None => warn!("Session ready but the service offers no models"),
        }
        Ok(())
    }

    /// Open an empty conversation under the placeholder title and make it
    /// current
    pub fn start_conversation(&mut self, state: &mut SessionState) -> Result<String> {
        Self::ensure_ready(state)?;
        let handle = self.store.create(self.placeholder_title.clone());
        state.current = Some(handle);
        Ok(self.placeholder_title.clone())
    }

    /// Use `name` for subsequent completions
    pub fn select_model(&self, state: &mut SessionState, name: &str) -> Result<()> {
        Self::ensure_ready(state)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("model name must not be empty".to_string()));
        }
        if !state.models.iter().any(|m| m == name) {
            warn!("Selecting model '{}' which the service did not list", name);
        }
        state.current_model = Some(name.to_string());
        Ok(())
    }

    /// Run one turn. Blank text is ignored and yields `None`.
    pub async fn send_message(
        &mut self,
        state: &mut SessionState,
        text: &str,
    ) -> Result<Option<TurnOutcome>> {
        Self::ensure_ready(state)?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let handle = match state.current.filter(|h| self.store.resolve(*h).is_ok()) {
            Some(handle) => handle,
            None => {
                debug!("No live current conversation, starting one");
                self.start_conversation(state)?;
                state
                    .current
                    .ok_or_else(|| Error::InvalidState("no current conversation".to_string()))?
            }
        };

        self.store.append_to(handle, Message::user(text))?;
        let history = self.store.resolve(handle)?.messages().to_vec();

        info!(
            "Sending message to '{}': {} (model: {})",
            self.store.resolve(handle)?.title(),
            preview(text, 80),
            state.current_model.as_deref().unwrap_or("<none>")
        );

        let completion = match state.current_model.as_deref() {
            Some(model) => self
                .provider
                .complete(model, &history)
                .await
                .map_err(Error::from),
            None => Err(Error::Validation("no model selected".to_string())),
        };

        let (reply, completion_error) = match completion {
            Ok(reply) => (reply, None),
            Err(e) => {
                warn!("Completion failed, recording fallback reply: {}", e);
                (Message::assistant(SENTINEL_REPLY), Some(e))
            }
        };

        self.store.append_to(handle, reply.clone())?;
        self.persist()?;

        let title = match (&completion_error, state.current_model.clone()) {
            (None, Some(model)) if self.needs_title(handle) => {
                let outcome = self.namer.apply(&mut self.store, handle, &model).await;
                if let TitleOutcome::Renamed { .. } = outcome {
                    self.persist()?;
                }
                outcome
            }
            _ => TitleOutcome::Skipped,
        };

        Ok(Some(TurnOutcome {
            conversation: self.store.resolve(handle)?.title().to_string(),
            reply,
            completion_error,
            title,
        }))
    }

    /// Make `title` the current conversation and return its history
    pub fn select_conversation(
        &self,
        state: &mut SessionState,
        title: &str,
    ) -> Result<Vec<Message>> {
        Self::ensure_ready(state)?;
        let handle = self
            .store
            .handle_of(title)
            .ok_or_else(|| Error::NotFound(format!("conversation '{}'", title)))?;
        state.current = Some(handle);
        Ok(self.store.resolve(handle)?.messages().to_vec())
    }

    pub fn list_conversations(&self, state: &SessionState) -> Result<Vec<String>> {
        Self::ensure_ready(state)?;
        Ok(self.store.list())
    }

    /// Refresh the model list from the service. The current model is kept;
    /// a session without one adopts the first listed model.
    pub async fn list_models(&self, state: &mut SessionState) -> Result<Vec<String>> {
        Self::ensure_ready(state)?;
        let models = self.provider.list_models().await?;
        if state.current_model.is_none() {
            state.current_model = models.first().cloned();
        }
        state.models = models.clone();
        Ok(models)
    }

    /// The conversation currently on display, if it still exists
    pub fn current_conversation(&self, state: &SessionState) -> Option<&Conversation> {
        state.current.and_then(|h| self.store.resolve(h).ok())
    }

    pub fn current_messages(&self, state: &SessionState) -> &[Message] {
        self.current_conversation(state)
            .map(|c| c.messages())
            .unwrap_or(&[])
    }

    fn needs_title(&self, handle: ConversationHandle) -> bool {
        self.store
            .resolve(handle)
            .map(|c| c.title() == self.placeholder_title)
            .unwrap_or(false)
    }

    fn persist(&self) -> Result<()> {
        self.gateway.save(&self.store.snapshot())
    }

    fn ensure_ready(state: &SessionState) -> Result<()> {
        if state.phase == Phase::Ready {
            Ok(())
        } else {
            Err(Error::InvalidState(format!(
                "session is {:?}, commands need a ready session",
                state.phase
            )))
        }
    }
}
