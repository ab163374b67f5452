//! Tagged command entry point for presentation layers

use local_chat_core::session::Message;
use local_chat_core::Result;

use crate::controller::{SessionController, SessionState, TurnOutcome};

/// A user command addressed to a ready session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartConversation,
    SelectModel(String),
    SendMessage(String),
    SelectConversation(String),
    ListConversations,
    ListModels,
}

impl Command {
    /// Variant name, safe to log without message content
    pub fn name(&self) -> &'static str {
        match self {
            Command::StartConversation => "start_conversation",
            Command::SelectModel(_) => "select_model",
            Command::SendMessage(_) => "send_message",
            Command::SelectConversation(_) => "select_conversation",
            Command::ListConversations => "list_conversations",
            Command::ListModels => "list_models",
        }
    }
}

/// What a command produced
#[derive(Debug)]
pub enum CommandResponse {
    ConversationStarted { title: String },
    ModelSelected { model: String },
    /// `None` when the message was blank
    Turn(Option<TurnOutcome>),
    ConversationSelected { title: String, messages: Vec<Message> },
    Conversations(Vec<String>),
    Models(Vec<String>),
}

impl SessionController {
    /// Route a command to the matching controller operation
    pub async fn dispatch(
        &mut self,
        state: &mut SessionState,
        command: Command,
    ) -> Result<CommandResponse> {
        tracing::debug!("Dispatching {}", command.name());
        match command {
            Command::StartConversation => {
                let title = self.start_conversation(state)?;
                Ok(CommandResponse::ConversationStarted { title })
            }
            Command::SelectModel(model) => {
                self.select_model(state, &model)?;
                let model = state.current_model().unwrap_or_default().to_string();
                Ok(CommandResponse::ModelSelected { model })
            }
            Command::SendMessage(text) => {
                let outcome = self.send_message(state, &text).await?;
                Ok(CommandResponse::Turn(outcome))
            }
            Command::SelectConversation(title) => {
                let messages = self.select_conversation(state, &title)?;
                Ok(CommandResponse::ConversationSelected { title, messages })
            }
            Command::ListConversations => {
                Ok(CommandResponse::Conversations(self.list_conversations(state)?))
            }
            Command::ListModels => Ok(CommandResponse::Models(self.list_models(state).await?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;
    use local_chat_core::config::SessionConfig;
    use local_chat_core::session::PersistenceGateway;
    use local_chat_core::Error;
    use tempfile::TempDir;

    async fn ready(
        provider: std::sync::Arc<ScriptedProvider>,
        dir: &TempDir,
    ) -> (SessionController, SessionState) {
        let gateway = PersistenceGateway::new(dir.path().join("conversations.json"));
        let mut controller =
            SessionController::new(provider, gateway, &SessionConfig::default()).unwrap();
        let mut state = SessionState::new();
        controller.start(&mut state).await.unwrap();
        (controller, state)
    }

    #[tokio::test]
    async fn test_dispatch_full_session() {
        let dir = TempDir::new().unwrap();
        let provider = ScriptedProvider::new(vec!["llama3", "mistral"])
            .reply("Hello there")
            .reply("Greeting");
        let (mut controller, mut state) = ready(provider, &dir).await;

        let response = controller
            .dispatch(&mut state, Command::SelectModel("mistral".to_string()))
            .await
            .unwrap();
        assert!(matches!(
            response,
            CommandResponse::ModelSelected { ref model } if model == "mistral"
        ));

        let response = controller
            .dispatch(&mut state, Command::SendMessage("hi".to_string()))
            .await
            .unwrap();
        match response {
            CommandResponse::Turn(Some(outcome)) => {
                assert_eq!(outcome.reply.content(), "Hello there");
                assert_eq!(outcome.conversation, "Greeting");
            }
            other => panic!("unexpected response {:?}", other),
        }

        let response = controller
            .dispatch(&mut state, Command::ListConversations)
            .await
            .unwrap();
        assert!(matches!(
            response,
            CommandResponse::Conversations(ref titles) if titles == &["Greeting"]
        ));

        let response = controller
            .dispatch(&mut state, Command::StartConversation)
            .await
            .unwrap();
        assert!(matches!(
            response,
            CommandResponse::ConversationStarted { ref title } if title == "New chat"
        ));

        let response = controller
            .dispatch(&mut state, Command::SelectConversation("Greeting".to_string()))
            .await
            .unwrap();
        match response {
            CommandResponse::ConversationSelected { title, messages } => {
                assert_eq!(title, "Greeting");
                assert_eq!(messages.len(), 2);
            }
            other => panic!("unexpected response {:?}", other),
        }

        let response = controller
            .dispatch(&mut state, Command::ListModels)
            .await
            .unwrap();
        assert!(matches!(
            response,
            CommandResponse::Models(ref models) if models == &["llama3", "mistral"]
        ));
    }

    #[test]
    fn test_command_name_omits_payload() {
        let command = Command::SendMessage("my bank password is hunter2".to_string());
        assert_eq!(command.name(), "send_message");
        assert_eq!(
            Command::SelectConversation("Trip plans".to_string()).name(),
            "select_conversation"
        );
        assert_eq!(Command::ListModels.name(), "list_models");
    }

    #[tokio::test]
    async fn test_dispatch_blank_message() {
        let dir = TempDir::new().unwrap();
        let (mut controller, mut state) = ready(ScriptedProvider::new(vec!["llama3"]), &dir).await;

        let response = controller
            .dispatch(&mut state, Command::SendMessage("   ".to_string()))
            .await
            .unwrap();
        assert!(matches!(response, CommandResponse::Turn(None)));
    }

    #[tokio::test]
    async fn test_dispatch_propagates_not_found() {
        let dir = TempDir::new().unwrap();
        let (mut controller, mut state) = ready(ScriptedProvider::new(vec!["llama3"]), &dir).await;

        let err = controller
            .dispatch(&mut state, Command::SelectConversation("nope".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
