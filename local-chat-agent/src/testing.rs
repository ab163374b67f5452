//! In-memory provider with scripted answers for controller tests

use async_trait::async_trait;
use local_chat_core::session::Message;
use local_chat_providers::{ChatProvider, ProviderError, ProviderResult};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

enum Scripted {
    Reply(String),
    Unavailable,
    Protocol,
}

pub(crate) struct ScriptedProvider {
    models: Option<Vec<String>>,
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<(String, Vec<Message>)>>,
}

impl ScriptedProvider {
    pub(crate) fn new(models: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            models: Some(models.into_iter().map(String::from).collect()),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// A service whose model listing fails
    pub(crate) fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            models: None,
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn reply(self: Arc<Self>, content: &str) -> Arc<Self> {
        self.push(Scripted::Reply(content.to_string()));
        self
    }

    pub(crate) fn fail_unavailable(self: Arc<Self>) -> Arc<Self> {
        self.push(Scripted::Unavailable);
        self
    }

    pub(crate) fn fail_protocol(self: Arc<Self>) -> Arc<Self> {
        self.push(Scripted::Protocol);
        self
    }

    pub(crate) fn requests(&self) -> Vec<(String, Vec<Message>)> {
        self.requests.lock().unwrap().clone()
    }

    fn push(&self, step: Scripted) {
        self.script.lock().unwrap().push_back(step);
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn list_models(&self) -> ProviderResult<Vec<String>> {
        self.models
            .clone()
            .ok_or_else(|| ProviderError::ServiceUnavailable("connection refused".to_string()))
    }

    async fn complete(&self, model: &str, history: &[Message]) -> ProviderResult<Message> {
        self.requests
            .lock()
            .unwrap()
            .push((model.to_string(), history.to_vec()));

        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Scripted::Reply(content)) => Ok(Message::assistant(content)),
            Some(Scripted::Protocol) => Err(ProviderError::Protocol(
                "missing message.content".to_string(),
            )),
            Some(Scripted::Unavailable) | None => Err(ProviderError::ServiceUnavailable(
                "connection refused".to_string(),
            )),
        }
    }
}
