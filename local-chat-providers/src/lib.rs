//! Chat completion providers for local-chat
//!
//! This crate provides the provider abstraction, the Ollama client and a
//! wrapper that bounds every call with a deadline and a cancellation token.

pub mod base;
pub mod ollama;

pub use base::{with_deadline, ChatProvider, ProviderError, ProviderResult};
pub use ollama::OllamaClient;

use async_trait::async_trait;
use local_chat_core::session::Message;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A provider whose calls can time out and be cancelled from outside
pub struct GuardedProvider {
    inner: Arc<dyn ChatProvider>,
    timeout: Option<Duration>,
    cancel: RwLock<CancellationToken>,
}

impl GuardedProvider {
    /// Wrap `inner`; `None` disables the deadline
    pub fn new(inner: Arc<dyn ChatProvider>, timeout: Option<Duration>) -> Self {
        Self {
            inner,
            timeout,
            cancel: RwLock::new(CancellationToken::new()),
        }
    }

    /// Build from a timeout in seconds where 0 means no deadline
    pub fn with_timeout_secs(inner: Arc<dyn ChatProvider>, secs: u64) -> Self {
        let timeout = (secs > 0).then(|| Duration::from_secs(secs));
        Self::new(inner, timeout)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Cancel every call currently in flight. Later calls are unaffected.
    pub fn cancel_pending(&self) {
        let previous = match self.cancel.write() {
            Ok(mut token) => std::mem::replace(&mut *token, CancellationToken::new()),
            Err(poisoned) => {
                std::mem::replace(&mut *poisoned.into_inner(), CancellationToken::new())
            }
        };
        info!("Cancelling pending completion requests");
        previous.cancel();
    }

    fn current_token(&self) -> CancellationToken {
        match self.cancel.read() {
            Ok(token) => token.child_token(),
            Err(poisoned) => poisoned.into_inner().child_token(),
        }
    }
}

#[async_trait]
impl ChatProvider for GuardedProvider {
    async fn list_models(&self) -> ProviderResult<Vec<String>> {
        let token = self.current_token();
        with_deadline(self.inner.list_models(), self.timeout, &token).await
    }

    async fn complete(&self, model: &str, history: &[Message]) -> ProviderResult<Message> {
        let token = self.current_token();
        with_deadline(self.inner.complete(model, history), self.timeout, &token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stalled;

    #[async_trait]
    impl ChatProvider for Stalled {
        async fn list_models(&self) -> ProviderResult<Vec<String>> {
            std::future::pending().await
        }

        async fn complete(&self, _model: &str, _history: &[Message]) -> ProviderResult<Message> {
            std::future::pending().await
        }
    }

    struct Echo;

    #[async_trait]
    impl ChatProvider for Echo {
        async fn list_models(&self) -> ProviderResult<Vec<String>> {
            Ok(vec!["echo".to_string()])
        }

        async fn complete(&self, _model: &str, history: &[Message]) -> ProviderResult<Message> {
            let last = history.last().map(|m| m.content().to_string()).unwrap_or_default();
            Ok(Message::assistant(last))
        }
    }

    #[tokio::test]
    async fn test_stalled_service_hits_deadline() {
        let provider = GuardedProvider::new(Arc::new(Stalled), Some(Duration::from_millis(20)));
        let err = provider.complete("m", &[Message::user("hi")]).await.unwrap_err();
        assert!(matches!(err, ProviderError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_cancel_pending_only_affects_in_flight_calls() {
        let provider = Arc::new(GuardedProvider::new(Arc::new(Stalled), None));

        let in_flight = {
            let provider = provider.clone();
            tokio::spawn(async move { provider.list_models().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        provider.cancel_pending();

        let err = in_flight.await.unwrap().unwrap_err();
        match err {
            ProviderError::ServiceUnavailable(msg) => assert_eq!(msg, "request cancelled"),
            other => panic!("expected cancellation, got {:?}", other),
        }

        let fresh = GuardedProvider::new(Arc::new(Echo), None);
        fresh.cancel_pending();
        let reply = fresh.complete("echo", &[Message::user("still works")]).await;
        assert_eq!(reply.unwrap().content(), "still works");
    }

    #[test]
    fn test_zero_seconds_disables_deadline() {
        assert_eq!(GuardedProvider::with_timeout_secs(Arc::new(Echo), 0).timeout(), None);
        assert_eq!(
            GuardedProvider::with_timeout_secs(Arc::new(Echo), 3).timeout(),
            Some(Duration::from_secs(3))
        );
    }
}
