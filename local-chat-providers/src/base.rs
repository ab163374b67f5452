//! Base trait for chat completion providers

use async_trait::async_trait;
use local_chat_core::session::Message;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Error type for provider operations
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Connection failure, non-success status, timeout or cancellation
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// A success status carrying a payload that does not follow the protocol
    #[error("unexpected response: {0}")]
    Protocol(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::ServiceUnavailable(e.to_string())
    }
}

impl From<ProviderError> for local_chat_core::Error {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::ServiceUnavailable(msg) => local_chat_core::Error::ServiceUnavailable(msg),
            ProviderError::Protocol(msg) => local_chat_core::Error::Protocol(msg),
        }
    }
}

/// Trait for chat completion services
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Names of the models the service offers, in service order
    async fn list_models(&self) -> ProviderResult<Vec<String>>;

    /// Produce one assistant reply for `history` using `model`
    async fn complete(&self, model: &str, history: &[Message]) -> ProviderResult<Message>;
}

/// Run `request` bounded by an optional deadline and a cancellation token.
///
/// Expiry and cancellation both surface as
/// [`ProviderError::ServiceUnavailable`]. A token that is already cancelled
/// wins over a request that is ready immediately.
pub async fn with_deadline<T, F>(
    request: F,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> ProviderResult<T>
where
    F: Future<Output = ProviderResult<T>>,
{
    let bounded = async move {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, request).await.map_err(|_| {
                ProviderError::ServiceUnavailable(format!(
                    "no response within {}s",
                    limit.as_secs_f64()
                ))
            })?,
            None => request.await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ProviderError::ServiceUnavailable(
            "request cancelled".to_string(),
        )),
        result = bounded => result,
    }
}
