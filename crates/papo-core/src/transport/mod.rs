pub mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::ChatReply;

/// Failure to complete a request/response exchange at all.
///
/// The display text is what gets shown after the connection-failure prefix.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    Request(#[from] reqwest::Error),
    #[error("resposta não é JSON válido: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

/// Capability to deliver one message to the chat backend.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, message: &str, user_id: &str) -> Result<ChatReply, TransportError>;
}

