use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{Transport, TransportError};
use crate::protocol::{ChatReply, ChatRequest};

/// Posts messages as JSON to a single chat endpoint
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn with_timeout(endpoint: &str, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, message: &str, user_id: &str) -> Result<ChatReply, TransportError> {
        let request = ChatRequest { message, user_id };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        // Status is not checked: error responses still carry a JSON body.
        let status = response.status();
        let body = response.bytes().await?;
        debug!(endpoint = %self.endpoint, %status, bytes = body.len(), "chat response");

        let value: Value = serde_json::from_slice(&body)?;
        Ok(ChatReply::from_value(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn transport_for(server: &MockServer) -> HttpTransport {
        HttpTransport::new(&format!("{}/chat", server.uri()))
    }

    #[tokio::test]
    async fn test_posts_message_and_user_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"message": "oi", "user_id": "u-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "reply": "Pick one",
                "options": ["A", "B"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = transport_for(&server).await.send("oi", "u-1").await.unwrap();
        assert_eq!(reply, ChatReply::reply("Pick one").with_options(["A", "B"]));
    }

    #[tokio::test]
    async fn test_error_status_with_json_body_is_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "bad"})))
            .mount(&server)
            .await;

        let reply = transport_for(&server).await.send("oi", "u-1").await.unwrap();
        assert_eq!(reply, ChatReply::error("bad"));
    }

    #[tokio::test]
    async fn test_non_json_body_is_decode_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = transport_for(&server).await.send("oi", "u-1").await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_request_failure() {
        let server = MockServer::start().await;
        let endpoint = format!("{}/chat", server.uri());
        drop(server);

        let err = HttpTransport::new(&endpoint).send("oi", "u-1").await.unwrap_err();
        assert!(matches!(err, TransportError::Request(_)));
        assert!(!err.to_string().is_empty());
    }
}
