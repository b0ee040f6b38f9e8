//! Wire format of the chat endpoint
//!
//! One request/response pair: the client posts the message text and its
//! user identifier, the server answers with any subset of a reply, an
//! error and a list of quick-reply options.

use serde::Serialize;
use serde_json::Value;

pub const ERROR_PREFIX: &str = "Erro: ";
pub const FAILURE_PREFIX: &str = "Falha ao conectar: ";
pub const UNEXPECTED_RESPONSE: &str = "Resposta inesperada.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    pub user_id: &'a str,
}

/// Decoded server response. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub reply: Option<String>,
    pub error: Option<String>,
    pub options: Option<Vec<String>>,
}

impl ChatReply {
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            reply: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            error: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Decode from an arbitrary JSON value.
    ///
    /// `reply` and `error` only count as present when they are non-empty
    /// strings. `options` keeps the non-empty string elements of an array
    /// and is dropped when none remain. Anything that is not an object
    /// decodes to an empty reply.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let text_field = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let options = obj
            .get("options")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|choices| !choices.is_empty());

        Self {
            reply: text_field("reply"),
            error: text_field("error"),
            options,
        }
    }

    /// Text that replaces the placeholder for this response
    pub fn display_text(&self) -> String {
        if let Some(reply) = &self.reply {
            reply.clone()
        } else if let Some(error) = &self.error {
            format!("{}{}", ERROR_PREFIX, error)
        } else {
            UNEXPECTED_RESPONSE.to_string()
        }
    }
}

/// Terminal state of one exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Replied,
    Errored,
    Unexpected,
    Failed,
    /// The exchange id was unknown or already resolved.
    Stale,
}

impl Outcome {
    pub fn of(reply: &ChatReply) -> Self {
        if reply.reply.is_some() {
            Outcome::Replied
        } else if reply.error.is_some() {
            Outcome::Errored
        } else {
            Outcome::Unexpected
        }
    }
}
