//! The chat client: transcript owner and driver of request/reply exchanges

use std::sync::Arc;

use tracing::{debug, warn};

use crate::identity;
use crate::protocol::{ChatReply, Outcome, FAILURE_PREFIX};
use crate::state::{EntryId, OptionSetId, Role, Transcript};
use crate::storage::KeyValueStore;
use crate::transport::{Transport, TransportError};

/// An exchange whose request has not been answered yet.
///
/// `id` names the placeholder entry that the answer will replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingExchange {
    pub id: EntryId,
    pub message: String,
    pub user_id: String,
}

pub struct ChatClient {
    transcript: Transcript,
    transport: Arc<dyn Transport>,
    store: Box<dyn KeyValueStore>,
    user_id: Option<String>,
}

impl ChatClient {
    pub fn new(transport: Arc<dyn Transport>, store: Box<dyn KeyValueStore>) -> Self {
        Self {
            transcript: Transcript::new(),
            transport,
            store,
            user_id: None,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// User identifier sent with every request, resolved on first call.
    ///
    /// A store that cannot be read or written does not block chatting: a
    /// session-only identifier is used instead.
    pub fn user_id(&mut self) -> String {
        if let Some(id) = &self.user_id {
            return id.clone();
        }

        let id = match identity::user_id(self.store.as_mut()) {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "user id storage unavailable, using a session id");
                identity::generate()
            }
        };
        self.user_id = Some(id.clone());
        id
    }

    /// Record the user's message and a placeholder, and hand back what has
    /// to be sent.
    ///
    /// With no override the trimmed `input` is used; it is moved into the
    /// transcript and `input` is cleared. An override is sent as-is and is
    /// not added as a user entry (the caller already shows it). Returns
    /// `None` when there is nothing to send.
    pub fn begin_send(
        &mut self,
        input: &mut String,
        override_text: Option<&str>,
    ) -> Option<PendingExchange> {
        let message = match override_text.filter(|text| !text.is_empty()) {
            Some(text) => text.to_string(),
            None => {
                let typed = input.trim();
                if typed.is_empty() {
                    return None;
                }
                let typed = typed.to_string();
                self.transcript.push(Role::User, typed.as_str());
                input.clear();
                typed
            }
        };

        let id = self.transcript.push_placeholder();
        let user_id = self.user_id();
        debug!(exchange = id.0, "sending message");

        Some(PendingExchange {
            id,
            message,
            user_id,
        })
    }

    /// Settle an exchange with whatever the transport produced.
    pub fn resolve(
        &mut self,
        exchange: EntryId,
        result: Result<ChatReply, TransportError>,
    ) -> Outcome {
        match result {
            Ok(reply) => {
                if !self.transcript.resolve(exchange, reply.display_text()) {
                    debug!(exchange = exchange.0, "ignoring stale reply");
                    return Outcome::Stale;
                }
                let outcome = Outcome::of(&reply);
                if let Some(choices) = reply.options {
                    self.transcript.push_options(choices);
                }
                outcome
            }
            Err(e) => {
                warn!(exchange = exchange.0, error = %e, "chat request failed");
                if self
                    .transcript
                    .resolve(exchange, format!("{}{}", FAILURE_PREFIX, e))
                {
                    Outcome::Failed
                } else {
                    Outcome::Stale
                }
            }
        }
    }

    /// Full exchange: record, send, and resolve. `None` when nothing was sent.
    pub async fn send_message(
        &mut self,
        input: &mut String,
        override_text: Option<&str>,
    ) -> Option<Outcome> {
        let pending = self.begin_send(input, override_text)?;
        let result = self.transport.send(&pending.message, &pending.user_id).await;
        Some(self.resolve(pending.id, result))
    }

    /// Take one choice from an option set: the set disappears, the choice
    /// is shown as the user's message and sent as an override.
    pub fn choose_option(&mut self, set: OptionSetId, index: usize) -> Option<PendingExchange> {
        let choice = self
            .transcript
            .option_set(set)?
            .choices
            .get(index)?
            .clone();

        self.transcript.remove_options(set);
        self.transcript.push(Role::User, choice.as_str());

        let mut untouched = String::new();
        self.begin_send(&mut untouched, Some(&choice))
    }

    pub async fn choose_option_and_send(
        &mut self,
        set: OptionSetId,
        index: usize,
    ) -> Option<Outcome> {
        let pending = self.choose_option(set, index)?;
        let result = self.transport.send(&pending.message, &pending.user_id).await;
        Some(self.resolve(pending.id, result))
    }
}
