use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::MessengerError;

/// Reply used for events that carry no text (stickers, attachments, read
/// receipts).
pub const FALLBACK_REPLY: &str = "I can't echo this";

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub messaging: Vec<MessagingEvent>,
}

#[derive(Debug, Deserialize)]
pub struct MessagingEvent {
    pub sender: Option<Party>,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Party {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    recipient: Recipient<'a>,
    message: OutgoingMessage<'a>,
}

#[derive(Debug, Serialize)]
struct Recipient<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct OutgoingMessage<'a> {
    text: &'a str,
}

/// Yields `(sender_id, reply_text)` for every event in every entry.
/// Events without a sender cannot be answered and are dropped.
pub fn messaging_events(payload: &WebhookPayload) -> Vec<(String, String)> {
    payload
        .entry
        .iter()
        .flat_map(|entry| entry.messaging.iter())
        .filter_map(|event| {
            let Some(sender) = &event.sender else {
                tracing::warn!("dropping messaging event without sender");
                return None;
            };
            let text = event
                .message
                .as_ref()
                .and_then(|m| m.text.clone())
                .unwrap_or_else(|| FALLBACK_REPLY.to_string());
            Some((sender.id.clone(), text))
        })
        .collect()
}

#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(&self, recipient: &str, text: &str) -> Result<(), MessengerError>;
}

/// Client for the Graph API send endpoint.
#[derive(Debug, Clone)]
pub struct GraphClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl GraphClient {
    pub fn new(http: Client, base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            access_token: access_token.into(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/me/messages", self.base_url)
    }
}

#[async_trait]
impl MessageSender for GraphClient {
    async fn send_message(&self, recipient: &str, text: &str) -> Result<(), MessengerError> {
        let body = SendRequest {
            recipient: Recipient { id: recipient },
            message: OutgoingMessage { text },
        };

        let res = self
            .http
            .post(self.messages_url())
            .query(&[("access_token", self.access_token.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(MessengerError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Echoes every event in the payload back to its sender. Delivery failures
/// are logged and do not stop the remaining sends.
pub async fn relay(sender: &dyn MessageSender, payload: &WebhookPayload) -> usize {
    let mut delivered = 0;
    for (recipient, text) in messaging_events(payload) {
        tracing::info!(sender = %recipient, text = %text, "incoming message");
        match sender.send_message(&recipient, &text).await {
            Ok(()) => delivered += 1,
            Err(e) => {
                tracing::error!(recipient = %recipient, error = %e, "error sending message");
            }
        }
    }
    delivered
}
