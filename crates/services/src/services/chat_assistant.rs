//! Site chat assistant.
//!
//! The caller owns the conversation and sends it whole on every turn. Replies
//! may carry a structured payload (a navigation hint, a suggested palette)
//! alongside the prose; the payload is pulled out of the text after the
//! fact, so it does not matter whether the text arrived in one piece or was
//! streamed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use super::{
    ai_client::{AiClient, AiClientError, Message},
    chat_payload,
};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are the assistant for laundromatzat.com, a \
personal portfolio of videos, photos and small creative tools. Answer briefly. When the user \
asks to go somewhere on the site, include a JSON object {\"action\": \"navigate\", \"target\": \
\"<path>\"} in your reply.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct AssistantReply {
    pub text: String,
    #[ts(type = "unknown")]
    pub payload: Option<Value>,
}

impl AssistantReply {
    pub fn from_text(text: String) -> Self {
        let payload = chat_payload::extract_structured(&text);
        Self { text, payload }
    }
}

#[derive(Debug, Clone)]
pub struct ChatAssistant {
    client: AiClient,
    system_prompt: String,
}

impl ChatAssistant {
    pub fn new(client: AiClient) -> Self {
        Self::with_system_prompt(client, DEFAULT_SYSTEM_PROMPT)
    }

    pub fn with_system_prompt(client: AiClient, system_prompt: impl Into<String>) -> Self {
        Self {
            client,
            system_prompt: system_prompt.into(),
        }
    }

    /// Answers the last turn of `conversation`.
    ///
    /// System messages sent by the caller are dropped; the assistant's own
    /// prompt always leads.
    pub async fn reply(&self, conversation: Vec<Message>) -> Result<AssistantReply, AiClientError> {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(Message::system(self.system_prompt.as_str()));
        messages.extend(conversation.into_iter().filter(|m| m.role != "system"));

        let text = self.client.chat(&messages).await?;
        tracing::debug!(
            turns = messages.len() - 1,
            reply_len = text.len(),
            "Assistant replied"
        );
        Ok(AssistantReply::from_text(text))
    }

    /// Builds a reply from text that already arrived in chunks.
    pub fn reply_from_chunks<I, S>(chunks: I) -> AssistantReply
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text = chunks.into_iter().fold(String::new(), |mut acc, chunk| {
            acc.push_str(chunk.as_ref());
            acc
        });
        AssistantReply::from_text(text)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn chunks_are_joined_before_extraction() {
        let chunks = [
            "Taking you there. {\"action\": \"nav",
            "igate\", \"target\": \"/tools/color",
            "-palette\"}",
        ];
        let reply = ChatAssistant::reply_from_chunks(chunks);
        assert!(reply.text.starts_with("Taking you there."));
        assert_eq!(
            reply.payload,
            Some(json!({ "action": "navigate", "target": "/tools/color-palette" }))
        );
    }

    #[test]
    fn plain_reply_has_no_payload() {
        let reply = AssistantReply::from_text("The studio is in Portland.".to_string());
        assert_eq!(reply.payload, None);
    }

    #[test]
    fn empty_stream_yields_empty_reply() {
        let reply = ChatAssistant::reply_from_chunks(Vec::<String>::new());
        assert_eq!(reply.text, "");
        assert!(reply.payload.is_none());
    }
}
