//! Message types for conversation representation.
//!
//! This module contains the core message types used by the compare view:
//! - `Message` - One turn with its metadata and prior generations
//! - `MessageKind` - Whether the turn is plain or part of a compare cluster
//! - Attachment and generation metadata

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use strum_macros::Display;

use crate::app::types::{ClusterId, MessageId, ModelKey};

/// Role in the conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Copy, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Attachment {
    Image {
        /// Either a remote URL or a `data:` URL.
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
    Document {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<u64>,
    },
}

/// Timing and token usage reported for one generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
}

/// A previous generation of a message that can be swiped back to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageVariant {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationInfo>,
}

/// How a message participates in compare clustering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageKind {
    /// An ordinary turn. It may still carry a cluster id (a follow-up inside a
    /// model's sub-thread) and the model it was addressed to or produced by.
    Plain {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cluster_id: Option<ClusterId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<ModelKey>,
    },
    /// The prompt shared by every reply of a compare turn.
    CompareUser { cluster_id: ClusterId },
    /// One model's reply to a compare prompt.
    CompareReply {
        cluster_id: ClusterId,
        model: ModelKey,
    },
}

impl MessageKind {
    pub fn plain() -> Self {
        MessageKind::Plain {
            cluster_id: None,
            model: None,
        }
    }

    pub fn cluster_id(&self) -> Option<&ClusterId> {
        match self {
            MessageKind::Plain { cluster_id, .. } => cluster_id.as_ref(),
            MessageKind::CompareUser { cluster_id } | MessageKind::CompareReply { cluster_id, .. } => {
                Some(cluster_id)
            }
        }
    }

    pub fn model(&self) -> Option<&ModelKey> {
        match self {
            MessageKind::Plain { model, .. } => model.as_ref(),
            MessageKind::CompareUser { .. } => None,
            MessageKind::CompareReply { model, .. } => Some(model),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: MessageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    pub kind: MessageKind,
    /// Display name the producer reported for the model, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<MessageVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_variant: Option<usize>,
    pub timestamp: u64,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), MessageKind::plain())
    }

    pub fn assistant(model: Option<ModelKey>, content: impl Into<String>) -> Self {
        Self::new(
            Role::Assistant,
            content.into(),
            MessageKind::Plain {
                cluster_id: None,
                model,
            },
        )
    }

    pub fn compare_user(cluster_id: ClusterId, content: impl Into<String>) -> Self {
        Self::new(
            Role::User,
            content.into(),
            MessageKind::CompareUser { cluster_id },
        )
    }

    pub fn compare_reply(
        cluster_id: ClusterId,
        model: ModelKey,
        content: impl Into<String>,
    ) -> Self {
        Self::new(
            Role::Assistant,
            content.into(),
            MessageKind::CompareReply { cluster_id, model },
        )
    }

    pub fn new(role: Role, content: String, kind: MessageKind) -> Self {
        Self {
            id: MessageId::generate(),
            server_id: None,
            role,
            content,
            attachments: Vec::new(),
            kind,
            model_name: None,
            generation: None,
            variants: Vec::new(),
            active_variant: None,
            timestamp: Self::current_timestamp(),
        }
    }

    pub fn with_id(mut self, id: impl Into<MessageId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_bot(&self) -> bool {
        self.role == Role::Assistant
    }

    pub fn cluster_id(&self) -> Option<&ClusterId> {
        self.kind.cluster_id()
    }

    pub fn model_key(&self) -> Option<&ModelKey> {
        self.kind.model()
    }

    pub fn is_compare_user(&self) -> bool {
        matches!(self.kind, MessageKind::CompareUser { .. })
    }

    pub fn is_compare_reply(&self) -> bool {
        matches!(self.kind, MessageKind::CompareReply { .. })
    }

    /// Helper to get current timestamp
    pub fn current_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    /// Text of the generation currently shown.
    pub fn displayed_content(&self) -> &str {
        match self.active_variant {
            Some(index) if index < self.variants.len() => self.variants[index].content.as_str(),
            _ => self.content.as_str(),
        }
    }

    /// Number of generations available to swipe between, including the live one.
    pub fn generation_count(&self) -> usize {
        self.variants.len() + 1
    }

    /// Get a string representation of the message content, attachments included
    pub fn content_string(&self) -> String {
        let mut parts: Vec<String> = self
            .attachments
            .iter()
            .map(|attachment| match attachment {
                Attachment::Image { mime_type, .. } => format!(
                    "[Image: {}]",
                    mime_type.as_deref().unwrap_or("unknown")
                ),
                Attachment::Document { name, .. } => format!("[Document: {name}]"),
            })
            .collect();
        let text = self.displayed_content();
        if !text.is_empty() {
            parts.push(text.to_string());
        }
        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_reply_exposes_cluster_and_model() {
        let msg = Message::compare_reply(ClusterId::from("c1"), ModelKey::from("gpt-4"), "hi");
        assert!(msg.is_bot());
        assert!(msg.is_compare_reply());
        assert_eq!(msg.cluster_id(), Some(&ClusterId::from("c1")));
        assert_eq!(msg.model_key(), Some(&ModelKey::from("gpt-4")));
    }

    #[test]
    fn plain_message_has_no_cluster_by_default() {
        let msg = Message::user("hello");
        assert_eq!(msg.cluster_id(), None);
        assert_eq!(msg.model_key(), None);
        assert_eq!(msg.role().to_string(), "user");
    }

    #[test]
    fn displayed_content_follows_active_variant() {
        let mut msg = Message::assistant(None, "third");
        msg.variants = vec![
            MessageVariant {
                content: "first".to_string(),
                generation: None,
            },
            MessageVariant {
                content: "second".to_string(),
                generation: None,
            },
        ];
        assert_eq!(msg.displayed_content(), "third");
        msg.active_variant = Some(1);
        assert_eq!(msg.displayed_content(), "second");
        msg.active_variant = Some(7);
        assert_eq!(msg.displayed_content(), "third");
        assert_eq!(msg.generation_count(), 3);
    }

    #[test]
    fn content_string_lists_attachments_first() {
        let msg = Message::user("see attached").with_attachments(vec![
            Attachment::Image {
                url: "https://example.com/a.png".to_string(),
                mime_type: Some("image/png".to_string()),
            },
            Attachment::Document {
                name: "notes.pdf".to_string(),
                mime_type: None,
                size: Some(10),
            },
        ]);
        assert_eq!(
            msg.content_string(),
            "[Image: image/png]\n[Document: notes.pdf]\nsee attached"
        );
    }
}
