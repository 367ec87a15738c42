//! The persisted message shape used by the chat front end.
//!
//! Every compare-related field is optional on the wire. Conversion into
//! [`Message`] resolves the model key and degrades malformed compare
//! messages to plain ones instead of failing.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::message::{Attachment, GenerationInfo, Message, MessageKind, MessageVariant, Role};
use crate::app::types::{ClusterId, ConversationId, MessageId, ModelKey};

pub const COMPARE_USER: &str = "compare:user";
pub const COMPARE_REPLY: &str = "compare:reply";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WireDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<WireDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_info: Option<GenerationInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<WireVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_variant_index: Option<usize>,
    #[serde(default)]
    pub timestamp: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WireVariant {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_info: Option<GenerationInfo>,
}

/// Parent breadcrumb stored on a split chat's transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WireParent {
    pub parent_conversation_id: ConversationId,
    pub cluster_id: ClusterId,
}

/// A whole conversation as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub conversation_id: ConversationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<WireParent>,
    #[serde(default)]
    pub messages: Vec<WireMessage>,
}

impl Transcript {
    pub fn into_messages(self) -> Vec<Message> {
        self.messages.into_iter().map(Message::from).collect()
    }
}

fn non_empty(value: Option<&String>) -> Option<&String> {
    value.filter(|v| !v.trim().is_empty())
}

impl WireMessage {
    /// Model identifier: `modelId`, then `modelName`, then `name`.
    pub fn resolve_model_key(&self) -> Option<ModelKey> {
        non_empty(self.model_id.as_ref())
            .or_else(|| non_empty(self.model_name.as_ref()))
            .or_else(|| non_empty(self.name.as_ref()))
            .map(|key| ModelKey::new(key.clone()))
    }

    fn resolve_kind(&self) -> MessageKind {
        let cluster_id = non_empty(self.cluster_id.as_ref()).map(|c| ClusterId::from(c.as_str()));
        let model = self.resolve_model_key();

        match (self.message_type.as_deref(), cluster_id) {
            (Some(COMPARE_USER), Some(cluster_id)) => MessageKind::CompareUser { cluster_id },
            (Some(COMPARE_REPLY), Some(cluster_id)) => match model {
                Some(model) => MessageKind::CompareReply { cluster_id, model },
                None => {
                    warn!(
                        target: "conversation::wire",
                        id = %self.id,
                        "compare reply without a model identifier, treating as plain"
                    );
                    MessageKind::Plain {
                        cluster_id: Some(cluster_id),
                        model: None,
                    }
                }
            },
            (Some(kind @ (COMPARE_USER | COMPARE_REPLY)), None) => {
                warn!(
                    target: "conversation::wire",
                    id = %self.id,
                    message_type = kind,
                    "compare message without a cluster id, treating as plain"
                );
                MessageKind::Plain {
                    cluster_id: None,
                    model,
                }
            }
            (_, cluster_id) => MessageKind::Plain { cluster_id, model },
        }
    }
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        let kind = wire.resolve_kind();
        let mut attachments: Vec<Attachment> = wire
            .images
            .into_iter()
            .map(|url| Attachment::Image {
                mime_type: None,
                url,
            })
            .collect();
        attachments.extend(wire.documents.into_iter().map(|doc| Attachment::Document {
            name: doc.name,
            mime_type: doc.mime_type,
            size: doc.size,
        }));

        let variants: Vec<MessageVariant> = wire
            .variants
            .into_iter()
            .map(|v| MessageVariant {
                content: v.message,
                generation: v.generation_info,
            })
            .collect();
        let active_variant = wire
            .active_variant_index
            .filter(|&index| index < variants.len());

        Message {
            id: MessageId::from(wire.id),
            server_id: wire.server_id,
            role: if wire.is_bot {
                Role::Assistant
            } else {
                Role::User
            },
            content: wire.message,
            attachments,
            kind,
            model_name: wire.model_name,
            generation: wire.generation_info,
            variants,
            active_variant,
            timestamp: wire.timestamp,
        }
    }
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        let (message_type, cluster_id, model_id) = match &message.kind {
            MessageKind::Plain { cluster_id, model } => (
                None,
                cluster_id.as_ref().map(ToString::to_string),
                model.as_ref().map(ToString::to_string),
            ),
            MessageKind::CompareUser { cluster_id } => {
                (Some(COMPARE_USER.to_string()), Some(cluster_id.to_string()), None)
            }
            MessageKind::CompareReply { cluster_id, model } => (
                Some(COMPARE_REPLY.to_string()),
                Some(cluster_id.to_string()),
                Some(model.to_string()),
            ),
        };

        let mut images = Vec::new();
        let mut documents = Vec::new();
        for attachment in &message.attachments {
            match attachment {
                Attachment::Image { url, .. } => images.push(url.clone()),
                Attachment::Document {
                    name,
                    mime_type,
                    size,
                } => documents.push(WireDocument {
                    name: name.clone(),
                    mime_type: mime_type.clone(),
                    size: *size,
                }),
            }
        }

        WireMessage {
            id: message.id.to_string(),
            server_id: message.server_id.clone(),
            is_bot: message.is_bot(),
            message: message.content.clone(),
            images,
            documents,
            message_type,
            cluster_id,
            model_id,
            model_name: message.model_name.clone(),
            name: None,
            generation_info: message.generation.clone(),
            variants: message
                .variants
                .iter()
                .map(|v| WireVariant {
                    message: v.content.clone(),
                    generation_info: v.generation.clone(),
                })
                .collect(),
            active_variant_index: message.active_variant,
            timestamp: message.timestamp,
        }
    }
}
