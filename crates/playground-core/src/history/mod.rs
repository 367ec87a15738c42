//! The chat-history service that owns stored conversations.
//!
//! The compare core never persists anything itself; it hands seed messages to
//! a [`ConversationService`] and keeps only the returned id.

mod file;
mod memory;

pub use file::{FileConversationService, read_transcript};
pub use memory::{InMemoryConversationService, StoredConversation};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::conversation::{Attachment, Message, Role};
use crate::app::types::{ClusterId, ConversationId};

#[derive(Debug, Error)]
pub enum ConversationServiceError {
    #[error("Conversation service unavailable: {message}")]
    Unavailable { message: String },

    #[error("Conversation not found: {conversation_id}")]
    NotFound { conversation_id: String },

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConversationServiceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn not_found(conversation_id: &ConversationId) -> Self {
        Self::NotFound {
            conversation_id: conversation_id.to_string(),
        }
    }
}

/// One message handed to the history service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl From<&Message> for SeedMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role(),
            content: message.displayed_content().to_string(),
            attachments: message.attachments.clone(),
        }
    }
}

/// Metadata for a conversation created as a split from a compare cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchOrigin {
    pub parent_conversation_id: ConversationId,
    pub cluster_id: ClusterId,
    pub title: Option<String>,
}

#[async_trait]
pub trait ConversationService: Send + Sync {
    /// Create a new conversation seeded with `seed` and return its id.
    async fn create_branch(
        &self,
        origin: &BranchOrigin,
        seed: &[SeedMessage],
    ) -> Result<ConversationId, ConversationServiceError>;

    /// Append one message to an existing conversation.
    async fn add_message(
        &self,
        conversation_id: &ConversationId,
        message: SeedMessage,
    ) -> Result<(), ConversationServiceError>;
}
