use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{BranchOrigin, ConversationService, ConversationServiceError, SeedMessage};
use crate::app::conversation::wire::{Transcript, WireMessage, WireParent};
use crate::app::conversation::{Message, MessageKind};
use crate::app::types::ConversationId;

/// Stores each conversation as `<id>.json` inside one directory, using the
/// front end's transcript format.
#[derive(Debug, Clone)]
pub struct FileConversationService {
    root: PathBuf,
}

impl FileConversationService {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, ConversationServiceError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, id: &ConversationId) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }

    pub async fn load(&self, id: &ConversationId) -> Result<Transcript, ConversationServiceError> {
        let path = self.path_for(id);
        if !tokio::fs::try_exists(&path).await? {
            return Err(ConversationServiceError::not_found(id));
        }
        read_transcript(&path).await
    }

    async fn save(&self, transcript: &Transcript) -> Result<(), ConversationServiceError> {
        let path = self.path_for(&transcript.conversation_id);
        let contents = serde_json::to_vec_pretty(transcript)?;
        tokio::fs::write(&path, contents).await?;
        debug!(target: "history::file", path = %path.display(), "Saved transcript");
        Ok(())
    }
}

/// Read a transcript file from disk.
pub async fn read_transcript(path: &Path) -> Result<Transcript, ConversationServiceError> {
    let contents = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&contents)?)
}

fn to_wire(seed: SeedMessage) -> WireMessage {
    let message = Message::new(seed.role, seed.content, MessageKind::plain())
        .with_attachments(seed.attachments);
    WireMessage::from(&message)
}

#[async_trait]
impl ConversationService for FileConversationService {
    async fn create_branch(
        &self,
        origin: &BranchOrigin,
        seed: &[SeedMessage],
    ) -> Result<ConversationId, ConversationServiceError> {
        let id = ConversationId::generate();
        let transcript = Transcript {
            conversation_id: id.clone(),
            title: origin.title.clone(),
            parent: Some(WireParent {
                parent_conversation_id: origin.parent_conversation_id.clone(),
                cluster_id: origin.cluster_id.clone(),
            }),
            messages: seed.iter().cloned().map(to_wire).collect(),
        };
        self.save(&transcript).await?;
        Ok(id)
    }

    async fn add_message(
        &self,
        conversation_id: &ConversationId,
        message: SeedMessage,
    ) -> Result<(), ConversationServiceError> {
        let mut transcript = self.load(conversation_id).await?;
        transcript.messages.push(to_wire(message));
        self.save(&transcript).await
    }
}
