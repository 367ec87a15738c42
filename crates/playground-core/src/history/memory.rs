use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{BranchOrigin, ConversationService, ConversationServiceError, SeedMessage};
use crate::app::types::ConversationId;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredConversation {
    pub origin: BranchOrigin,
    pub messages: Vec<SeedMessage>,
}

/// Conversation service kept entirely in memory.
///
/// Specific `create_branch` and `add_message` calls can be made to fail,
/// counted from 1 in call order, to exercise partial-failure paths.
#[derive(Debug, Default)]
pub struct InMemoryConversationService {
    conversations: RwLock<HashMap<ConversationId, StoredConversation>>,
    create_calls: AtomicUsize,
    failing_create_calls: HashSet<usize>,
    add_calls: AtomicUsize,
    failing_add_calls: HashSet<usize>,
}

impl InMemoryConversationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failing_create_calls(calls: impl IntoIterator<Item = usize>) -> Self {
        Self {
            failing_create_calls: calls.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_failing_add_calls(calls: impl IntoIterator<Item = usize>) -> Self {
        Self {
            failing_add_calls: calls.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn conversation(&self, id: &ConversationId) -> Option<StoredConversation> {
        self.conversations
            .read()
            .ok()
            .and_then(|conversations| conversations.get(id).cloned())
    }

    pub fn len(&self) -> usize {
        self.conversations.read().map_or(0, |c| c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn create_call_count(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> ConversationServiceError {
    ConversationServiceError::unavailable(format!("in-memory store lock poisoned: {err}"))
}

#[async_trait]
impl ConversationService for InMemoryConversationService {
    async fn create_branch(
        &self,
        origin: &BranchOrigin,
        seed: &[SeedMessage],
    ) -> Result<ConversationId, ConversationServiceError> {
        let call = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_create_calls.contains(&call) {
            return Err(ConversationServiceError::unavailable(format!(
                "injected failure on create call {call}"
            )));
        }

        let id = ConversationId::generate();
        self.conversations.write().map_err(poisoned)?.insert(
            id.clone(),
            StoredConversation {
                origin: origin.clone(),
                messages: seed.to_vec(),
            },
        );
        Ok(id)
    }

    async fn add_message(
        &self,
        conversation_id: &ConversationId,
        message: SeedMessage,
    ) -> Result<(), ConversationServiceError> {
        let call = self.add_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_add_calls.contains(&call) {
            return Err(ConversationServiceError::unavailable(format!(
                "injected failure on add call {call}"
            )));
        }

        let mut conversations = self.conversations.write().map_err(poisoned)?;
        let conversation = conversations
            .get_mut(conversation_id)
            .ok_or_else(|| ConversationServiceError::not_found(conversation_id))?;
        conversation.messages.push(message);
        Ok(())
    }
}
