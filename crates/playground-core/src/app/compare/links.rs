use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::app::types::{ClusterId, ConversationId};

/// Where a split chat came from, for "back to comparison" navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentLink {
    pub parent_conversation_id: ConversationId,
    pub cluster_id: ClusterId,
}

/// Breadcrumbs keyed by the child conversation id.
///
/// Unlike cluster state this outlives a conversation switch: the link is read
/// when the child conversation is opened later.
#[derive(Debug, Clone, Default)]
pub struct ParentLinks {
    links: HashMap<ConversationId, ParentLink>,
}

impl ParentLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_parent(&mut self, child: ConversationId, link: ParentLink) {
        debug!(
            target: "compare::links",
            %child,
            parent = %link.parent_conversation_id,
            cluster = %link.cluster_id,
            "Record parent link"
        );
        self.links.insert(child, link);
    }

    pub fn parent(&self, child: &ConversationId) -> Option<&ParentLink> {
        self.links.get(child)
    }

    pub fn remove(&mut self, child: &ConversationId) -> Option<ParentLink> {
        self.links.remove(child)
    }

    /// Split chats spawned from a given parent conversation.
    pub fn children_of<'a>(
        &'a self,
        parent: &'a ConversationId,
    ) -> impl Iterator<Item = (&'a ConversationId, &'a ParentLink)> + 'a {
        self.links
            .iter()
            .filter(move |(_, link)| &link.parent_conversation_id == parent)
    }
}
