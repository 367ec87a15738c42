//! State container for one open conversation in the compare view.

use std::collections::HashSet;
use tracing::debug;

use crate::app::compare::ClusterStore;
use crate::app::conversation::Conversation;
use crate::app::types::{ClusterId, ConversationId, ModelKey};

/// What the composer will do with the next submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposerState {
    /// Whether the next turn fans out to several models.
    pub compare_mode: bool,
    /// Models receiving the next turn. In single-model mode at most the first
    /// entry is used.
    pub models: Vec<ModelKey>,
}

/// One conversation plus all compare state derived for it.
///
/// Cluster state, composer state and UI flags are scoped to this session and
/// dropped when another conversation is loaded or history is cleared.
#[derive(Debug, Clone)]
pub struct CompareSession {
    pub conversation: Conversation,
    pub clusters: ClusterStore,
    pub composer: ComposerState,
    /// Clusters whose comparison is actively going on (display stays open).
    engaged: HashSet<ClusterId>,
    /// Clusters where the user expanded the collapsed alternatives.
    expanded: HashSet<ClusterId>,
}

impl CompareSession {
    pub fn new(conversation_id: ConversationId) -> Self {
        Self::from_conversation(Conversation::new(conversation_id))
    }

    pub fn from_conversation(conversation: Conversation) -> Self {
        Self {
            conversation,
            clusters: ClusterStore::new(),
            composer: ComposerState::default(),
            engaged: HashSet::new(),
            expanded: HashSet::new(),
        }
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation.id
    }

    /// Replace the open conversation, resetting every piece of derived state.
    /// Composer settings carry over.
    pub fn load(&mut self, conversation: Conversation) {
        debug!(
            target: "compare::session",
            from = %self.conversation.id,
            to = %conversation.id,
            "Switching conversation"
        );
        self.conversation = conversation;
        self.reset_derived();
    }

    /// Wipe history and all cluster state.
    pub fn clear_history(&mut self) {
        self.conversation.clear();
        self.reset_derived();
    }

    fn reset_derived(&mut self) {
        self.clusters.clear();
        self.engaged.clear();
        self.expanded.clear();
    }

    pub fn is_engaged(&self, cluster_id: &ClusterId) -> bool {
        self.engaged.contains(cluster_id)
    }

    pub fn set_engaged(&mut self, cluster_id: &ClusterId, engaged: bool) {
        if engaged {
            self.engaged.insert(cluster_id.clone());
        } else {
            self.engaged.remove(cluster_id);
        }
    }

    /// Whether the cluster's comparison is still in progress: compare mode is
    /// on and the cluster has not been decided since it was (re)opened.
    pub fn is_comparing(&self, cluster_id: &ClusterId) -> bool {
        self.composer.compare_mode && self.is_engaged(cluster_id)
    }

    /// Turn compare mode off. No cluster stays engaged afterwards.
    pub fn leave_compare_mode(&mut self) {
        self.composer.compare_mode = false;
        self.engaged.clear();
    }

    pub fn disengage_all(&mut self) {
        self.engaged.clear();
    }

    pub fn is_expanded(&self, cluster_id: &ClusterId) -> bool {
        self.expanded.contains(cluster_id)
    }

    /// "Expand alternatives" toggle for a collapsed cluster.
    pub fn toggle_expanded(&mut self, cluster_id: &ClusterId) -> bool {
        if self.expanded.remove(cluster_id) {
            false
        } else {
            self.expanded.insert(cluster_id.clone());
            true
        }
    }

    /// Drop cluster state that refers to replies no longer in the transcript,
    /// e.g. after an edit or regeneration replaced part of the history.
    pub fn reconcile(&mut self) {
        self.clusters.reconcile(self.conversation.messages());
        let live: HashSet<&ClusterId> = self
            .conversation
            .messages()
            .iter()
            .filter_map(|m| m.cluster_id())
            .collect();
        self.engaged.retain(|c| live.contains(c));
        self.expanded.retain(|c| live.contains(c));
    }
}
