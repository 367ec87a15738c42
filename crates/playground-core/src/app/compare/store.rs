//! Per-cluster compare state for one conversation.
//!
//! Entries are created lazily on first write. Reading a cluster that was never
//! written yields the empty defaults, never an error.

use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::app::conversation::{Block, Message, build_blocks};
use crate::app::types::{ClusterId, ConversationId, MessageId, ModelKey};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterState {
    /// Models chosen as the answer, in the order they were chosen.
    pub selection: Vec<ModelKey>,
    /// Models receiving the next turn. `None` means "same as selection".
    pub active_models: Option<Vec<ModelKey>>,
    pub canonical: Option<MessageId>,
    pub split_chats: IndexMap<ModelKey, ConversationId>,
}

impl ClusterState {
    pub fn effective_active_models(&self) -> &[ModelKey] {
        self.active_models.as_deref().unwrap_or(&self.selection)
    }

    fn is_empty(&self) -> bool {
        self.selection.is_empty()
            && self.active_models.is_none()
            && self.canonical.is_none()
            && self.split_chats.is_empty()
    }
}

static EMPTY_CLUSTER: std::sync::LazyLock<ClusterState> =
    std::sync::LazyLock::new(ClusterState::default);

fn dedup_keys(keys: impl IntoIterator<Item = ModelKey>) -> Vec<ModelKey> {
    let mut seen = HashSet::new();
    keys.into_iter()
        .filter(|key| seen.insert(key.clone()))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct ClusterStore {
    clusters: HashMap<ClusterId, ClusterState>,
}

impl ClusterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// State of a cluster, or the empty defaults when it was never touched.
    pub fn get(&self, cluster_id: &ClusterId) -> &ClusterState {
        self.clusters.get(cluster_id).unwrap_or(&*EMPTY_CLUSTER)
    }

    fn entry(&mut self, cluster_id: &ClusterId) -> &mut ClusterState {
        self.clusters.entry(cluster_id.clone()).or_default()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn selection(&self, cluster_id: &ClusterId) -> &[ModelKey] {
        &self.get(cluster_id).selection
    }

    /// Replace the selection. The max-models limit is enforced by the caller.
    pub fn set_selection(
        &mut self,
        cluster_id: &ClusterId,
        models: impl IntoIterator<Item = ModelKey>,
    ) {
        let selection = dedup_keys(models);
        debug!(target: "compare::store", cluster = %cluster_id, ?selection, "Set selection");
        self.entry(cluster_id).selection = selection;
    }

    pub fn active_models(&self, cluster_id: &ClusterId) -> &[ModelKey] {
        self.get(cluster_id).effective_active_models()
    }

    pub fn set_active_models(
        &mut self,
        cluster_id: &ClusterId,
        models: impl IntoIterator<Item = ModelKey>,
    ) {
        let active = dedup_keys(models);
        debug!(target: "compare::store", cluster = %cluster_id, ?active, "Set active models");
        self.entry(cluster_id).active_models = Some(active);
    }

    pub fn canonical(&self, cluster_id: &ClusterId) -> Option<&MessageId> {
        self.get(cluster_id).canonical.as_ref()
    }

    /// Pin a reply as the cluster's answer, replacing any previous pin.
    pub fn pin_canonical(&mut self, cluster_id: &ClusterId, message_id: MessageId) {
        debug!(target: "compare::store", cluster = %cluster_id, message = %message_id, "Pin canonical");
        self.entry(cluster_id).canonical = Some(message_id);
    }

    pub fn unpin_canonical(&mut self, cluster_id: &ClusterId) {
        if let Some(state) = self.clusters.get_mut(cluster_id) {
            state.canonical = None;
        }
    }

    /// Pin `message_id`, or unpin when it is already the canonical reply.
    /// Returns whether the message is pinned afterwards.
    pub fn toggle_canonical(&mut self, cluster_id: &ClusterId, message_id: MessageId) -> bool {
        if self.canonical(cluster_id) == Some(&message_id) {
            self.unpin_canonical(cluster_id);
            false
        } else {
            self.pin_canonical(cluster_id, message_id);
            true
        }
    }

    pub fn split_chat(&self, cluster_id: &ClusterId, model: &ModelKey) -> Option<&ConversationId> {
        self.get(cluster_id).split_chats.get(model)
    }

    pub fn split_chats(&self, cluster_id: &ClusterId) -> &IndexMap<ModelKey, ConversationId> {
        &self.get(cluster_id).split_chats
    }

    /// Record the split chat spawned for a model. Splitting the same model
    /// again overwrites the earlier mapping.
    pub fn set_split_chat(
        &mut self,
        cluster_id: &ClusterId,
        model: ModelKey,
        conversation_id: ConversationId,
    ) {
        debug!(
            target: "compare::store",
            cluster = %cluster_id,
            %model,
            conversation = %conversation_id,
            "Record split chat"
        );
        self.entry(cluster_id).split_chats.insert(model, conversation_id);
    }

    /// Drop references to models and replies that are no longer present in
    /// the cluster.
    pub fn prune_cluster(
        &mut self,
        cluster_id: &ClusterId,
        live_models: &HashSet<&ModelKey>,
        live_replies: &HashSet<&MessageId>,
    ) {
        let Some(state) = self.clusters.get_mut(cluster_id) else {
            return;
        };

        let before = state.clone();
        state.selection.retain(|m| live_models.contains(m));
        if let Some(active) = state.active_models.as_mut() {
            active.retain(|m| live_models.contains(m));
        }
        state.split_chats.retain(|m, _| live_models.contains(m));
        if state
            .canonical
            .as_ref()
            .is_some_and(|id| !live_replies.contains(id))
        {
            state.canonical = None;
        }

        if *state != before {
            debug!(target: "compare::store", cluster = %cluster_id, "Pruned stale cluster state");
        }
        if state.is_empty() {
            self.clusters.remove(cluster_id);
        }
    }

    /// Prune every cluster against the current transcript. Clusters that no
    /// longer appear in it are dropped entirely.
    pub fn reconcile(&mut self, messages: &[Message]) {
        let blocks = build_blocks(messages);
        let mut present = HashSet::new();

        for block in &blocks {
            let Block::Compare {
                assistant_indices,
                cluster_id,
                ..
            } = block
            else {
                continue;
            };
            present.insert(cluster_id.clone());

            let replies: Vec<&Message> = assistant_indices
                .iter()
                .filter_map(|&i| messages.get(i))
                .collect();
            let live_models: HashSet<&ModelKey> =
                replies.iter().filter_map(|m| m.model_key()).collect();
            let live_replies: HashSet<&MessageId> = replies.iter().map(|m| m.id()).collect();
            self.prune_cluster(cluster_id, &live_models, &live_replies);
        }

        self.clusters.retain(|cluster_id, _| present.contains(cluster_id));
    }

    pub fn clear(&mut self) {
        debug!(target: "compare::store", clusters = self.clusters.len(), "Clearing cluster state");
        self.clusters.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{prompt, reply};

    fn cluster() -> ClusterId {
        ClusterId::from("c1")
    }

    fn keys(names: &[&str]) -> Vec<ModelKey> {
        names.iter().map(|n| ModelKey::from(*n)).collect()
    }

    #[test]
    fn untouched_cluster_reads_as_defaults() {
        let store = ClusterStore::new();
        let c = cluster();
        assert!(store.selection(&c).is_empty());
        assert!(store.active_models(&c).is_empty());
        assert_eq!(store.canonical(&c), None);
        assert!(store.split_chats(&c).is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn active_models_fall_back_to_selection() {
        let mut store = ClusterStore::new();
        let c = cluster();
        store.set_selection(&c, keys(&["a", "b"]));
        assert_eq!(store.active_models(&c), keys(&["a", "b"]).as_slice());

        store.set_active_models(&c, keys(&["b"]));
        assert_eq!(store.active_models(&c), keys(&["b"]).as_slice());
        assert_eq!(store.selection(&c), keys(&["a", "b"]).as_slice());
    }

    #[test]
    fn selection_drops_duplicates() {
        let mut store = ClusterStore::new();
        store.set_selection(&cluster(), keys(&["a", "b", "a"]));
        assert_eq!(store.selection(&cluster()), keys(&["a", "b"]).as_slice());
    }

    #[test]
    fn pinning_replaces_previous_canonical() {
        let mut store = ClusterStore::new();
        let c = cluster();
        store.pin_canonical(&c, MessageId::from("r1"));
        store.pin_canonical(&c, MessageId::from("r2"));
        assert_eq!(store.canonical(&c), Some(&MessageId::from("r2")));
        store.unpin_canonical(&c);
        assert_eq!(store.canonical(&c), None);
    }

    #[test]
    fn toggle_same_reply_unpins() {
        let mut store = ClusterStore::new();
        let c = cluster();
        assert!(store.toggle_canonical(&c, MessageId::from("r1")));
        assert!(!store.toggle_canonical(&c, MessageId::from("r1")));
        assert_eq!(store.canonical(&c), None);
        assert!(store.toggle_canonical(&c, MessageId::from("r2")));
    }

    #[test]
    fn resplitting_a_model_overwrites_the_mapping() {
        let mut store = ClusterStore::new();
        let c = cluster();
        store.set_split_chat(&c, ModelKey::from("a"), ConversationId::from("x"));
        store.set_split_chat(&c, ModelKey::from("a"), ConversationId::from("y"));
        assert_eq!(store.split_chats(&c).len(), 1);
        assert_eq!(
            store.split_chat(&c, &ModelKey::from("a")),
            Some(&ConversationId::from("y"))
        );
    }

    #[test]
    fn reconcile_prunes_models_without_live_replies() {
        let messages = vec![prompt("c1", "q"), reply("c1", "a", "ra")];
        let c = cluster();
        let mut store = ClusterStore::new();
        store.set_selection(&c, keys(&["a", "gone"]));
        store.set_active_models(&c, keys(&["gone"]));
        store.set_split_chat(&c, ModelKey::from("gone"), ConversationId::from("x"));
        store.pin_canonical(&c, MessageId::from("vanished"));

        store.reconcile(&messages);

        assert_eq!(store.selection(&c), keys(&["a"]).as_slice());
        assert!(store.active_models(&c).is_empty());
        assert!(store.split_chats(&c).is_empty());
        assert_eq!(store.canonical(&c), None);
    }

    #[test]
    fn reconcile_keeps_live_canonical_and_drops_missing_clusters() {
        let messages = vec![prompt("c1", "q"), reply("c1", "a", "ra")];
        let reply_id = messages[1].id().clone();
        let mut store = ClusterStore::new();
        store.pin_canonical(&cluster(), reply_id.clone());
        store.set_selection(&ClusterId::from("other"), keys(&["a"]));

        store.reconcile(&messages);

        assert_eq!(store.canonical(&cluster()), Some(&reply_id));
        assert!(store.selection(&ClusterId::from("other")).is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn clear_resets_every_cluster() {
        let mut store = ClusterStore::new();
        store.set_selection(&cluster(), keys(&["a"]));
        store.clear();
        assert!(store.is_empty());
    }
}
