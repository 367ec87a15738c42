//! Read-only views the renderer consults for each compare block.

use serde::Serialize;
use strum_macros::Display;

use crate::app::conversation::{Block, Message};
use crate::app::session::CompareSession;
use crate::app::types::{ClusterId, ConversationId, MessageId, ModelKey};
use crate::model_registry::ModelRegistry;

/// Display mode of one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum DisplayMode {
    /// Every reply shown, selection editable.
    Open,
    /// Exactly one model chosen; the other replies are collapsed.
    Chosen,
}

pub fn is_chosen(session: &CompareSession, cluster_id: &ClusterId, model: &ModelKey) -> bool {
    session.clusters.selection(cluster_id).contains(model)
}

pub fn has_single_choice(session: &CompareSession, cluster_id: &ClusterId) -> bool {
    session.clusters.selection(cluster_id).len() == 1
}

/// Number of collapsed alternatives: every other reply when exactly one model
/// is chosen, otherwise zero.
pub fn alternatives_count(
    session: &CompareSession,
    cluster_id: &ClusterId,
    total_replies: usize,
) -> usize {
    if has_single_choice(session, cluster_id) {
        total_replies.saturating_sub(1)
    } else {
        0
    }
}

/// `Chosen` once exactly one model is selected and the cluster's comparison is
/// no longer in progress.
pub fn display_mode(session: &CompareSession, cluster_id: &ClusterId) -> DisplayMode {
    if has_single_choice(session, cluster_id) && !session.is_comparing(cluster_id) {
        DisplayMode::Chosen
    } else {
        DisplayMode::Open
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyView {
    pub index: usize,
    pub message_id: MessageId,
    pub model: Option<ModelKey>,
    pub label: String,
    pub chosen: bool,
    pub canonical: bool,
    pub split_chat: Option<ConversationId>,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterView {
    pub cluster_id: ClusterId,
    pub user_index: usize,
    pub mode: DisplayMode,
    pub expanded: bool,
    pub replies: Vec<ReplyView>,
    /// Replies hidden behind "expand alternatives".
    pub hidden_count: usize,
}

impl ClusterView {
    /// Build the view for a compare block. Returns `None` for single blocks.
    pub fn build(
        session: &CompareSession,
        messages: &[Message],
        block: &Block,
        registry: &ModelRegistry,
    ) -> Option<Self> {
        let Block::Compare {
            user_index,
            assistant_indices,
            cluster_id,
            ..
        } = block
        else {
            return None;
        };

        let mode = display_mode(session, cluster_id);
        let expanded = session.is_expanded(cluster_id);
        let state = session.clusters.get(cluster_id);

        let replies: Vec<ReplyView> = assistant_indices
            .iter()
            .filter_map(|&index| messages.get(index).map(|m| (index, m)))
            .map(|(index, message)| {
                let model = message.model_key().cloned();
                let chosen = model
                    .as_ref()
                    .is_some_and(|m| state.selection.contains(m));
                let label = match &model {
                    Some(key) => registry.label_for(key),
                    None => message
                        .model_name
                        .clone()
                        .unwrap_or_else(|| "unknown".to_string()),
                };
                ReplyView {
                    index,
                    message_id: message.id().clone(),
                    split_chat: model
                        .as_ref()
                        .and_then(|m| state.split_chats.get(m).cloned()),
                    canonical: state.canonical.as_ref() == Some(message.id()),
                    visible: mode == DisplayMode::Open || expanded || chosen,
                    model,
                    label,
                    chosen,
                }
            })
            .collect();

        let hidden_count = replies.iter().filter(|r| !r.visible).count();

        Some(Self {
            cluster_id: cluster_id.clone(),
            user_index: *user_index,
            mode,
            expanded,
            replies,
            hidden_count,
        })
    }

    pub fn visible_replies(&self) -> impl Iterator<Item = &ReplyView> {
        self.replies.iter().filter(|r| r.visible)
    }
}
