//! Partitioning of a flat transcript into rendering blocks.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::message::{Message, MessageKind};
use crate::app::types::{ClusterId, ModelKey};

/// One rendering unit of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Single {
        index: usize,
    },
    Compare {
        /// The shared prompt.
        user_index: usize,
        /// Every reply of the cluster, in transcript order.
        assistant_indices: Vec<usize>,
        /// Other messages swept into the cluster (sub-thread follow-ups,
        /// duplicate prompts), in transcript order.
        member_indices: Vec<usize>,
        cluster_id: ClusterId,
    },
}

impl Block {
    pub fn cluster_id(&self) -> Option<&ClusterId> {
        match self {
            Block::Single { .. } => None,
            Block::Compare { cluster_id, .. } => Some(cluster_id),
        }
    }

    /// Every message index covered by this block.
    pub fn indices(&self) -> Vec<usize> {
        match self {
            Block::Single { index } => vec![*index],
            Block::Compare {
                user_index,
                assistant_indices,
                member_indices,
                ..
            } => {
                let mut all = Vec::with_capacity(1 + assistant_indices.len() + member_indices.len());
                all.push(*user_index);
                all.extend(assistant_indices);
                all.extend(member_indices);
                all
            }
        }
    }

    /// Model keys of the replies in a compare block, in order, without duplicates.
    pub fn reply_models<'a>(&self, messages: &'a [Message]) -> Vec<&'a ModelKey> {
        let Block::Compare {
            assistant_indices, ..
        } = self
        else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        assistant_indices
            .iter()
            .filter_map(|&i| messages.get(i).and_then(Message::model_key))
            .filter(|key| seen.insert(*key))
            .collect()
    }
}

/// Group an ordered message list into single and compare blocks.
///
/// A compare block is opened at a `CompareUser` message and absorbs every
/// message anywhere in the list that shares its cluster id. Everything else is
/// a single block. Block order follows the first occurrence of each message or
/// cluster.
pub fn build_blocks(messages: &[Message]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut used = vec![false; messages.len()];

    for (index, message) in messages.iter().enumerate() {
        if used[index] {
            continue;
        }

        if let MessageKind::CompareUser { cluster_id } = &message.kind {
            used[index] = true;
            let mut assistant_indices = Vec::new();
            let mut member_indices = Vec::new();

            for (other, candidate) in messages.iter().enumerate() {
                if other == index || used[other] || candidate.cluster_id() != Some(cluster_id) {
                    continue;
                }
                used[other] = true;
                if candidate.is_compare_reply() {
                    assistant_indices.push(other);
                } else {
                    member_indices.push(other);
                }
            }

            blocks.push(Block::Compare {
                user_index: index,
                assistant_indices,
                member_indices,
                cluster_id: cluster_id.clone(),
            });
            continue;
        }

        used[index] = true;
        blocks.push(Block::Single { index });
    }

    blocks
}

/// Find the block that renders the given cluster.
pub fn find_cluster_block(messages: &[Message], cluster_id: &ClusterId) -> Option<Block> {
    build_blocks(messages)
        .into_iter()
        .find(|block| block.cluster_id() == Some(cluster_id))
}
