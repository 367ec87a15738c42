mod blocks;
mod graph;
mod message;
pub mod wire;

pub use blocks::{Block, build_blocks, find_cluster_block};
pub use graph::Conversation;
pub use message::{
    Attachment, GenerationInfo, Message, MessageKind, MessageVariant, Role,
};
pub use wire::{Transcript, WireMessage};
