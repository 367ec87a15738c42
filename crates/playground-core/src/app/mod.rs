pub mod compare;
pub mod conversation;
pub mod events;
pub mod session;
pub mod types;

pub use session::CompareSession;
pub use types::{ClusterId, ConversationId, MessageId, ModelKey};
