use serde::{Deserialize, Serialize};
use tracing::debug;

use super::message::{Attachment, Message, MessageVariant};
use crate::app::types::{ClusterId, ConversationId, MessageId, ModelKey};
use crate::error::{Error, Result};

/// Ordered message history of one conversation.
///
/// Messages are appended and mutated in place; they are never removed one by
/// one. History is either cleared wholesale or branched into a new
/// conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new(id: ConversationId) -> Self {
        Self {
            id,
            messages: Vec::new(),
        }
    }

    pub fn with_messages(id: ConversationId, messages: Vec<Message>) -> Self {
        Self { id, messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, message_id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id() == message_id)
    }

    fn get_mut(&mut self, message_id: &MessageId) -> Result<&mut Message> {
        self.messages
            .iter_mut()
            .find(|m| m.id() == message_id)
            .ok_or_else(|| Error::NotFound(format!("message {message_id}")))
    }

    pub fn add_message(&mut self, message: Message) -> &Message {
        debug!(target: "conversation::add_message", id = %message.id(), kind = ?message.kind, "Adding message");
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn push_user(&mut self, text: impl Into<String>, attachments: Vec<Attachment>) -> MessageId {
        let message = Message::user(text).with_attachments(attachments);
        self.add_message(message).id().clone()
    }

    pub fn push_assistant(&mut self, model: Option<ModelKey>, text: impl Into<String>) -> MessageId {
        self.add_message(Message::assistant(model, text)).id().clone()
    }

    /// Append one compare turn: a shared prompt plus an empty reply per model,
    /// all tagged with a fresh cluster id.
    pub fn fan_out_compare(
        &mut self,
        prompt: impl Into<String>,
        attachments: Vec<Attachment>,
        models: &[ModelKey],
    ) -> ClusterId {
        let cluster_id = ClusterId::generate();
        self.add_message(
            Message::compare_user(cluster_id.clone(), prompt).with_attachments(attachments),
        );
        for model in models {
            self.add_message(Message::compare_reply(
                cluster_id.clone(),
                model.clone(),
                String::new(),
            ));
        }
        debug!(
            target: "conversation::fan_out_compare",
            cluster = %cluster_id,
            replies = models.len(),
            "Started compare turn"
        );
        cluster_id
    }

    /// Append a streamed chunk to the live generation of a message.
    pub fn append_content(&mut self, message_id: &MessageId, chunk: &str) -> Result<()> {
        let message = self.get_mut(message_id)?;
        message.content.push_str(chunk);
        Ok(())
    }

    pub fn edit_content(&mut self, message_id: &MessageId, text: impl Into<String>) -> Result<()> {
        let message = self.get_mut(message_id)?;
        message.content = text.into();
        message.active_variant = None;
        Ok(())
    }

    /// Archive the live generation as a variant and start a new, empty one.
    pub fn regenerate(&mut self, message_id: &MessageId) -> Result<()> {
        let message = self.get_mut(message_id)?;
        let previous = MessageVariant {
            content: std::mem::take(&mut message.content),
            generation: message.generation.take(),
        };
        message.variants.push(previous);
        message.active_variant = None;
        Ok(())
    }

    /// Show generation `index`, where `variants.len()` is the live one.
    pub fn swipe_variant(&mut self, message_id: &MessageId, index: usize) -> Result<()> {
        let message = self.get_mut(message_id)?;
        let available = message.variants.len();
        if index > available {
            return Err(Error::InvalidOperation(format!(
                "variant {index} out of range for message {} ({} generations)",
                message.id(),
                available + 1
            )));
        }
        message.active_variant = (index < available).then_some(index);
        Ok(())
    }

    pub fn clear(&mut self) {
        debug!(target: "conversation::clear", id = %self.id, "Clearing conversation");
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::conversation::MessageKind;

    fn conversation() -> Conversation {
        Conversation::new(ConversationId::from("conv_test"))
    }

    #[test]
    fn fan_out_creates_prompt_and_one_reply_per_model() {
        let mut conv = conversation();
        let models = [ModelKey::from("gpt-4"), ModelKey::from("claude-3")];
        let cluster = conv.fan_out_compare("Explain ownership", vec![], &models);

        assert_eq!(conv.len(), 3);
        assert_eq!(
            conv.messages[0].kind,
            MessageKind::CompareUser {
                cluster_id: cluster.clone()
            }
        );
        for (message, model) in conv.messages[1..].iter().zip(&models) {
            assert_eq!(
                message.kind,
                MessageKind::CompareReply {
                    cluster_id: cluster.clone(),
                    model: model.clone()
                }
            );
            assert!(message.content.is_empty());
        }
    }

    #[test]
    fn streaming_appends_to_the_live_generation() {
        let mut conv = conversation();
        let id = conv.push_assistant(None, "Hel");
        conv.append_content(&id, "lo").unwrap();
        assert_eq!(conv.get(&id).unwrap().content, "Hello");
    }

    #[test]
    fn regenerate_then_swipe_between_generations() {
        let mut conv = conversation();
        let id = conv.push_assistant(None, "first");
        conv.regenerate(&id).unwrap();
        conv.append_content(&id, "second").unwrap();

        let message = conv.get(&id).unwrap();
        assert_eq!(message.generation_count(), 2);
        assert_eq!(message.displayed_content(), "second");

        conv.swipe_variant(&id, 0).unwrap();
        assert_eq!(conv.get(&id).unwrap().displayed_content(), "first");

        conv.swipe_variant(&id, 1).unwrap();
        assert_eq!(conv.get(&id).unwrap().active_variant, None);

        assert!(matches!(
            conv.swipe_variant(&id, 2),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn mutating_unknown_message_reports_not_found() {
        let mut conv = conversation();
        let result = conv.append_content(&MessageId::from("missing"), "x");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn clear_drops_all_history() {
        let mut conv = conversation();
        conv.push_user("hello", vec![]);
        conv.clear();
        assert!(conv.is_empty());
    }
}
