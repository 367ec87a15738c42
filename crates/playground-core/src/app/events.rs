//! Outbound channels: user notices and navigation requests.

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::app::types::ConversationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A passive message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that only logs; used when no UI is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => info!(target: "notice", "{}", notice.message),
            NoticeLevel::Warning => warn!(target: "notice", "{}", notice.message),
            NoticeLevel::Error => error!(target: "notice", "{}", notice.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    OpenConversation { conversation_id: ConversationId },
}

/// Process-wide "open this conversation" channel, decoupling the compare core
/// from routing.
#[derive(Debug, Clone)]
pub struct NavigationBus {
    tx: broadcast::Sender<NavigationEvent>,
}

impl Default for NavigationBus {
    fn default() -> Self {
        Self::new(16)
    }
}

impl NavigationBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NavigationEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: NavigationEvent) {
        match self.tx.send(event) {
            Ok(receivers) => {
                debug!(target: "navigation", receivers, "Published navigation event");
            }
            Err(broadcast::error::SendError(event)) => {
                debug!(target: "navigation", ?event, "No navigation subscribers");
            }
        }
    }
}
