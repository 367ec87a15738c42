//! Test utilities for playground-core
//!
//! Message builders and a recording notifier shared by unit tests, the
//! integration tests and the CLI crate.

use std::sync::Mutex;

use crate::app::conversation::{Message, MessageKind, Role};
use crate::app::events::{Notice, Notifier};
use crate::app::types::{ClusterId, ModelKey};

/// Compare prompt of `cluster`.
pub fn prompt(cluster: &str, text: &str) -> Message {
    Message::compare_user(ClusterId::from(cluster), text)
}

/// Compare reply of `model` in `cluster`.
pub fn reply(cluster: &str, model: &str, text: &str) -> Message {
    Message::compare_reply(ClusterId::from(cluster), ModelKey::from(model), text)
}

/// Plain user message outside any cluster.
pub fn single(text: &str) -> Message {
    Message::user(text)
}

/// Plain message tagged with a cluster, e.g. a per-model follow-up.
pub fn plain_in_cluster(cluster: &str, model: Option<&str>, text: &str) -> Message {
    let role = if model.is_some() {
        Role::Assistant
    } else {
        Role::User
    };
    Message::new(
        role,
        text.to_string(),
        MessageKind::Plain {
            cluster_id: Some(ClusterId::from(cluster)),
            model: model.map(ModelKey::from),
        },
    )
}

/// Notifier that keeps every notice for later inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}
