//! User-facing compare actions. This is where the max-models limit is
//! enforced: oversized selections are refused with a warning notice and never
//! reach the store.

use std::sync::Arc;
use tracing::debug;

use crate::app::conversation::{Attachment, build_blocks};
use crate::app::events::{Notice, Notifier};
use crate::app::session::CompareSession;
use crate::app::types::{ClusterId, MessageId, ModelKey};
use crate::config::CompareConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    Added,
    Removed,
    /// Adding would exceed the limit; nothing changed.
    LimitReached { max: usize },
}

/// What a composer submission produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmittedTurn {
    Single {
        message_id: MessageId,
        model: Option<ModelKey>,
    },
    Compare {
        cluster_id: ClusterId,
        models: Vec<ModelKey>,
    },
}

pub struct CompareController {
    config: CompareConfig,
    notifier: Arc<dyn Notifier>,
}

impl CompareController {
    pub fn new(config: CompareConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self { config, notifier }
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    pub fn max_models(&self) -> usize {
        self.config.max_models_per_turn
    }

    fn limit_reached(&self) -> SelectionOutcome {
        let max = self.max_models();
        self.notifier.notify(Notice::warning(format!(
            "You can select up to {max} models per turn"
        )));
        SelectionOutcome::LimitReached { max }
    }

    /// Switch compare mode on, preselecting the configured default models.
    pub fn enable_compare(&self, session: &mut CompareSession) {
        session.composer.compare_mode = true;
        if session.composer.models.is_empty() {
            session.composer.models = self.config.default_model_keys();
        } else {
            session.composer.models.truncate(self.max_models());
        }
    }

    /// Switch compare mode off. Clusters with exactly one chosen model
    /// collapse from here on.
    pub fn disable_compare(&self, session: &mut CompareSession) {
        session.leave_compare_mode();
    }

    /// Add or remove a model from the set the next compare turn goes to.
    pub fn toggle_composer_model(
        &self,
        session: &mut CompareSession,
        model: &ModelKey,
    ) -> SelectionOutcome {
        let models = &mut session.composer.models;
        if let Some(pos) = models.iter().position(|m| m == model) {
            models.remove(pos);
            return SelectionOutcome::Removed;
        }
        if models.len() >= self.max_models() {
            return self.limit_reached();
        }
        models.push(model.clone());
        SelectionOutcome::Added
    }

    /// Send the composer's text. In compare mode with at least one model this
    /// fans out into a new cluster that starts out engaged.
    pub fn submit(
        &self,
        session: &mut CompareSession,
        prompt: impl Into<String>,
        attachments: Vec<Attachment>,
    ) -> SubmittedTurn {
        if session.composer.compare_mode && !session.composer.models.is_empty() {
            let models: Vec<ModelKey> = session
                .composer
                .models
                .iter()
                .take(self.max_models())
                .cloned()
                .collect();
            let cluster_id = session
                .conversation
                .fan_out_compare(prompt, attachments, &models);
            session.disengage_all();
            session.set_engaged(&cluster_id, true);
            session.clusters.set_active_models(&cluster_id, models.clone());
            return SubmittedTurn::Compare { cluster_id, models };
        }

        let message_id = session.conversation.push_user(prompt, attachments);
        SubmittedTurn::Single {
            message_id,
            model: session.composer.models.first().cloned(),
        }
    }

    /// Add or remove a model from a cluster's chosen answers.
    pub fn toggle_selection(
        &self,
        session: &mut CompareSession,
        cluster_id: &ClusterId,
        model: &ModelKey,
    ) -> SelectionOutcome {
        let mut selection = session.clusters.selection(cluster_id).to_vec();
        let outcome = if let Some(pos) = selection.iter().position(|m| m == model) {
            selection.remove(pos);
            SelectionOutcome::Removed
        } else if selection.len() >= self.max_models() {
            return self.limit_reached();
        } else {
            selection.push(model.clone());
            SelectionOutcome::Added
        };
        session.clusters.set_selection(cluster_id, selection);
        outcome
    }

    /// Make `model` the sole answer of the cluster and collapse the rest.
    pub fn choose_model(
        &self,
        session: &mut CompareSession,
        cluster_id: &ClusterId,
        model: &ModelKey,
    ) {
        session.clusters.set_selection(cluster_id, [model.clone()]);
        session.set_engaged(cluster_id, false);
        debug!(target: "compare::controller", cluster = %cluster_id, %model, "Model chosen");
    }

    /// Reopen a decided cluster: every model that replied becomes active again
    /// (bounded by the limit) and compare mode is switched back on.
    pub fn compare_again(&self, session: &mut CompareSession, cluster_id: &ClusterId) {
        let messages = session.conversation.messages();
        let models: Vec<ModelKey> = build_blocks(messages)
            .iter()
            .find(|block| block.cluster_id() == Some(cluster_id))
            .map(|block| {
                block
                    .reply_models(messages)
                    .into_iter()
                    .take(self.max_models())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        session.clusters.set_active_models(cluster_id, models.clone());
        session.composer.compare_mode = true;
        session.composer.models = models;
        session.set_engaged(cluster_id, true);
        debug!(target: "compare::controller", cluster = %cluster_id, "Compare again");
    }

    /// Leave compare mode and keep chatting with a single model.
    pub fn continue_with_model(
        &self,
        session: &mut CompareSession,
        cluster_id: &ClusterId,
        model: &ModelKey,
    ) {
        session.clusters.set_active_models(cluster_id, [model.clone()]);
        session.leave_compare_mode();
        session.composer.models = vec![model.clone()];
        debug!(target: "compare::controller", cluster = %cluster_id, %model, "Continue with model");
    }

    pub fn pin_canonical(
        &self,
        session: &mut CompareSession,
        cluster_id: &ClusterId,
        message_id: &MessageId,
    ) -> bool {
        let belongs = session.conversation.get(message_id).is_some_and(|m| {
            m.is_compare_reply() && m.cluster_id() == Some(cluster_id)
        });
        if belongs {
            session.clusters.pin_canonical(cluster_id, message_id.clone());
        }
        belongs
    }

    pub fn unpin_canonical(&self, session: &mut CompareSession, cluster_id: &ClusterId) {
        session.clusters.unpin_canonical(cluster_id);
    }
}
