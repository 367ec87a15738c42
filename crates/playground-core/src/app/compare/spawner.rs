//! Spawning standalone "split" conversations out of a compare cluster.
//!
//! Branch creations run one at a time. The bulk path awaits each model in turn
//! so a failure can be attributed and counted without cancelling the rest.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::links::{ParentLink, ParentLinks};
use crate::app::conversation::{Block, Message, find_cluster_block};
use crate::app::events::{NavigationBus, NavigationEvent, Notice, Notifier};
use crate::app::session::CompareSession;
use crate::app::types::{ClusterId, ConversationId, ModelKey};
use crate::history::{BranchOrigin, ConversationService, ConversationServiceError, SeedMessage};

#[derive(Debug, Error)]
pub enum BranchError {
    #[error("Cluster not found: {cluster_id}")]
    ClusterNotFound { cluster_id: ClusterId },

    #[error("Model {model} has no reply in cluster {cluster_id}")]
    ModelNotInCluster {
        cluster_id: ClusterId,
        model: ModelKey,
    },

    #[error("Failed to create branch: {0}")]
    Service(#[from] ConversationServiceError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRequest {
    pub cluster_id: ClusterId,
    pub model: ModelKey,
    /// Navigate to the new conversation and leave compare mode here.
    pub open: bool,
}

/// Seed for a split chat, split into what goes into the creation call and
/// what is appended afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchSeed {
    /// The shared prompt followed by the model's first reply.
    pub head: Vec<SeedMessage>,
    /// The most recent follow-ups of the model's sub-thread.
    pub tail: Vec<SeedMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkSplitReport {
    pub created: Vec<(ModelKey, ConversationId)>,
    pub failed: Vec<(ModelKey, String)>,
}

impl BulkSplitReport {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

/// Pick the seed messages for `model` inside the cluster.
///
/// The head is the shared prompt plus the model's first reply. The tail is at
/// most `window` of the most recent remaining messages attributed to the
/// model within the cluster (further replies and sub-thread follow-ups).
pub fn select_seed(
    messages: &[Message],
    block: &Block,
    model: &ModelKey,
    window: usize,
) -> Option<BranchSeed> {
    let Block::Compare {
        user_index,
        assistant_indices,
        member_indices,
        ..
    } = block
    else {
        return None;
    };

    let prompt = messages.get(*user_index)?;
    let first_reply = assistant_indices
        .iter()
        .copied()
        .find(|&i| messages.get(i).and_then(Message::model_key) == Some(model))?;

    let mut thread: Vec<usize> = assistant_indices
        .iter()
        .chain(member_indices)
        .copied()
        .filter(|&i| i != first_reply)
        .filter(|&i| messages.get(i).and_then(Message::model_key) == Some(model))
        .collect();
    thread.sort_unstable();
    let skip = thread.len().saturating_sub(window);

    Some(BranchSeed {
        head: vec![
            SeedMessage::from(prompt),
            SeedMessage::from(&messages[first_reply]),
        ],
        tail: thread[skip..]
            .iter()
            .filter_map(|&i| messages.get(i))
            .map(SeedMessage::from)
            .collect(),
    })
}

pub struct BranchSpawner {
    service: Arc<dyn ConversationService>,
    notifier: Arc<dyn Notifier>,
    navigation: NavigationBus,
    seed_window: usize,
}

impl BranchSpawner {
    pub fn new(
        service: Arc<dyn ConversationService>,
        notifier: Arc<dyn Notifier>,
        navigation: NavigationBus,
        seed_window: usize,
    ) -> Self {
        Self {
            service,
            notifier,
            navigation,
            seed_window,
        }
    }

    /// Create one split chat for `request.model`.
    ///
    /// On failure nothing is recorded and the error is returned for the caller
    /// to display.
    pub async fn create_compare_branch(
        &self,
        session: &mut CompareSession,
        links: &mut ParentLinks,
        request: BranchRequest,
    ) -> Result<ConversationId, BranchError> {
        let BranchRequest {
            cluster_id,
            model,
            open,
        } = request;

        let messages = session.conversation.messages();
        let block = find_cluster_block(messages, &cluster_id).ok_or_else(|| {
            BranchError::ClusterNotFound {
                cluster_id: cluster_id.clone(),
            }
        })?;
        let seed = select_seed(messages, &block, &model, self.seed_window).ok_or_else(|| {
            BranchError::ModelNotInCluster {
                cluster_id: cluster_id.clone(),
                model: model.clone(),
            }
        })?;

        let parent_conversation_id = session.conversation_id().clone();
        let origin = BranchOrigin {
            parent_conversation_id: parent_conversation_id.clone(),
            cluster_id: cluster_id.clone(),
            title: Some(format!("{model} split")),
        };

        debug!(
            target: "compare::spawner",
            cluster = %cluster_id,
            %model,
            head = seed.head.len(),
            tail = seed.tail.len(),
            "Creating split chat"
        );
        let conversation_id = self.service.create_branch(&origin, &seed.head).await?;
        for message in seed.tail {
            if let Err(e) = self.service.add_message(&conversation_id, message).await {
                warn!(
                    target: "compare::spawner",
                    cluster = %cluster_id,
                    %model,
                    orphaned = %conversation_id,
                    "Seeding split chat failed, conversation left incomplete: {e}"
                );
                return Err(e.into());
            }
        }

        session
            .clusters
            .set_split_chat(&cluster_id, model.clone(), conversation_id.clone());
        links.set_parent(
            conversation_id.clone(),
            ParentLink {
                parent_conversation_id,
                cluster_id: cluster_id.clone(),
            },
        );
        info!(
            target: "compare::spawner",
            cluster = %cluster_id,
            %model,
            conversation = %conversation_id,
            "Split chat created"
        );

        if open {
            session.leave_compare_mode();
            self.navigation.publish(NavigationEvent::OpenConversation {
                conversation_id: conversation_id.clone(),
            });
        }

        Ok(conversation_id)
    }

    /// Open every selected model of the cluster as its own chat.
    ///
    /// Each model is attempted independently; failures are logged and counted
    /// and never abort the remaining models. One summary notice is sent.
    pub async fn split_selected(
        &self,
        session: &mut CompareSession,
        links: &mut ParentLinks,
        cluster_id: &ClusterId,
    ) -> BulkSplitReport {
        let selection = session.clusters.selection(cluster_id).to_vec();
        let mut report = BulkSplitReport::default();

        for model in selection {
            let request = BranchRequest {
                cluster_id: cluster_id.clone(),
                model: model.clone(),
                open: false,
            };
            match self.create_compare_branch(session, links, request).await {
                Ok(conversation_id) => report.created.push((model, conversation_id)),
                Err(e) => {
                    warn!(
                        target: "compare::spawner",
                        cluster = %cluster_id,
                        %model,
                        "Failed to create split chat: {e}"
                    );
                    report.failed.push((model, e.to_string()));
                }
            }
        }

        self.notify_report(&report);
        report
    }

    fn notify_report(&self, report: &BulkSplitReport) {
        let created = report.created_count();
        let failed = report.failed_count();
        let notice = match (created, failed) {
            (0, 0) => Notice::warning("No models selected to open as chats"),
            (created, 0) => Notice::success(format!("Opened {created} chats")),
            (0, failed) => Notice::error(format!("Failed to open {failed} chats")),
            (created, failed) => Notice::warning(format!(
                "Opened {created} chats, {failed} failed"
            )),
        };
        self.notifier.notify(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::conversation::{Role, build_blocks};
    use crate::app::events::NoticeLevel;
    use crate::history::InMemoryConversationService;
    use crate::test_utils::{RecordingNotifier, plain_in_cluster, prompt, reply};

    fn models(keys: &[&str]) -> Vec<ModelKey> {
        keys.iter().map(|k| ModelKey::from(*k)).collect()
    }

    fn fixture(
        service: InMemoryConversationService,
    ) -> (
        BranchSpawner,
        Arc<InMemoryConversationService>,
        Arc<RecordingNotifier>,
        NavigationBus,
    ) {
        let service = Arc::new(service);
        let notifier = Arc::new(RecordingNotifier::default());
        let navigation = NavigationBus::default();
        let spawner = BranchSpawner::new(
            service.clone(),
            notifier.clone(),
            navigation.clone(),
            20,
        );
        (spawner, service, notifier, navigation)
    }

    fn compared_session(keys: &[&str]) -> (CompareSession, ClusterId) {
        let mut session = CompareSession::new(ConversationId::from("parent"));
        let cluster = session
            .conversation
            .fan_out_compare("question", vec![], &models(keys));
        let replies: Vec<_> = session.conversation.messages()[1..]
            .iter()
            .map(|m| m.id().clone())
            .collect();
        for (id, key) in replies.iter().zip(keys) {
            session
                .conversation
                .append_content(id, &format!("answer from {key}"))
                .unwrap();
        }
        (session, cluster)
    }

    fn contents(seed: &[SeedMessage]) -> Vec<&str> {
        seed.iter().map(|m| m.content.as_str()).collect()
    }

    #[test]
    fn seed_is_prompt_first_reply_and_recent_sub_thread() {
        let messages = vec![
            prompt("A", "question"),
            reply("A", "m1", "m1 first"),
            reply("A", "m2", "m2 first"),
            plain_in_cluster("A", Some("m1"), "follow up 1"),
            reply("A", "m1", "m1 second"),
            plain_in_cluster("A", Some("m1"), "follow up 2"),
            reply("A", "m1", "m1 third"),
        ];
        let blocks = build_blocks(&messages);

        let seed = select_seed(&messages, &blocks[0], &ModelKey::from("m1"), 3).unwrap();
        assert_eq!(contents(&seed.head), vec!["question", "m1 first"]);
        assert_eq!(seed.head[0].role, Role::User);
        assert_eq!(seed.head[1].role, Role::Assistant);
        assert_eq!(
            contents(&seed.tail),
            vec!["m1 second", "follow up 2", "m1 third"]
        );

        let seed = select_seed(&messages, &blocks[0], &ModelKey::from("m2"), 3).unwrap();
        assert_eq!(contents(&seed.head), vec!["question", "m2 first"]);
        assert!(seed.tail.is_empty());
    }

    #[test]
    fn seed_requires_a_reply_from_the_model() {
        let messages = vec![prompt("A", "q"), reply("A", "m1", "r")];
        let blocks = build_blocks(&messages);
        assert!(select_seed(&messages, &blocks[0], &ModelKey::from("m9"), 5).is_none());
    }

    #[test]
    fn seed_uses_the_displayed_generation() {
        let mut messages = vec![prompt("A", "q"), reply("A", "m1", "live")];
        messages[1].variants.push(crate::app::conversation::MessageVariant {
            content: "older".to_string(),
            generation: None,
        });
        messages[1].active_variant = Some(0);
        let blocks = build_blocks(&messages);
        let seed = select_seed(&messages, &blocks[0], &ModelKey::from("m1"), 5).unwrap();
        assert_eq!(contents(&seed.head), vec!["q", "older"]);
    }

    #[tokio::test]
    async fn single_branch_records_split_chat_and_parent() {
        let (spawner, service, _notifier, navigation) =
            fixture(InMemoryConversationService::new());
        let mut rx = navigation.subscribe();
        let (mut session, cluster) = compared_session(&["gpt-4", "claude-3"]);
        session.composer.compare_mode = true;
        session.set_engaged(&cluster, true);
        let mut links = ParentLinks::new();

        let id = spawner
            .create_compare_branch(
                &mut session,
                &mut links,
                BranchRequest {
                    cluster_id: cluster.clone(),
                    model: ModelKey::from("claude-3"),
                    open: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(
            session
                .clusters
                .split_chat(&cluster, &ModelKey::from("claude-3")),
            Some(&id)
        );
        let link = links.parent(&id).unwrap();
        assert_eq!(link.parent_conversation_id, ConversationId::from("parent"));
        assert_eq!(link.cluster_id, cluster);

        let stored = service.conversation(&id).unwrap();
        let seeded: Vec<_> = stored.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(seeded, vec!["question", "answer from claude-3"]);

        assert!(!session.composer.compare_mode);
        assert!(!session.is_engaged(&cluster));
        assert_eq!(
            rx.try_recv().unwrap(),
            NavigationEvent::OpenConversation { conversation_id: id }
        );
    }

    #[tokio::test]
    async fn unknown_cluster_or_model_is_rejected() {
        let (spawner, service, _notifier, _nav) = fixture(InMemoryConversationService::new());
        let (mut session, cluster) = compared_session(&["gpt-4"]);
        let mut links = ParentLinks::new();

        let err = spawner
            .create_compare_branch(
                &mut session,
                &mut links,
                BranchRequest {
                    cluster_id: ClusterId::from("nope"),
                    model: ModelKey::from("gpt-4"),
                    open: false,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BranchError::ClusterNotFound { .. }));

        let err = spawner
            .create_compare_branch(
                &mut session,
                &mut links,
                BranchRequest {
                    cluster_id: cluster,
                    model: ModelKey::from("llama"),
                    open: false,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BranchError::ModelNotInCluster { .. }));
        assert_eq!(service.create_call_count(), 0);
    }

    #[tokio::test]
    async fn failed_creation_records_nothing() {
        let (spawner, _service, _notifier, navigation) =
            fixture(InMemoryConversationService::with_failing_create_calls([1]));
        let mut rx = navigation.subscribe();
        let (mut session, cluster) = compared_session(&["gpt-4"]);
        session.composer.compare_mode = true;
        let mut links = ParentLinks::new();

        let err = spawner
            .create_compare_branch(
                &mut session,
                &mut links,
                BranchRequest {
                    cluster_id: cluster.clone(),
                    model: ModelKey::from("gpt-4"),
                    open: true,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BranchError::Service(_)));
        assert!(session.clusters.split_chats(&cluster).is_empty());
        assert!(session.composer.compare_mode);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn failed_seeding_is_reported_without_recording_the_split() {
        let (spawner, service, _notifier, _nav) =
            fixture(InMemoryConversationService::with_failing_add_calls([1]));
        let (mut session, cluster) = compared_session(&["m1", "m2"]);
        session
            .conversation
            .add_message(reply(cluster.as_str(), "m1", "second answer"));
        let mut links = ParentLinks::new();

        let err = spawner
            .create_compare_branch(
                &mut session,
                &mut links,
                BranchRequest {
                    cluster_id: cluster.clone(),
                    model: ModelKey::from("m1"),
                    open: false,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BranchError::Service(_)));
        assert_eq!(service.create_call_count(), 1);
        assert_eq!(service.len(), 1);
        assert!(session.clusters.split_chats(&cluster).is_empty());
        assert_eq!(links.children_of(&ConversationId::from("parent")).count(), 0);
    }

    #[tokio::test]
    async fn bulk_split_isolates_failures() {
        let (spawner, _service, notifier, _nav) =
            fixture(InMemoryConversationService::with_failing_create_calls([2]));
        let (mut session, cluster) = compared_session(&["m1", "m2", "m3"]);
        session
            .clusters
            .set_selection(&cluster, models(&["m1", "m2", "m3"]));
        let mut links = ParentLinks::new();

        let report = spawner
            .split_selected(&mut session, &mut links, &cluster)
            .await;

        assert_eq!(report.created_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.failed[0].0, ModelKey::from("m2"));

        let split = session.clusters.split_chats(&cluster);
        assert!(split.contains_key(&ModelKey::from("m1")));
        assert!(!split.contains_key(&ModelKey::from("m2")));
        assert!(split.contains_key(&ModelKey::from("m3")));

        let notices = notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert_eq!(notices[0].message, "Opened 2 chats, 1 failed");
    }

    #[tokio::test]
    async fn bulk_split_with_empty_selection_warns() {
        let (spawner, service, notifier, _nav) = fixture(InMemoryConversationService::new());
        let (mut session, cluster) = compared_session(&["m1"]);
        let mut links = ParentLinks::new();

        let report = spawner
            .split_selected(&mut session, &mut links, &cluster)
            .await;

        assert_eq!(report, BulkSplitReport::default());
        assert_eq!(service.create_call_count(), 0);
        assert_eq!(notifier.notices()[0].level, NoticeLevel::Warning);
    }
}
