use async_trait::async_trait;
use eyre::{Result, bail, eyre};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::Command;

use playground_core::app::CompareSession;
use playground_core::app::compare::view::is_chosen;
use playground_core::app::compare::{
    BranchRequest, BranchSpawner, BulkSplitReport, CompareController, ParentLinks,
    SelectionOutcome,
};
use playground_core::app::conversation::Conversation;
use playground_core::app::events::{NavigationBus, TracingNotifier};
use playground_core::app::types::{ClusterId, ModelKey};
use playground_core::config::PlaygroundConfig;
use playground_core::history::{FileConversationService, read_transcript};

/// Which replies of the cluster to split out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitTarget {
    Model(String),
    Selected(Vec<String>),
}

pub struct SplitCommand {
    pub transcript: PathBuf,
    pub cluster: String,
    pub target: SplitTarget,
    pub out: Option<PathBuf>,
    pub config: PlaygroundConfig,
}

impl SplitCommand {
    fn out_dir(&self) -> PathBuf {
        self.out.clone().unwrap_or_else(|| {
            self.transcript
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }

    pub async fn run(&self, out: &mut impl Write) -> Result<()> {
        let transcript = read_transcript(&self.transcript)
            .await
            .map_err(|e| eyre!("Failed to read {}: {}", self.transcript.display(), e))?;
        let conversation_id = transcript.conversation_id.clone();
        let mut session = CompareSession::from_conversation(Conversation::with_messages(
            conversation_id,
            transcript.into_messages(),
        ));

        let service = Arc::new(FileConversationService::new(self.out_dir()).await?);
        let notifier = Arc::new(TracingNotifier);
        let spawner = BranchSpawner::new(
            service,
            notifier.clone(),
            NavigationBus::default(),
            self.config.compare.branch_seed_window,
        );
        let mut links = ParentLinks::new();
        let cluster_id = ClusterId::from(self.cluster.as_str());

        match &self.target {
            SplitTarget::Model(model) => {
                let request = BranchRequest {
                    cluster_id,
                    model: ModelKey::from(model.as_str()),
                    open: false,
                };
                let id = spawner
                    .create_compare_branch(&mut session, &mut links, request)
                    .await?;
                writeln!(out, "{model}\t{id}")?;
            }
            SplitTarget::Selected(models) => {
                let controller = CompareController::new(self.config.compare.clone(), notifier);
                for key in unique_keys(models) {
                    if is_chosen(&session, &cluster_id, &key) {
                        continue;
                    }
                    if let SelectionOutcome::LimitReached { max } =
                        controller.toggle_selection(&mut session, &cluster_id, &key)
                    {
                        bail!("At most {max} models can be selected per cluster");
                    }
                }
                let report = spawner
                    .split_selected(&mut session, &mut links, &cluster_id)
                    .await;
                write_report(out, &report)?;
                if report.created_count() == 0 && report.failed_count() > 0 {
                    bail!("No split chats were created");
                }
            }
        }

        info!(
            target: "playground::split",
            dir = %self.out_dir().display(),
            "Split finished"
        );
        Ok(())
    }
}

/// Requested models in order, repeats dropped.
fn unique_keys(models: &[String]) -> Vec<ModelKey> {
    let mut keys: Vec<ModelKey> = Vec::with_capacity(models.len());
    for model in models {
        let key = ModelKey::from(model.as_str());
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

fn write_report(out: &mut impl Write, report: &BulkSplitReport) -> Result<()> {
    for (model, id) in &report.created {
        writeln!(out, "{model}\t{id}")?;
    }
    for (model, error) in &report.failed {
        writeln!(out, "{model}\tfailed: {error}")?;
    }
    writeln!(
        out,
        "{} created, {} failed",
        report.created_count(),
        report.failed_count()
    )?;
    Ok(())
}

#[async_trait]
impl Command for SplitCommand {
    async fn execute(&self) -> Result<()> {
        let mut stdout = std::io::stdout();
        self.run(&mut stdout).await
    }
}
