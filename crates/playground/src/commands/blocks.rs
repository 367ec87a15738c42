use async_trait::async_trait;
use comfy_table::{Cell, Color, Table};
use eyre::{Result, eyre};
use std::io::Write;
use std::path::PathBuf;

use super::Command;

use playground_core::app::conversation::{Block, Message, build_blocks};
use playground_core::history::read_transcript;
use playground_core::model_registry::ModelRegistry;

pub struct BlocksCommand {
    pub transcript: PathBuf,
    pub catalogs: Vec<PathBuf>,
}

impl BlocksCommand {
    pub async fn run(&self, out: &mut impl Write) -> Result<()> {
        let transcript = read_transcript(&self.transcript)
            .await
            .map_err(|e| eyre!("Failed to read {}: {}", self.transcript.display(), e))?;
        let registry = ModelRegistry::load(self.catalogs.as_slice())?;
        let messages = transcript.into_messages();

        if messages.is_empty() {
            writeln!(out, "Transcript is empty.")?;
            return Ok(());
        }

        writeln!(out, "{}", blocks_table(&messages, &registry))?;
        Ok(())
    }
}

#[async_trait]
impl Command for BlocksCommand {
    async fn execute(&self) -> Result<()> {
        let mut stdout = std::io::stdout();
        self.run(&mut stdout).await
    }
}

fn join_indices(indices: &[usize]) -> String {
    indices
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// One row per block, in render order.
pub fn blocks_table(messages: &[Message], registry: &ModelRegistry) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("#").fg(Color::Green),
        Cell::new("Kind").fg(Color::Green),
        Cell::new("Messages").fg(Color::Green),
        Cell::new("Cluster").fg(Color::Green),
        Cell::new("Models").fg(Color::Green),
    ]);

    for (position, block) in build_blocks(messages).iter().enumerate() {
        let models = block
            .reply_models(messages)
            .into_iter()
            .map(|key| registry.label_for(key))
            .collect::<Vec<_>>();

        let (kind, models) = match block {
            Block::Single { index } => {
                let message = &messages[*index];
                let model = message
                    .model_key()
                    .map(|key| registry.label_for(key))
                    .unwrap_or_default();
                (message.role().to_string(), model)
            }
            Block::Compare { .. } => ("compare".to_string(), models.join(", ")),
        };

        let mut indices = block.indices();
        indices.sort_unstable();

        table.add_row(vec![
            Cell::new(position),
            Cell::new(kind),
            Cell::new(join_indices(&indices)),
            Cell::new(
                block
                    .cluster_id()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            ),
            Cell::new(models),
        ]);
    }

    table
}
