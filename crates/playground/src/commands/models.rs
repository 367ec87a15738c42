use async_trait::async_trait;
use comfy_table::{Cell, Color, Table};
use eyre::Result;
use std::io::Write;
use std::path::PathBuf;

use super::Command;

use playground_core::model_registry::ModelRegistry;

pub struct ModelsCommand {
    pub catalogs: Vec<PathBuf>,
}

impl ModelsCommand {
    pub async fn run(&self, out: &mut impl Write) -> Result<()> {
        let registry = ModelRegistry::load(self.catalogs.as_slice())?;

        let mut table = Table::new();
        table.set_header(vec![
            Cell::new("ID").fg(Color::Green),
            Cell::new("Name").fg(Color::Green),
            Cell::new("Provider").fg(Color::Green),
            Cell::new("Aliases").fg(Color::Green),
        ]);
        for model in registry.iter() {
            table.add_row(vec![
                Cell::new(&model.id),
                Cell::new(&model.display_name),
                Cell::new(&model.provider),
                Cell::new(model.aliases.join(", ")),
            ]);
        }

        writeln!(out, "{table}")?;
        Ok(())
    }
}

#[async_trait]
impl Command for ModelsCommand {
    async fn execute(&self) -> Result<()> {
        let mut stdout = std::io::stdout();
        self.run(&mut stdout).await
    }
}
