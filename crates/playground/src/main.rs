use clap::Parser;
use eyre::Result;
use tracing::debug;

use playground::cli::{Cli, Commands};
use playground::commands::{
    Command, blocks::BlocksCommand, models::ModelsCommand, split::SplitCommand,
    split::SplitTarget,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Install color-eyre for better error reports
    color_eyre::install()?;

    let cli = Cli::parse();

    // Load .env file if it exists
    playground::cli::config::load_env()?;

    // Initialize tracing (level configured via RUST_LOG env var)
    playground_core::utils::tracing::init_tracing()?;

    let config = playground::cli::config::load_config(cli.config.as_deref())?;
    debug!(target: "playground::main", ?config, "Loaded config");

    let mut catalogs = config.models.catalogs.clone();
    catalogs.extend(cli.catalogs.iter().cloned());

    match cli.command {
        Commands::Blocks { transcript } => {
            BlocksCommand {
                transcript,
                catalogs,
            }
            .execute()
            .await
        }
        Commands::Split {
            transcript,
            cluster,
            model,
            selected,
            out,
        } => {
            let target = match model {
                Some(model) => SplitTarget::Model(model),
                None => SplitTarget::Selected(selected),
            };
            SplitCommand {
                transcript,
                cluster,
                target,
                out,
                config,
            }
            .execute()
            .await
        }
        Commands::Models => ModelsCommand { catalogs }.execute().await,
    }
}
