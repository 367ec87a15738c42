use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Inspect multi-model compare transcripts and split clusters into standalone chats.
#[derive(Parser)]
#[command(version, about, long_about = None, author)]
pub struct Cli {
    /// Path to the config file (defaults to the platform config dir)
    #[arg(long, env = "PLAYGROUND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Additional model catalog files to load (repeatable)
    #[arg(long = "catalog", value_name = "PATH", global = true)]
    pub catalogs: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Print the block layout of a transcript
    Blocks {
        /// Transcript JSON file
        transcript: PathBuf,
    },
    /// Spawn split chats for one cluster of a transcript
    Split {
        /// Transcript JSON file
        transcript: PathBuf,
        /// Cluster to split
        #[arg(long)]
        cluster: String,
        /// Split a single model's reply
        #[arg(long, conflicts_with = "selected", required_unless_present = "selected")]
        model: Option<String>,
        /// Select these models and split each of them
        #[arg(long, value_delimiter = ',')]
        selected: Vec<String>,
        /// Directory the new conversations are written to (defaults to the transcript's directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List known models
    Models,
}
