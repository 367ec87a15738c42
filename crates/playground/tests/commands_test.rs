use clap::Parser;
use playground::cli::config::load_config;
use playground::cli::{Cli, Commands};
use playground::commands::blocks::BlocksCommand;
use playground::commands::models::ModelsCommand;
use playground::commands::split::{SplitCommand, SplitTarget};
use playground_core::app::types::ConversationId;
use playground_core::config::PlaygroundConfig;
use playground_core::history::read_transcript;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TRANSCRIPT: &str = r#"{
    "conversationId": "conv_parent",
    "title": "Speed",
    "messages": [
        { "id": "u1", "isBot": false, "message": "Which is faster?", "messageType": "compare:user", "clusterId": "cluster_a" },
        { "id": "r1", "isBot": true, "message": "gpt says", "messageType": "compare:reply", "clusterId": "cluster_a", "modelId": "gpt-4" },
        { "id": "r2", "isBot": true, "message": "claude says", "messageType": "compare:reply", "clusterId": "cluster_a", "modelId": "claude-3" },
        { "id": "s1", "isBot": false, "message": "thanks" }
    ]
}"#;

fn write_transcript(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("conv_parent.json");
    std::fs::write(&path, TRANSCRIPT).unwrap();
    path
}

fn json_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

#[tokio::test]
async fn blocks_prints_one_row_per_block() {
    let dir = TempDir::new().unwrap();
    let transcript = write_transcript(&dir);
    let mut output = Vec::new();

    BlocksCommand {
        transcript,
        catalogs: vec![],
    }
    .run(&mut output)
    .await
    .unwrap();

    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("compare"));
    assert!(output.contains("cluster_a"));
    assert!(output.contains("0,1,2"));
    assert!(output.contains("Claude 3 Opus"));
    assert!(output.contains("user"));
}

#[tokio::test]
async fn split_selected_writes_one_transcript_per_model() {
    let dir = TempDir::new().unwrap();
    let transcript = write_transcript(&dir);
    let out_dir = dir.path().join("splits");
    let mut output = Vec::new();

    SplitCommand {
        transcript,
        cluster: "cluster_a".to_string(),
        target: SplitTarget::Selected(vec!["gpt-4".to_string(), "claude-3".to_string()]),
        out: Some(out_dir.clone()),
        config: PlaygroundConfig::default(),
    }
    .run(&mut output)
    .await
    .unwrap();

    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("2 created, 0 failed"));

    let files = json_files(&out_dir);
    assert_eq!(files.len(), 2);
    for file in files {
        let transcript = read_transcript(&file).await.unwrap();
        let parent = transcript.parent.unwrap();
        assert_eq!(
            parent.parent_conversation_id,
            ConversationId::from("conv_parent")
        );
        assert_eq!(transcript.messages.len(), 2);
        assert_eq!(transcript.messages[0].message, "Which is faster?");
    }
}

#[tokio::test]
async fn split_selected_ignores_repeated_models() {
    let dir = TempDir::new().unwrap();
    let transcript = write_transcript(&dir);
    let out_dir = dir.path().join("splits");
    let mut output = Vec::new();

    SplitCommand {
        transcript,
        cluster: "cluster_a".to_string(),
        target: SplitTarget::Selected(vec![
            "gpt-4".to_string(),
            "claude-3".to_string(),
            "gpt-4".to_string(),
        ]),
        out: Some(out_dir.clone()),
        config: PlaygroundConfig::default(),
    }
    .run(&mut output)
    .await
    .unwrap();

    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("2 created, 0 failed"));
    assert!(output.lines().any(|line| line.starts_with("gpt-4\t")));
    assert!(output.lines().any(|line| line.starts_with("claude-3\t")));
    assert_eq!(json_files(&out_dir).len(), 2);
}

#[tokio::test]
async fn split_of_unknown_model_fails() {
    let dir = TempDir::new().unwrap();
    let transcript = write_transcript(&dir);
    let mut output = Vec::new();

    let result = SplitCommand {
        transcript,
        cluster: "cluster_a".to_string(),
        target: SplitTarget::Model("llama".to_string()),
        out: Some(dir.path().join("splits")),
        config: PlaygroundConfig::default(),
    }
    .run(&mut output)
    .await;

    assert!(result.is_err());
    assert!(json_files(&dir.path().join("splits")).is_empty());
}

#[tokio::test]
async fn models_lists_the_builtin_catalog() {
    let mut output = Vec::new();
    ModelsCommand { catalogs: vec![] }
        .run(&mut output)
        .await
        .unwrap();
    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("gpt-4"));
    assert!(output.contains("sonnet"));
}

#[test]
fn split_requires_a_model_or_a_selection() {
    assert!(Cli::try_parse_from(["playground", "split", "t.json", "--cluster", "c"]).is_err());

    let cli = Cli::try_parse_from([
        "playground",
        "split",
        "t.json",
        "--cluster",
        "c",
        "--selected",
        "gpt-4,claude-3",
    ])
    .unwrap();
    match cli.command {
        Commands::Split { selected, model, .. } => {
            assert_eq!(selected, vec!["gpt-4", "claude-3"]);
            assert!(model.is_none());
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn invalid_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[compare]\nmax_models_per_turn = 0\n").unwrap();

    let err = load_config(Some(path.as_path())).unwrap_err();
    assert!(err.to_string().contains("max_models_per_turn"));
}

#[test]
fn explicit_config_file_is_loaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[compare]\nmax_models_per_turn = 2\nbranch_seed_window = 5\n").unwrap();

    let config = load_config(Some(path.as_path())).unwrap();
    assert_eq!(config.compare.max_models_per_turn, 2);
    assert_eq!(config.compare.branch_seed_window, 5);
}
