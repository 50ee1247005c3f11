//! VoiceTree binary: read transcript fragments from stdin (one per line),
//! maintain the markdown vault.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use voicetree_core::VoiceTreeConfig;
use voicetree_llm::GeminiProvider;
use voicetree_markdown::{load_tree, MarkdownWriter};
use voicetree_pipeline::ChunkProcessor;

#[derive(Parser, Debug)]
#[command(name = "voicetree", about = "Incremental knowledge graph from a speech transcript")]
struct Args {
    /// Vault directory (overrides OUTPUT_DIR).
    #[arg(long)]
    output_dir: Option<String>,

    /// Resume from an existing vault instead of starting empty.
    #[arg(long)]
    resume: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = VoiceTreeConfig::from_env();
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    let provider = Arc::new(GeminiProvider::from_env().context("configuring LLM provider")?);

    let tree = if args.resume {
        let tree = load_tree(&config.output_dir)
            .with_context(|| format!("loading vault from {}", config.output_dir))?;
        info!("resumed vault with {} nodes", tree.node_count());
        tree
    } else {
        Default::default()
    };

    let writer = MarkdownWriter::new(&config.output_dir);
    let history_file = std::path::Path::new(&config.output_dir).join("transcript_history.txt");
    std::fs::create_dir_all(&config.output_dir)?;

    let mut processor = ChunkProcessor::with_tree(provider, config, tree)
        .with_writer(writer)
        .with_history_file(history_file);

    info!("reading fragments from stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match processor.process_fragment(&line).await {
            Ok(actions) if !actions.is_empty() => {
                info!("applied {} actions ({} nodes total)", actions.len(), processor.tree().node_count());
            }
            Ok(_) => {}
            Err(e) => error!("cycle failed, fragment dropped: {}", e),
        }
    }

    info!("stdin closed, final tree has {} nodes", processor.tree().node_count());
    Ok(())
}
