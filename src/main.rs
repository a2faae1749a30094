use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use docs_chat::Result;
use docs_chat::config::Config;
use docs_chat::document::SOURCE_KEY;
use docs_chat::pipeline::{ChatPipeline, IngestRequest, InlineDoc};

#[derive(Parser)]
#[command(name = "docs-chat")]
#[command(about = "Ask questions about your documents, answered from their content")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest PDF files and/or raw text into the vector store
    Ingest {
        /// Paths of PDF files to ingest
        pdfs: Vec<PathBuf>,
        /// Raw text to ingest directly
        #[arg(long)]
        text: Option<String>,
        /// Source label for the raw text (defaults to "inline")
        #[arg(long, requires = "text")]
        source: Option<String>,
    },
    /// Ask a question about the ingested documents
    Ask {
        /// The question to answer
        question: String,
    },
    /// Show the active store backend and record count
    Status,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = Config::from_env().map_err(|e| docs_chat::ChatError::Config(e.to_string()))?;
    let pipeline = ChatPipeline::new(config)?;

    match cli.command {
        Commands::Ingest { pdfs, text, source } => {
            let docs = match text {
                Some(content) => {
                    let mut meta = BTreeMap::new();
                    if let Some(source) = source {
                        meta.insert(SOURCE_KEY.to_string(), source);
                    }
                    vec![InlineDoc { content, meta }]
                }
                None => Vec::new(),
            };

            let report = pipeline.ingest(&IngestRequest {
                docs,
                pdf_paths: pdfs,
            })?;
            print_json(&report)?;
        }
        Commands::Ask { question } => {
            let response = pipeline.ask(&question)?;
            print_json(&response)?;
        }
        Commands::Status => {
            let status = pipeline.status()?;
            print_json(&status)?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render response")?;
    println!("{rendered}");
    Ok(())
}
