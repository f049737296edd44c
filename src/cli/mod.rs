//! CLI command definitions and parsing
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::pipeline::PipelineKind;

#[derive(Parser, Debug)]
#[command(
    name = "docqa",
    version,
    author = "neur0map",
    about = "Answer questions from semantically searched documents",
    long_about = "docqa queries a hosted semantic search index, keeps the documents whose reranker \
                  score clears a threshold, embeds their pages and asks a hosted chat model to answer \
                  from them, printing the answer and its sources."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/docqa/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Retrieval overrides shared by the query commands
#[derive(Args, Debug, Clone, Default)]
pub struct RetrievalArgs {
    /// Reranker score a document must exceed (default from config)
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Number of search hits to request (default from config)
    #[arg(long)]
    pub top: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a question from the search index
    Ask {
        /// Question to ask (defaults to the configured question)
        question: Option<String>,

        /// Answering strategy
        #[arg(short, long, value_enum, default_value_t = PipelineKind::Chain)]
        pipeline: PipelineKind,

        #[command(flatten)]
        retrieval: RetrievalArgs,

        /// Print the answer as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search and filter only, printing the retained documents
    Search {
        /// Search text (defaults to the configured question)
        question: Option<String>,

        #[command(flatten)]
        retrieval: RetrievalArgs,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ask_arguments() {
        let cli = Cli::try_parse_from([
            "docqa",
            "ask",
            "what is few-shot prompting?",
            "--pipeline",
            "kernel",
            "--threshold",
            "2.0",
        ])
        .unwrap();

        match cli.command {
            Commands::Ask {
                question,
                pipeline,
                retrieval,
                json,
            } => {
                assert_eq!(question.as_deref(), Some("what is few-shot prompting?"));
                assert_eq!(pipeline, PipelineKind::Kernel);
                assert_eq!(retrieval.threshold, Some(2.0));
                assert!(!json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_ask_defaults_to_chain() {
        let cli = Cli::try_parse_from(["docqa", "ask"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Ask {
                question: None,
                pipeline: PipelineKind::Chain,
                ..
            }
        ));
    }
}
