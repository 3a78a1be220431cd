//! RAG-Ex CLI: explain generator and retriever outputs from a terminal.

mod commands;

use clap::Parser;
use ragex_core::types::Granularity;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// RAG-Ex: perturbation-based explanations for generators and retrievers
#[derive(Parser, Debug)]
#[command(name = "ragex", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (reads .ragex/config.toml from here)
    #[arg(short, long, default_value = ".", global = true)]
    workspace: PathBuf,

    /// Serving backend endpoint
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Generator model to explain
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Explain a generator's response to an input
    Explain {
        /// Input text (read from --input-file when omitted)
        text: Option<String>,

        /// File holding the input text
        #[arg(short, long)]
        input_file: Option<PathBuf>,

        /// Use this response as the reference instead of generating one
        #[arg(long)]
        system_response: Option<String>,

        #[command(flatten)]
        strategy: StrategyArgs,
    },
    /// Explain which parts of the top document made a retriever pick it
    ExplainRetriever {
        /// Query to retrieve with
        #[arg(long)]
        query: String,

        /// Corpus file, one document per line
        #[arg(long)]
        corpus: Option<PathBuf>,

        #[command(flatten)]
        strategy: StrategyArgs,
    },
    /// Answer a query with retrieval-augmented generation
    Rag {
        /// Question to answer
        #[arg(long)]
        query: String,

        /// Corpus file, one document per line
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Number of documents to put in the prompt
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// List tokenizers, perturbers, comparators and explainers
    Strategies,
    /// List the generator models the backend serves
    Models,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Strategy overrides shared by the explain commands.
#[derive(clap::Args, Debug, Default)]
struct StrategyArgs {
    /// Feature granularity: word, sentence, paragraph, phrase
    #[arg(short, long)]
    granularity: Option<Granularity>,

    /// Perturbation strategy
    #[arg(short, long)]
    perturber: Option<String>,

    /// Comparator strategy
    #[arg(short, long)]
    comparator: Option<String>,

    /// Report raw scores instead of min-max normalized ones
    #[arg(long)]
    no_normalize: bool,

    /// Also print high, medium and low importance buckets
    #[arg(long)]
    categorize: bool,
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create default configuration file
    Init,
    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "ragex", "ragex")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "ragex.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut config = ragex_core::config::load_config(Some(&workspace), None)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    // Apply CLI overrides
    if let Some(endpoint) = cli.endpoint {
        config.backend.endpoint = endpoint;
    }
    if let Some(model) = cli.model {
        config.backend.generator_model = model;
    }

    commands::handle_command(cli.command, config, &workspace).await
}
