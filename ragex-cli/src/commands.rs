//! CLI subcommand handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use serde::Serialize;
use tracing::info;

use ragex_core::backend::LmsClient;
use ragex_core::categorizer::{Categories, Categorizer, PercentileCategorizer};
use ragex_core::config::RagexConfig;
use ragex_core::explainer::Explainer;
use ragex_core::rag::RagSystem;
use ragex_core::registry::{Registry, strategy_names};
use ragex_core::retriever::{SemanticRetriever, load_corpus_file};
use ragex_core::types::{ExplanationRequest, ExplanationResult, Granularity};

use crate::{Commands, ConfigAction, StrategyArgs};

/// Handle a CLI subcommand.
pub async fn handle_command(
    command: Commands,
    config: RagexConfig,
    workspace: &Path,
) -> anyhow::Result<()> {
    match command {
        Commands::Explain {
            text,
            input_file,
            system_response,
            strategy,
        } => handle_explain(text, input_file, system_response, strategy, config).await,
        Commands::ExplainRetriever {
            query,
            corpus,
            strategy,
        } => handle_explain_retriever(query, corpus, strategy, config).await,
        Commands::Rag {
            query,
            corpus,
            top_k,
        } => handle_rag(query, corpus, top_k, config).await,
        Commands::Strategies => {
            print!("{}", format_strategies());
            Ok(())
        }
        Commands::Models => handle_models(config).await,
        Commands::Config { action } => handle_config(action, config, workspace),
    }
}

impl StrategyArgs {
    /// Write the overrides into `config`. The comparator override goes to
    /// the retriever settings when explaining a retriever.
    fn apply(&self, config: &mut RagexConfig, retriever: bool) {
        if let Some(granularity) = self.granularity {
            config.explainer.granularity = granularity;
        }
        if let Some(perturber) = &self.perturber {
            config.explainer.perturber = perturber.clone();
        }
        if let Some(comparator) = &self.comparator {
            if retriever {
                config.retriever.comparator = comparator.clone();
            } else {
                config.explainer.comparator = comparator.clone();
            }
        }
        if self.no_normalize {
            config.explainer.normalize = false;
        }
    }
}

fn resolve_input(text: Option<String>, input_file: Option<PathBuf>) -> anyhow::Result<String> {
    match (text, input_file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input file {}", path.display())),
        (None, None) => bail!("Provide the input text or --input-file"),
    }
}

fn resolve_corpus(corpus: Option<PathBuf>, config: &RagexConfig) -> anyhow::Result<Vec<String>> {
    let Some(path) = corpus.or_else(|| config.retriever.corpus_path.clone()) else {
        bail!("No corpus given. Pass --corpus or set retriever.corpus_path");
    };
    let documents = load_corpus_file(&path)?;
    if documents.is_empty() {
        bail!("Corpus file {} has no documents", path.display());
    }
    Ok(documents)
}

fn request_from(config: &RagexConfig, user_input: String) -> ExplanationRequest {
    ExplanationRequest::new(user_input, config.explainer.granularity)
        .with_normalize(config.explainer.normalize)
}

#[derive(Serialize)]
struct CategorizedExplanation<'a> {
    #[serde(flatten)]
    explanation: &'a ExplanationResult,
    categories: Categories,
}

fn render_explanation(
    result: &ExplanationResult,
    categorize: bool,
    config: &RagexConfig,
) -> anyhow::Result<String> {
    if categorize {
        let categories = PercentileCategorizer::from_config(&config.categorizer).categorize(result);
        Ok(serde_json::to_string_pretty(&CategorizedExplanation {
            explanation: result,
            categories,
        })?)
    } else {
        Ok(serde_json::to_string_pretty(result)?)
    }
}

async fn handle_explain(
    text: Option<String>,
    input_file: Option<PathBuf>,
    system_response: Option<String>,
    strategy: StrategyArgs,
    mut config: RagexConfig,
) -> anyhow::Result<()> {
    let input = resolve_input(text, input_file)?;
    strategy.apply(&mut config, false);

    let registry = Registry::from_config(config)?;
    let explainer = registry.generator_explainer()?;

    let mut request = request_from(registry.config(), input);
    if let Some(response) = system_response {
        request = request.with_system_response(response);
    }
    let result = explainer.explain(&request).await?;
    println!(
        "{}",
        render_explanation(&result, strategy.categorize, registry.config())?
    );
    Ok(())
}

async fn handle_explain_retriever(
    query: String,
    corpus: Option<PathBuf>,
    strategy: StrategyArgs,
    mut config: RagexConfig,
) -> anyhow::Result<()> {
    strategy.apply(&mut config, true);
    let documents = resolve_corpus(corpus, &config)?;
    info!(documents = documents.len(), "Loaded corpus");

    let registry = Registry::from_config(config)?;
    let explainer = registry.retriever_explainer(documents).await?;

    let request = request_from(registry.config(), query);
    let result = explainer.explain(&request).await?;
    println!(
        "{}",
        render_explanation(&result, strategy.categorize, registry.config())?
    );
    Ok(())
}

async fn handle_rag(
    query: String,
    corpus: Option<PathBuf>,
    top_k: Option<usize>,
    mut config: RagexConfig,
) -> anyhow::Result<()> {
    if let Some(top_k) = top_k {
        config.rag.top_k = top_k;
    }
    let documents = resolve_corpus(corpus, &config)?;

    let registry = Registry::from_config(config)?;
    let retriever = SemanticRetriever::from_documents(registry.encoder(), documents).await?;
    let rag = RagSystem::from_config(
        &registry.config().rag,
        Arc::new(retriever),
        registry.generator(),
    )?;

    let output = rag.run(&query).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn handle_models(config: RagexConfig) -> anyhow::Result<()> {
    let client = LmsClient::from_config(&config.backend)?;
    let models = client.generator_models().await?;
    if models.is_empty() {
        println!("No generator models available at {}", client.endpoint());
    } else {
        println!("Generator models ({}):", models.len());
        for model in &models {
            println!("  {}", model);
        }
    }
    Ok(())
}

fn format_strategies() -> String {
    let mut out = String::new();
    for (kind, names) in strategy_names() {
        out.push_str(&format!("{}s:\n", kind));
        for name in names {
            out.push_str(&format!("  {}\n", name));
        }
    }
    out.push_str("granularities:\n");
    for granularity in Granularity::ALL {
        out.push_str(&format!("  {}\n", granularity));
    }
    out
}

fn handle_config(
    action: ConfigAction,
    config: RagexConfig,
    workspace: &Path,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_dir = workspace.join(".ragex");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&RagexConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}
