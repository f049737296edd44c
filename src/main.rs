use std::path::PathBuf;

use docqa::cli::{Cli, Commands, ConfigAction, RetrievalArgs};
use docqa::config::{secret_from_env, Config, ConfigValidator};
use docqa::error::{DocqaError, Result};
use docqa::openai::OpenAiClient;
use docqa::pipeline::{answer_question, Answer, PipelineKind, PipelineSettings};
use docqa::search::{Retrieval, SearchClient};

fn main() {
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ask {
            question,
            pipeline,
            retrieval,
            json,
        } => {
            cmd_ask(cli.config, question, pipeline, &retrieval, json)?;
        }
        Commands::Search {
            question,
            retrieval,
            json,
        } => {
            cmd_search(cli.config, question, &retrieval, json)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "docqa=debug" } else { "docqa=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_ask(
    config_path: Option<PathBuf>,
    question: Option<String>,
    pipeline: PipelineKind,
    overrides: &RetrievalArgs,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path, overrides)?;
    ConfigValidator::validate_credentials(&config)?;

    let question = question.unwrap_or_else(|| config.pipeline.default_question.clone());
    let retrieval = retrieve(&config, &question)?;

    if !json {
        print_totals(&retrieval);
    }

    if retrieval.documents.is_empty() {
        return Err(DocqaError::NoRelevantDocuments {
            threshold: config.filter.threshold,
        });
    }

    if !json {
        println!("Number of chunks: {}", retrieval.documents.chunk_count());
    }

    let organization = config
        .openai
        .organization_env
        .as_deref()
        .and_then(|var| std::env::var(var).ok());
    let openai = OpenAiClient::new(
        &config.openai,
        &secret_from_env(&config.openai.api_key_env)?,
        organization.as_deref(),
        config.http.timeout(),
    )?;

    let settings = PipelineSettings::from_config(&config);
    let answer = answer_question(
        pipeline,
        &retrieval.documents,
        &question,
        &openai,
        &openai,
        &settings,
    )?;

    if json {
        print_json(&answer, "answer")?;
    } else {
        print_answer(&answer);
    }

    Ok(())
}

fn cmd_search(
    config_path: Option<PathBuf>,
    question: Option<String>,
    overrides: &RetrievalArgs,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path, overrides)?;
    ConfigValidator::validate_credentials(&config)?;

    let question = question.unwrap_or_else(|| config.pipeline.default_question.clone());
    let retrieval = retrieve(&config, &question)?;

    if json {
        return print_json(&retrieval.documents, "filtered documents");
    }

    print_totals(&retrieval);
    println!(
        "Kept {} document(s) scoring above {}",
        retrieval.documents.len(),
        config.filter.threshold
    );

    for doc in &retrieval.documents {
        println!("\n{} (score {:.2})", doc.file_name, doc.score);
        println!("  Path: {}", doc.source_path);
        println!("  Chunks: {}", doc.retained_chunks.len());
        for caption in &doc.retained_captions {
            println!("  - {}", caption);
        }
    }

    if !retrieval.response.answers.is_empty() {
        println!("\nExtractive answers:");
        for answer in &retrieval.response.answers {
            println!("  [{:.2}] {}", answer.score, answer.text);
        }
    }

    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path, &RetrievalArgs::default())?;
            print_json(&config, "config")?;
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);

            if let Err(e) = ConfigValidator::validate_credentials(&config) {
                println!("⚠ {}", e);
            }
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| DocqaError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
            println!("  Set your search and model endpoints, then export the API key variables");
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, overrides: &RetrievalArgs) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    let mut config = if path.exists() {
        Config::load(&path)?
    } else {
        tracing::warn!(
            "Config file not found, using defaults. Run 'docqa config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    };

    if let Some(threshold) = overrides.threshold {
        config.filter.threshold = threshold;
    }
    if let Some(top) = overrides.top {
        config.search.top = top;
    }
    ConfigValidator::validate(&config)?;

    Ok(config)
}

fn retrieve(config: &Config, question: &str) -> Result<Retrieval> {
    let client = SearchClient::new(
        config.search.clone(),
        &secret_from_env(&config.search.api_key_env)?,
        config.http.timeout(),
    )?;
    client.retrieve(question, &config.filter.relevance_filter())
}

fn print_totals(retrieval: &Retrieval) {
    println!(
        "Total Documents Found: {}, Top Documents: {}",
        retrieval.total_found(),
        retrieval.response.value.len()
    );
}

fn print_answer(answer: &Answer) {
    println!("Question: {}", answer.question);
    println!("Answer: {}", answer.answer);
    println!("Reference: {}", answer.references.join("\n"));
}

fn print_json<T: serde::Serialize>(value: &T, what: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| DocqaError::Json {
        source: e,
        context: format!("Failed to serialize {}", what),
    })?;
    println!("{}", json);
    Ok(())
}
