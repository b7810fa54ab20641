//! Command-line interface for citeguard.
//!
//! Provides commands for resolving citation spans, checking answers and
//! duplicate questions, validating generated batches, reviewing items,
//! and uploading the accepted set.
//!
//! Structured results go to stdout as JSON; logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::adapters::{DatasetUploader, LangSmithClient};
use crate::config::config;
use crate::core::{BatchValidator, CachedSource, DocumentSource};
use crate::domain::CandidatePair;
use crate::library::{KbStore, ReviewStore};
use crate::matching::{check_answer, is_duplicate, resolve_detailed, MatchMethod, SpanLookup};

pub mod items;

/// citeguard - Citation span resolver and batch validator for generated Q&A pairs
#[derive(Parser, Debug)]
#[command(name = "citeguard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Locate a citation in a document
    Span {
        /// Citation text to locate
        #[arg(long)]
        citation: String,

        #[command(flatten)]
        document: DocumentArgs,
    },

    /// Check whether an answer is supported by a document
    CheckAnswer {
        /// Answer text
        #[arg(long)]
        answer: String,

        #[command(flatten)]
        document: DocumentArgs,

        /// Minimum similarity for a match (defaults to config)
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Check a question against previously accepted questions
    CheckDuplicate {
        /// Question to check
        #[arg(long)]
        question: String,

        /// JSON array of previously accepted questions
        #[arg(long, required_unless_present = "from_review")]
        existing: Option<PathBuf>,

        /// Also use questions of accepted review items
        #[arg(long)]
        from_review: bool,

        /// Minimum similarity for a duplicate (defaults to config)
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Validate query/citation pairs against one document
    Validate {
        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Validate question/answer pairs against one document with fuzzy matching
    ValidateAnswers {
        #[command(flatten)]
        batch: BatchArgs,

        /// Minimum answer similarity (defaults to config)
        #[arg(long)]
        answer_threshold: Option<f64>,
    },

    /// Review generated items
    Items {
        #[command(subcommand)]
        command: items::ItemCommands,
    },

    /// Inspect knowledge-base documents
    Kb {
        #[command(subcommand)]
        command: KbCommands,
    },

    /// Upload accepted items as a LangSmith dataset
    Upload {
        /// Dataset name (defaults to config)
        #[arg(long)]
        dataset_name: Option<String>,
    },

    /// Show resolved configuration (debug)
    Config,
}

#[derive(Subcommand, Debug)]
pub enum KbCommands {
    /// Print a document
    Show {
        /// Document id, relative to the knowledge-base root
        doc_id: String,

        /// Keep YAML front-matter
        #[arg(long)]
        raw: bool,
    },
}

/// Where document text comes from
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct DocumentArgs {
    /// Read the document from a file (used verbatim)
    #[arg(long)]
    pub document: Option<PathBuf>,

    /// Look the document up in the knowledge base
    #[arg(long)]
    pub doc_id: Option<String>,
}

/// Previously accepted questions
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// JSON array of questions
    #[arg(long)]
    pub existing: Option<PathBuf>,

    /// Also use questions of accepted review items
    #[arg(long)]
    pub from_review: bool,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// JSON array of pair objects
    #[arg(long)]
    pub pairs: PathBuf,

    #[command(flatten)]
    pub document: DocumentArgs,

    #[command(flatten)]
    pub history: HistoryArgs,

    /// Question similarity threshold (defaults to config)
    #[arg(long)]
    pub threshold: Option<f64>,
}

/// `span` output: the lookup plus the pass that found it
#[derive(Debug, Serialize)]
struct SpanReport {
    #[serde(flatten)]
    lookup: SpanLookup,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<MatchMethod>,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Span { citation, document } => span(&citation, &document),
            Commands::CheckAnswer {
                answer,
                document,
                threshold,
            } => check_answer_command(&answer, &document, threshold),
            Commands::CheckDuplicate {
                question,
                existing,
                from_review,
                threshold,
            } => {
                let history = HistoryArgs {
                    existing,
                    from_review,
                };
                check_duplicate(&question, &history, threshold)
            }
            Commands::Validate { batch } => validate(BatchValidator::citations(), &batch),
            Commands::ValidateAnswers {
                batch,
                answer_threshold,
            } => {
                let threshold = match answer_threshold {
                    Some(t) => t,
                    None => config()?.thresholds.answer,
                };
                validate(
                    BatchValidator::answers().with_answer_threshold(threshold),
                    &batch,
                )
            }
            Commands::Items { command } => items::execute(command),
            Commands::Kb { command } => execute_kb(command),
            Commands::Upload { dataset_name } => upload(dataset_name).await,
            Commands::Config => show_config(),
        }
    }
}

/// Print a value as pretty JSON on stdout
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Knowledge-base store from resolved configuration
pub(crate) fn kb_store() -> Result<KbStore> {
    Ok(KbStore::new(config()?.kb_dir.clone()))
}

/// Review store from resolved configuration
pub(crate) fn review_store() -> Result<ReviewStore> {
    let config = config()?;
    ReviewStore::open(&config.review_jsonl, &config.output_jsonl).with_context(|| {
        format!(
            "Failed to open review store: {}",
            config.review_jsonl.display()
        )
    })
}

/// Load document text from a file or the knowledge base
fn load_document(args: &DocumentArgs) -> Result<String> {
    match (&args.document, &args.doc_id) {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read document: {}", path.display())),
        (None, Some(doc_id)) => kb_store()?
            .get_document(doc_id)
            .with_context(|| format!("Document not found: {}", doc_id)),
        (None, None) => anyhow::bail!("Provide --document <file> or --doc-id <id>"),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Collect history from `--existing` and, optionally, accepted review items
fn load_history(args: &HistoryArgs) -> Result<Vec<String>> {
    let mut history: Vec<String> = match &args.existing {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };

    if args.from_review {
        history.extend(review_store()?.accepted_questions());
    }

    Ok(history)
}

fn question_threshold(threshold: Option<f64>) -> Result<f64> {
    match threshold {
        Some(t) => Ok(t),
        None => Ok(config()?.thresholds.question),
    }
}

fn span(citation: &str, document: &DocumentArgs) -> Result<()> {
    let document = load_document(document)?;
    let resolution = resolve_detailed(citation, &document);

    print_json(&SpanReport {
        lookup: SpanLookup::from(resolution.map(|r| r.span)),
        method: resolution.map(|r| r.method),
    })
}

fn check_answer_command(answer: &str, document: &DocumentArgs, threshold: Option<f64>) -> Result<()> {
    let document = load_document(document)?;
    let threshold = match threshold {
        Some(t) => t,
        None => config()?.thresholds.answer,
    };

    print_json(&check_answer(answer, &document, threshold))
}

fn check_duplicate(question: &str, history: &HistoryArgs, threshold: Option<f64>) -> Result<()> {
    let history = load_history(history)?;
    let threshold = question_threshold(threshold)?;

    print_json(&is_duplicate(question, &history, threshold))
}

fn validate(validator: BatchValidator, args: &BatchArgs) -> Result<()> {
    let pairs: Vec<CandidatePair> = read_json(&args.pairs)?;
    let history = load_history(&args.history)?;
    let validator = validator.with_question_threshold(question_threshold(args.threshold)?);

    let outcome = match (&args.document.document, &args.document.doc_id) {
        (None, Some(doc_id)) => {
            let source = CachedSource::new(kb_store()?);
            validator.validate_document(&source, doc_id, &pairs, &history)?
        }
        _ => {
            let document = load_document(&args.document)?;
            validator.validate(&pairs, &document, &history)
        }
    };

    for (reason, count) in outcome.rejection_counts() {
        eprintln!("  {}: {}", reason, count);
    }
    eprintln!(
        "[{} valid, {} rejected]",
        outcome.valid.len(),
        outcome.rejected.len()
    );

    print_json(&outcome)
}

fn execute_kb(command: KbCommands) -> Result<()> {
    match command {
        KbCommands::Show { doc_id, raw } => {
            let kb = kb_store()?;
            let content = if raw {
                kb.get_raw(&doc_id)
            } else {
                kb.get_document(&doc_id)
            };
            let content = content.with_context(|| format!("Document not found: {}", doc_id))?;
            print!("{}", content);
            Ok(())
        }
    }
}

async fn upload(dataset_name: Option<String>) -> Result<()> {
    let config = config()?;
    let dataset_name = dataset_name.unwrap_or_else(|| config.langsmith.default_dataset.clone());

    let store = review_store()?;
    let accepted: Vec<_> = store.accepted_items().into_iter().cloned().collect();

    let uploader = LangSmithClient::from_settings(&config.langsmith)?;
    let receipt = uploader
        .upload(&accepted, &dataset_name)
        .await
        .with_context(|| format!("Upload via {} failed", uploader.name()))?;

    print_json(&receipt)
}

/// Show resolved configuration
fn show_config() -> Result<()> {
    let config = config()?;

    println!("citeguard configuration:");
    println!();
    println!(
        "  Config file:  {}",
        config
            .config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!("  Root:         {}", config.root.display());
    println!("  Knowledge:    {}", config.kb_dir.display());
    println!("  Output:       {}", config.output_jsonl.display());
    println!("  Review:       {}", config.review_jsonl.display());
    println!();
    println!("  Question threshold: {}", config.thresholds.question);
    println!("  Answer threshold:   {}", config.thresholds.answer);
    println!();
    println!("  LangSmith endpoint: {}", config.langsmith.endpoint);
    println!("  LangSmith dataset:  {}", config.langsmith.default_dataset);
    println!(
        "  LangSmith API key:  {}",
        if config.langsmith.api_key.is_some() {
            "set"
        } else {
            "(not set)"
        }
    );

    Ok(())
}
