mod session;

use std::path::PathBuf;

use annualcmp_core::AppConfig;
use annualcmp_extract::RATIO_CATALOG;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::session::{DocumentInput, Session};

#[derive(Debug, Parser)]
#[command(name = "annualcmp")]
#[command(about = "Compare annual-report financials and search report content across companies")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// PDFs to process, shared by every document command.
#[derive(Debug, Args)]
struct DocumentArgs {
    /// Annual report PDFs
    #[arg(required = true)]
    pdfs: Vec<PathBuf>,

    /// Company name for each PDF, in order; derived from the report when omitted
    #[arg(long = "company")]
    companies: Vec<String>,

    /// Fiscal year of the reports (defaults to ANNUALCMP_FISCAL_YEAR)
    #[arg(long)]
    year: Option<i32>,
}

impl DocumentArgs {
    fn inputs(&self, default_year: i32) -> anyhow::Result<Vec<DocumentInput>> {
        anyhow::ensure!(
            self.companies.len() <= self.pdfs.len(),
            "{} company names given for {} PDFs",
            self.companies.len(),
            self.pdfs.len()
        );
        let fiscal_year = self.year.unwrap_or(default_year);
        Ok(self
            .pdfs
            .iter()
            .enumerate()
            .map(|(i, path)| DocumentInput {
                path: path.clone(),
                company_hint: self.companies.get(i).cloned().unwrap_or_default(),
                fiscal_year,
            })
            .collect())
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract statement figures and financial ratios
    Extract {
        #[command(flatten)]
        docs: DocumentArgs,
    },
    /// Semantic search across reports, grouped by company
    Search {
        #[command(flatten)]
        docs: DocumentArgs,

        #[arg(long)]
        query: String,

        /// Number of hits across all companies (defaults to ANNUALCMP_TOP_K)
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Answer a question once per company from retrieved excerpts
    Ask {
        #[command(flatten)]
        docs: DocumentArgs,

        #[arg(long)]
        query: String,

        #[arg(long)]
        top_k: Option<usize>,

        /// Use simulated answers when no Gemini API key is configured
        #[arg(long)]
        mock_llm: bool,
    },
    /// List the ratio catalog
    Catalog,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = annualcmp_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(?config, "configuration loaded");

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract { docs } => run_extract(&config, &docs).await,
        Commands::Search { docs, query, top_k } => {
            run_search(&config, &docs, &query, top_k.unwrap_or(config.search_top_k)).await
        }
        Commands::Ask {
            docs,
            query,
            top_k,
            mock_llm,
        } => run_ask(&config, &docs, &query, top_k.unwrap_or(config.search_top_k), mock_llm).await,
        Commands::Catalog => {
            print_catalog();
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct ExtractOutput<'a> {
    documents: &'a [session::ExtractedDocument],
    summary: session::IngestSummary,
}

async fn run_extract(config: &AppConfig, docs: &DocumentArgs) -> anyhow::Result<()> {
    let mut session = Session::from_config(config, false);
    let summary = session.ingest(docs.inputs(config.default_fiscal_year)?).await;
    print_json(&ExtractOutput {
        documents: session.extracted(),
        summary,
    })
}

/// Ingest and index; an index that cannot be built leaves searches empty.
async fn indexed_session(
    config: &AppConfig,
    docs: &DocumentArgs,
    mock_answers: bool,
) -> anyhow::Result<Session> {
    let mut session = Session::from_config(config, mock_answers);
    session.ingest(docs.inputs(config.default_fiscal_year)?).await;
    if let Err(e) = session.build_index().await {
        tracing::warn!(error = %e, "search index unavailable");
    }
    Ok(session)
}

async fn run_search(
    config: &AppConfig,
    docs: &DocumentArgs,
    query: &str,
    top_k: usize,
) -> anyhow::Result<()> {
    let session = indexed_session(config, docs, false).await?;
    print_json(&session.search(query, top_k).await)
}

async fn run_ask(
    config: &AppConfig,
    docs: &DocumentArgs,
    query: &str,
    top_k: usize,
    mock_llm: bool,
) -> anyhow::Result<()> {
    let session = indexed_session(config, docs, mock_llm).await?;
    print_json(&session.ask(query, top_k).await)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_catalog() {
    println!("{:<14} {:<18} {:<5} {:<9} FORMULA", "CATEGORY", "KEY", "UNIT", "STATUS");
    for def in RATIO_CATALOG {
        let status = if def.is_computed() { "computed" } else { "planned" };
        println!(
            "{:<14} {:<18} {:<5} {:<9} {}",
            def.category.as_str(),
            def.key,
            def.unit,
            status,
            def.formula
        );
    }
}

#[cfg(test)]
mod tests;
