//! CLI module for kb-retrieval
//!
//! Every command addresses a knowledge base by its composite id
//! `{name};{embedding_model_id}` and prints JSON to stdout.

pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::knowledge_base::FilterCondition;

/// Knowledge base retrieval over embedding-bound vector collections
#[derive(Parser)]
#[command(name = "kb-retrieval")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Similarity search returning single chunks
    Query(SearchArgs),

    /// Similarity search returning whole reconstructed documents
    Relevant(SearchArgs),

    /// Enumerate chunks matching a metadata filter
    Filter(FilterArgs),

    /// Delete every chunk loaded from the given files
    Remove(RemoveArgs),

    /// Load pre-chunked documents from a JSON Lines file
    Ingest(IngestArgs),

    /// List the registered embedding models and their dimensions
    Models,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Knowledge base id, e.g. `handbook;bge-m3`
    #[arg(long = "kb")]
    pub kb_id: String,

    pub text: String,

    /// Defaults to `retrieval.default_limit`
    #[arg(long)]
    pub limit: Option<usize>,

    /// Metadata filter as a JSON object, e.g. `{"file_id": ["A", "B"]}`
    #[arg(long, value_parser = parse_filter)]
    pub filter: Option<FilterCondition>,

    /// Restrict to chunks of these files; combined into the filter
    #[arg(long = "file-id")]
    pub file_ids: Vec<String>,
}

#[derive(Args, Debug)]
pub struct FilterArgs {
    #[arg(long = "kb")]
    pub kb_id: String,

    #[arg(long, value_parser = parse_filter)]
    pub filter: Option<FilterCondition>,

    /// Defaults to `retrieval.default_filter_limit`
    #[arg(long)]
    pub limit: Option<usize>,

    /// Number of matching chunks to skip
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    #[arg(long = "kb")]
    pub kb_id: String,

    #[arg(long = "file-id", required = true)]
    pub file_ids: Vec<String>,
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    #[arg(long = "kb")]
    pub kb_id: String,

    /// JSON Lines file, one `{"page_content", "metadata"}` object per line
    pub path: PathBuf,

    /// Id stamped on every chunk; a UUID is generated when omitted
    #[arg(long)]
    pub file_id: Option<String>,

    /// Stamped as `doc_filename`; defaults to the file name of `path`
    #[arg(long)]
    pub filename: Option<String>,
}

fn parse_filter(raw: &str) -> Result<FilterCondition, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid filter JSON: {}", e))
}
