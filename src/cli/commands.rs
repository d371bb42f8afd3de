//! Command execution

use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing::info;

use super::{Cli, Command, FilterArgs, IngestArgs, RemoveArgs, SearchArgs};
use crate::config::AppConfig;
use crate::domain::ingestion::IngestionRequest;
use crate::domain::knowledge_base::{metadata_keys, FilterCondition, KnowledgeBaseId};
use crate::infrastructure::ingestion::JsonLinesLoader;
use crate::infrastructure::logging;
use crate::infrastructure::services::{IngestionService, KnowledgeBaseService};
use crate::KnowledgeContext;

#[derive(Debug, Serialize)]
struct ModelSummary {
    id: String,
    dimension: u64,
}

#[derive(Debug, Serialize)]
struct RemoveOutcome {
    removed: bool,
    file_ids: Vec<String>,
}

/// Load configuration, build the context and run one command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_logging(&config.logging);

    let context = Arc::new(
        crate::create_knowledge_context(&config)
            .await
            .context("Failed to initialize knowledge context")?,
    );

    match cli.command {
        Command::Query(args) => query(&context, &config, args, false).await,
        Command::Relevant(args) => query(&context, &config, args, true).await,
        Command::Filter(args) => filter(&context, &config, args).await,
        Command::Remove(args) => remove(&context, args).await,
        Command::Ingest(args) => ingest(&context, args).await,
        Command::Models => models(&context).await,
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `--filter` with any `--file-id` values folded in as `file_id ∈ ids`
fn search_filter(args: &SearchArgs) -> Option<FilterCondition> {
    let mut filter = args.filter.clone();
    if !args.file_ids.is_empty() {
        filter
            .get_or_insert_with(FilterCondition::new)
            .insert(metadata_keys::FILE_ID, args.file_ids.clone());
    }
    filter
}

async fn query(
    context: &Arc<KnowledgeContext>,
    config: &AppConfig,
    args: SearchArgs,
    relevant: bool,
) -> anyhow::Result<()> {
    let service = KnowledgeBaseService::new(context.clone());
    let limit = args.limit.unwrap_or(config.retrieval.default_limit);
    let filter = search_filter(&args);

    let documents = if relevant {
        service
            .query_relevant(&args.kb_id, &args.text, filter, limit)
            .await?
    } else {
        service.query(&args.kb_id, &args.text, filter, limit).await?
    };

    print_json(&documents)
}

async fn filter(
    context: &Arc<KnowledgeContext>,
    config: &AppConfig,
    args: FilterArgs,
) -> anyhow::Result<()> {
    let service = KnowledgeBaseService::new(context.clone());
    let limit = args.limit.unwrap_or(config.retrieval.default_filter_limit);

    let documents = service
        .filter_by(&args.kb_id, args.filter, limit, args.offset)
        .await?;

    print_json(&documents)
}

async fn remove(context: &Arc<KnowledgeContext>, args: RemoveArgs) -> anyhow::Result<()> {
    let service = KnowledgeBaseService::new(context.clone());

    let removed = service.remove(&args.kb_id, args.file_ids.clone()).await?;

    print_json(&RemoveOutcome {
        removed,
        file_ids: args.file_ids,
    })
}

async fn ingest(context: &Arc<KnowledgeContext>, args: IngestArgs) -> anyhow::Result<()> {
    let kb_id = KnowledgeBaseId::new(&args.kb_id)?;

    let mut request = match args.file_id {
        Some(file_id) => IngestionRequest::new(kb_id, file_id),
        None => IngestionRequest::with_generated_file_id(kb_id),
    };
    let filename = args.filename.or_else(|| {
        args.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    });
    if let Some(filename) = filename {
        request = request.with_filename(filename);
    }

    info!(path = %args.path.display(), file_id = %request.file_id, "Ingesting file");

    let loader = JsonLinesLoader::new(&args.path);
    let report = IngestionService::new(context.clone())
        .ingest(request, &loader)
        .await;

    print_json(&report)?;

    match report.error {
        Some(error) => anyhow::bail!(
            "Ingestion stopped after {} chunks: {}",
            report.chunks_added,
            error
        ),
        None => Ok(()),
    }
}

async fn models(context: &Arc<KnowledgeContext>) -> anyhow::Result<()> {
    let mut summaries: Vec<ModelSummary> = context
        .embeddings()
        .list_all()
        .await
        .into_iter()
        .map(|(id, model)| ModelSummary {
            id,
            dimension: model.dimension(),
        })
        .collect();
    summaries.sort_by(|a, b| a.id.cmp(&b.id));

    print_json(&summaries)
}
