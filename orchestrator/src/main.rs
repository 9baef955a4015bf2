//! Main entry point for the orchestrator binary
//!
//! Loads sites and keywords from a JSON seed into the in-memory store, then
//! either runs a bulk generation over the selected sites or a single scheduled
//! (cron) pass.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tokio::signal;
use tracing::debug;

use orchestrator::{
    services::{
        openai::DEFAULT_CHAT_MODEL, InMemoryStore, NoImageGenerator, OpenAiClient, OpenAiContentGenerator,
        OpenAiContentImprover, OpenAiImageGenerator, PassthroughImprover, SeedFile, TemplateContentGenerator,
    },
    ContentGenerator, ContentImprover, ImageGenerator, Orchestrator, OrchestratorError, OrchestratorResult,
    ProgressReporter,
};
use shared::{logging, site_info, site_warn, SiteId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    /// Offline deterministic drafts, no network
    Template,
    /// OpenAI chat completions and images (needs OPENAI_API_KEY)
    Openai,
}

/// Scheduled and bulk content generation across sites
#[derive(Parser)]
#[command(name = "orchestrator")]
#[command(about = "Generates articles for sites under quota and cadence constraints")]
pub struct Args {
    /// JSON seed with sites and keywords
    #[arg(long)]
    pub seed: PathBuf,

    /// Sites to run, by id or name (defaults to every site in the seed)
    #[arg(long, value_delimiter = ',')]
    pub sites: Vec<String>,

    /// Total number of articles for a bulk run
    #[arg(long, default_value = "10")]
    pub budget: u32,

    /// Content provider
    #[arg(long, value_enum, default_value = "template")]
    pub provider: Provider,

    /// Chat model used with the openai provider
    #[arg(long, default_value = DEFAULT_CHAT_MODEL)]
    pub model: String,

    /// Run one scheduled pass instead of a bulk run
    #[arg(long)]
    pub scheduled: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Write the final store contents as JSON to this file
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> OrchestratorResult<()> {
    let args = Args::parse();
    let _ = dotenv::dotenv();

    logging::init_tracing(Some(&args.log_level));
    logging::log_startup("orchestrator");

    let seed = SeedFile::load(&args.seed).await?;
    let store = InMemoryStore::from_seed(seed)?;
    let site_ids = resolve_sites(&store, &args.sites).await?;
    debug!(sites = site_ids.len(), provider = ?args.provider, "Configuration loaded");

    match args.provider {
        Provider::Template => {
            let orchestrator = Orchestrator::new(
                TemplateContentGenerator::new(),
                PassthroughImprover,
                NoImageGenerator,
                store.clone(),
            );
            run(&orchestrator, &args, &site_ids).await?;
        }
        Provider::Openai => {
            let client = OpenAiClient::from_env()?;
            let orchestrator = Orchestrator::new(
                OpenAiContentGenerator::new(client.clone(), args.model.clone()),
                OpenAiContentImprover::new(client.clone()),
                OpenAiImageGenerator::new(client),
                store.clone(),
            );
            run(&orchestrator, &args, &site_ids).await?;
        }
    }

    if let Some(path) = &args.output {
        let snapshot = store.snapshot().await;
        tokio::fs::write(path, serde_json::to_string_pretty(&snapshot)?).await?;
        logging::log_success(&format!("Store written to {}", path.display()));
    }

    logging::log_shutdown("orchestrator");
    Ok(())
}

/// Map `--sites` entries (ids or names) to site ids
async fn resolve_sites(store: &InMemoryStore, requested: &[String]) -> OrchestratorResult<Vec<SiteId>> {
    let snapshot = store.snapshot().await;
    if requested.is_empty() {
        return Ok(snapshot.sites.iter().map(|s| s.id).collect());
    }

    requested
        .iter()
        .map(|entry| {
            let entry = entry.trim();
            snapshot
                .sites
                .iter()
                .find(|s| s.id.to_string() == entry || s.name.eq_ignore_ascii_case(entry))
                .map(|s| s.id)
                .or_else(|| SiteId::from_string(entry).ok())
                .ok_or_else(|| OrchestratorError::InvalidRequest {
                    message: format!("unknown site \"{entry}\""),
                })
        })
        .collect()
}

async fn run<G, I, M>(
    orchestrator: &Orchestrator<G, I, M, InMemoryStore>,
    args: &Args,
    site_ids: &[SiteId],
) -> OrchestratorResult<()>
where
    G: ContentGenerator + Send + Sync + 'static,
    I: ContentImprover + Send + Sync + 'static,
    M: ImageGenerator + Send + Sync + 'static,
{
    if args.scheduled {
        for outcome in orchestrator.run_scheduled(site_ids).await {
            match (&outcome.outcome, &outcome.decision, &outcome.skipped_reason) {
                (Some(result), _, _) if result.success => {
                    site_info!(outcome.site_id, "✅ Generated \"{}\"", result.title.as_deref().unwrap_or(""));
                }
                (Some(result), _, _) => {
                    site_warn!(outcome.site_id, "❌ {}", result.error.as_deref().unwrap_or("generation failed"));
                }
                (None, _, Some(reason)) => site_warn!(outcome.site_id, "⏭️ Skipped: {}", reason),
                (None, Some(decision), None) => site_info!(outcome.site_id, "⏭️ Skipped: {}", decision),
                (None, None, None) => {}
            }
        }
        return Ok(());
    }

    let plan = orchestrator.prepare_run(site_ids, args.budget).await?;
    for error in &plan.errors {
        logging::log_error("Site validation", error);
    }

    let reporter = ProgressReporter::new();
    let interrupt = reporter.cancel_on(async {
        match signal::ctrl_c().await {
            Ok(()) => logging::log_progress("Cancellation requested", "finishing the current article"),
            Err(_) => std::future::pending::<()>().await,
        }
    });

    let mut updates = reporter.subscribe();
    let watcher = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            if let Some(label) = &state.current_label {
                logging::log_progress(&format!("[{}/{}]", state.completed, state.total), label);
            }
        }
    });

    let summary = orchestrator.execute(&plan, &reporter).await;
    watcher.abort();
    interrupt.abort();

    for error in summary.state.recent_errors(10) {
        logging::log_error("Article generation", error);
    }
    println!("{}", summary.state.summary_line());
    Ok(())
}
