use clap::Parser;
use seo_integrity::store::{JsonPageStore, JsonRedirects, PageStore, RedirectSource};
use seo_integrity::{BatchOrchestrator, BatchOutcome, SeoConfig};
use std::process::ExitCode;

mod args;
use args::{Args, OutputFormat};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    match run(&args).await {
        Ok(outcome) if outcome.result.failed_pages.is_empty() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(2),
        Err(e) => {
            ::log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> seo_integrity::Result<BatchOutcome> {
    let mut config = match &args.config {
        Some(path) => SeoConfig::from_file(path)?,
        None => SeoConfig::default(),
    };
    if args.concurrency.is_some() {
        config.batch.max_concurrency = args.concurrency;
    }

    ::log::info!("Auditing pages from {}", args.pages.display());
    let start_time = std::time::Instant::now();

    let store = JsonPageStore::new(&args.pages);
    let redirects = args.redirects.as_ref().map(JsonRedirects::new);
    let mut orchestrator = BatchOrchestrator::new(config)?;
    let outcome = orchestrator
        .run_from_store(
            &store,
            redirects.as_ref().map(|r| r as &dyn RedirectSource),
        )
        .await?;

    match args.format {
        OutputFormat::Text => println!("{}", outcome.report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
    }

    if args.write {
        orchestrator.commit(Some(&store as &dyn PageStore))?;
    }

    ::log::info!(
        "Audit complete - {} pages in {:.2} seconds",
        outcome.report.total_pages,
        start_time.elapsed().as_secs_f64()
    );
    Ok(outcome)
}
