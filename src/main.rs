use clap::Parser;
use std::sync::Arc;
use tourney_etl::core::{ConfigProvider, ScrapedDocument};
use tourney_etl::utils::{logger, validation::Validate};
use tourney_etl::{
    CliConfig, ConsolidationEngine, ConsolidationPipeline, FieldExtractor, HttpExtractionService,
    JsonFileStore, Result, RunReport, TomlConfig,
};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::info!("Starting tourney-etl");

    if let Err(e) = cli.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("{}", e);
        std::process::exit(2);
    }

    let report = match &cli.config {
        Some(path) => {
            let config = match TomlConfig::from_file(path) {
                Ok(config) => config,
                Err(e) => {
                    tracing::error!("Failed to load config file {}: {}", path, e);
                    eprintln!("{}", e);
                    std::process::exit(2);
                }
            };
            run(&config, &cli.input).await
        }
        None => run(&cli, &cli.input).await,
    };

    match report {
        Ok(report) => {
            tracing::info!("Consolidation run completed");
            println!(
                "Processed {} documents: {} extracted, {} duplicates merged, {} final ({} inserted, {} updated)",
                report.summary.documents_in,
                report.summary.extracted,
                report.summary.duplicates_merged,
                report.summary.final_count,
                report.upserts.inserted,
                report.upserts.updated
            );
            for (reason, count) in &report.summary.rejected_by_reason {
                println!("  rejected ({}): {}", reason, count);
            }
        }
        Err(e) => {
            tracing::error!("Consolidation run failed: {}", e);
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn run<C: ConfigProvider>(config: &C, input: &str) -> Result<RunReport> {
    let documents = read_documents(input)?;
    tracing::info!("Loaded {} scraped documents from {}", documents.len(), input);

    let service = HttpExtractionService::new(config.service_endpoint(), config.timeout_seconds())?;
    let extractor = FieldExtractor::new(Arc::new(service), config.max_retries());
    let pipeline = ConsolidationPipeline::new(
        extractor,
        config.concurrent_requests(),
        config.min_confidence(),
    );
    let store = JsonFileStore::new(config.output_path());

    ConsolidationEngine::new(pipeline, store).run(documents).await
}

fn read_documents(path: &str) -> Result<Vec<ScrapedDocument>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
