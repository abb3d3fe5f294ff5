//! CLI entry point for the harvester tool.

use std::io::{self, IsTerminal, Read};

use anyhow::{Context, Result};
use clap::Parser;
use harvester_core::{
    Candidate, CandidateSource, Config, DownloadPipeline, InputKind, MetadataRecord,
    MetadataStore, StaticCandidates, UnpaywallResolver, parse_input,
};
use harvester_core::download::polite_delay;
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    info!("Harvester starting");

    // Cross-flag validation up front, before stdin or the network is touched.
    let delay_ms = args.delay_range().map_err(|message| anyhow::anyhow!(message))?;

    // Read input: from positional args or stdin
    let input_text = if args.inputs.is_empty() {
        if io::stdin().is_terminal() {
            info!("No input provided. Pipe URLs/DOIs via stdin or pass as arguments.");
            info!("Example: echo 'https://example.com/file.pdf' | harvester");
            return Ok(());
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        args.inputs.join("\n")
    };

    let parse_result = parse_input(&input_text);
    for skipped in &parse_result.skipped {
        warn!(skipped = %skipped, "Skipped unrecognized input");
    }
    if parse_result.is_empty() {
        info!("No valid URLs or DOIs found in input");
        return Ok(());
    }
    info!(
        items = parse_result.len(),
        skipped = parse_result.skipped_count(),
        "Parsed input"
    );

    let config = Config {
        download_dir: args.output_dir.clone(),
        metadata_path: args.metadata_path(),
        min_size_kb: args.min_size_kb,
        request_timeout: std::time::Duration::from_secs(args.timeout_secs),
        fallback_transport_enabled: !args.no_fallback,
        delay_ms,
        page_range: None,
    };

    tokio::fs::create_dir_all(&config.download_dir)
        .await
        .with_context(|| {
            format!("cannot create download directory {}", config.download_dir.display())
        })?;

    // Turn parsed items into candidates. DOIs go through the open-access
    // resolver; resolution failures skip the item, never abort the run.
    let resolver = UnpaywallResolver::new(&args.email)?;
    let mut candidates = Vec::new();
    let mut dois = Vec::new();
    for item in &parse_result.items {
        match item.kind {
            InputKind::Url => {
                candidates.push(Candidate::from_url(&item.value));
                dois.push(None);
            }
            InputKind::Doi => match resolver.resolve_pdf_url(&item.value).await {
                Ok(Some(pdf_url)) => {
                    candidates.push(Candidate::new(pdf_url, item.value.replace('/', "_")));
                    dois.push(Some(item.value.clone()));
                    polite_delay(config.delay_ms).await;
                }
                Ok(None) => {
                    warn!(doi = %item.value, "no open-access PDF; skipping");
                    polite_delay(config.delay_ms).await;
                }
                Err(e) => {
                    warn!(doi = %item.value, error = %e, "DOI resolution failed; skipping");
                    polite_delay(config.delay_ms).await;
                }
            },
        }
    }

    if candidates.is_empty() {
        info!("Nothing to download after resolution");
        return Ok(());
    }

    // All discovery funnels through the candidate-source seam; the pipeline
    // never learns how the candidates were assembled.
    let supplier = StaticCandidates::new(candidates);
    let candidates = supplier.candidates().await?;

    let pipeline = DownloadPipeline::new(&config);
    let (results, stats) = pipeline.run(&candidates).await;

    // Every outcome that left a valid artifact on disk gets a record; the
    // store's dedup keeps re-runs from growing it.
    let mut records = Vec::new();
    for ((candidate, result), doi) in candidates.iter().zip(&results).zip(&dois) {
        if !result.has_artifact() {
            continue;
        }
        let mut record = MetadataRecord::new(
            &result.identifier,
            &candidate.source_url,
            result.file_path.to_string_lossy(),
        )
        .with_attribute("byte_size", result.byte_size.to_string());
        if let Some(doi) = doi {
            record = record.with_attribute("doi", doi.clone());
        }
        records.push(record);
    }

    // Losing the metadata write defeats the purpose of the run; this is the
    // one failure that ends it.
    let store = MetadataStore::new(config.metadata_path.clone());
    let total_records = store
        .merge(&records)
        .await
        .context("failed to write merged metadata store")?;

    info!(
        succeeded = stats.succeeded,
        skipped = stats.skipped,
        rejected = stats.rejected,
        failed = stats.failed,
        total_records,
        "Harvest complete"
    );

    Ok(())
}
