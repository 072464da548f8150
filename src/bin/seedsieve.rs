//! # `seedsieve` — outer loop (spec.md §4.6)
//!
//! Parses CLI flags into a [`SearchConfig`], opens the checkpoint store and
//! output sinks, then hands off to [`seedsieve::pipeline::run_pipeline`],
//! which owns the per-(index, part) reader/processor/writer iteration.
//! After the last part, appends the end-of-run summary. Mirrors the
//! teacher's `bin/ConSTRain.rs` shape: parse args -> build shared state ->
//! run -> finalize output -> report errors on exit.
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use seedsieve::cli::Cli;
use seedsieve::output::{AlignmentSink, BlastTabularSink, FastaSink, OtuMapSink, SamSink};
use seedsieve::pipeline::run_pipeline;
use seedsieve::record::{FastxReader, RecordSource};
use seedsieve::store::{ReadStore, SledStore};

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.to_search_config();

    if config.index_files.is_empty() {
        anyhow::bail!("at least one --index directory is required");
    }

    let store: Arc<dyn ReadStore> =
        Arc::new(SledStore::open(&config.kvdb_path).context("opening checkpoint store")?);

    let mut sinks: Vec<Box<dyn AlignmentSink>> = Vec::new();
    if let Some(path) = &cli.blast_out {
        let file = File::create(path).context("creating BLAST-tabular output file")?;
        sinks.push(Box::new(BlastTabularSink::new(file)));
    }
    if let Some(path) = &cli.sam_out {
        let file = File::create(path).context("creating SAM output file")?;
        sinks.push(Box::new(SamSink::new(file)));
    }
    if let Some(path) = &cli.matched_out {
        let file = File::create(path).context("creating matched-reads FASTA file")?;
        sinks.push(Box::new(FastaSink::new(file, true)));
    }
    if let Some(path) = &cli.unmatched_out {
        let file = File::create(path).context("creating unmatched-reads FASTA file")?;
        sinks.push(Box::new(FastaSink::new(file, false)));
    }
    if config.otumap {
        let path = cli
            .otumap_out
            .as_ref()
            .context("--otumap requires --otumap-out")?;
        let file = File::create(path).context("creating OTU-map output file")?;
        sinks.push(Box::new(OtuMapSink::new(file, config.min_id, config.min_cov)));
    }

    let input_path = cli.input.clone();
    let stats = run_pipeline(
        &config,
        &config.index_files,
        store,
        move || {
            let file = File::open(&input_path)
                .with_context(|| format!("opening input file {}", input_path.display()))?;
            let reader = FastxReader::new(BufReader::new(file));
            Ok(Box::new(reader) as Box<dyn RecordSource + Send>)
        },
        sinks,
    )?;

    info!(
        "processed {} reads, {} mapped ({:.2}%)",
        stats.reads_processed(),
        stats.reads_mapped(),
        stats.mapped_pct()
    );

    let summary_file = File::create(&cli.summary_out).context("creating summary file")?;
    let index_names = config
        .index_files
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| format!("{}s since epoch", d.as_secs()))
        .unwrap_or_else(|_| "unknown".to_string());
    seedsieve::output::write_summary(summary_file, &index_names, &stats, &timestamp)
        .context("writing summary")?;

    Ok(())
}
