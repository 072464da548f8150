//! # Command line interface for `seedsieve`
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use crate::config::SearchConfig;

#[derive(Parser)]
#[command(
    name = "seedsieve",
    author,
    version,
    about = "Seed-and-extend nucleotide read filter",
    long_about = None
)]
pub struct Cli {
    /// Index file directories to search against, in order. Each directory
    /// holds `indexN.partP.seedsieve` files for one index.
    #[arg(long = "index", required = true, num_args = 1..)]
    pub index_files: Vec<PathBuf>,

    /// Path to the embedded key-value store used for cross-part
    /// checkpointing.
    #[arg(long, default_value = "seedsieve.kv")]
    pub kvdb_path: PathBuf,

    /// Number of reader threads.
    #[arg(long = "fread-threads", default_value_t = 1, value_parser = threads_in_range)]
    pub num_fread_threads: usize,

    /// Number of processor threads.
    #[arg(long = "proc-threads", default_value_t = 1, value_parser = threads_in_range)]
    pub num_proc_threads: usize,

    /// Search the forward strand only; skip the reverse-complement pass.
    #[arg(long)]
    pub forward_only: bool,

    /// Maximum number of accepted alignments per read (-1 = no limit).
    #[arg(long, default_value_t = 1)]
    pub num_alignments: i64,

    /// Number of best-scoring alignments to keep once `min_lis` chains have
    /// been evaluated (0 = disabled).
    #[arg(long, default_value_t = 0)]
    pub num_best_hits: i64,

    /// Minimum number of successful LIS chains before the best-hits rule
    /// starts pruning.
    #[arg(long, default_value_t = 0)]
    pub min_lis: i64,

    /// Minimum number of seed hits a reference group needs before it's
    /// handed to the LIS chainer.
    #[arg(long, default_value_t = 2)]
    pub seed_hits_threshold: usize,

    /// Padding (nucleotides) added to each side of a candidate region
    /// before gapped extension.
    #[arg(long, default_value_t = 4)]
    pub edges: usize,

    /// Smith-Waterman match score.
    #[arg(long, default_value_t = 2)]
    pub match_score: i32,

    /// Smith-Waterman mismatch penalty (negative).
    #[arg(long, default_value_t = -3)]
    pub mismatch: i32,

    /// Smith-Waterman gap open penalty (negative).
    #[arg(long, default_value_t = -5)]
    pub gap_open: i32,

    /// Smith-Waterman gap extend penalty (negative).
    #[arg(long, default_value_t = -2)]
    pub gap_extend: i32,

    /// Minimum Smith-Waterman score for an alignment to be accepted.
    #[arg(long, default_value_t = 0)]
    pub min_sw_score: i32,

    /// E-value cutoff alignments must clear.
    #[arg(long, default_value_t = 1.0)]
    pub evalue_cutoff: f64,

    /// Minimum percent identity for OTU-map eligibility.
    #[arg(long, default_value_t = 0.0)]
    pub min_id: f64,

    /// Minimum percent coverage for OTU-map eligibility.
    #[arg(long, default_value_t = 0.0)]
    pub min_cov: f64,

    /// Emit an OTU-map output file.
    #[arg(long)]
    pub otumap: bool,

    /// Track de-novo-clustering eligibility.
    #[arg(long)]
    pub de_novo_otu: bool,

    /// Minimum half-window occurrence count for a seed key to be probed
    /// (0 = disabled).
    #[arg(long, default_value_t = 0)]
    pub min_half_window_occurrence: usize,

    /// Input FASTA/FASTQ file to search.
    #[arg(long)]
    pub input: PathBuf,

    /// BLAST-tabular output path.
    #[arg(long)]
    pub blast_out: Option<PathBuf>,

    /// SAM output path.
    #[arg(long)]
    pub sam_out: Option<PathBuf>,

    /// FASTA output path for reads that matched.
    #[arg(long)]
    pub matched_out: Option<PathBuf>,

    /// FASTA output path for reads that did not match.
    #[arg(long)]
    pub unmatched_out: Option<PathBuf>,

    /// OTU-map output path (requires `--otumap`).
    #[arg(long)]
    pub otumap_out: Option<PathBuf>,

    /// End-of-run summary output path.
    #[arg(long, default_value = "seedsieve.summary")]
    pub summary_out: PathBuf,
}

impl Cli {
    /// Build the immutable [`SearchConfig`] this run will share across
    /// every reader/processor/writer thread.
    pub fn to_search_config(&self) -> SearchConfig {
        SearchConfig {
            index_files: self.index_files.clone(),
            kvdb_path: self.kvdb_path.clone(),
            num_fread_threads: self.num_fread_threads,
            num_proc_threads: self.num_proc_threads,
            forward_only: self.forward_only,
            num_alignments: self.num_alignments,
            num_best_hits: self.num_best_hits,
            min_lis: self.min_lis,
            seed_hits_threshold: self.seed_hits_threshold,
            edges: self.edges,
            match_score: self.match_score,
            mismatch: self.mismatch,
            gap_open: self.gap_open,
            gap_extend: self.gap_extend,
            min_sw_score: self.min_sw_score,
            evalue_cutoff: self.evalue_cutoff,
            min_id: self.min_id,
            min_cov: self.min_cov,
            otumap: self.otumap,
            de_novo_otu: self.de_novo_otu,
            min_half_window_occurrence: self.min_half_window_occurrence,
        }
    }
}

fn threads_in_range(s: &str) -> Result<usize> {
    let threads = s
        .parse()
        .context("could not parse thread count as an integer")?;
    if threads < 1 {
        bail!("thread count must be at least 1");
    }
    Ok(threads)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threads_in_range_rejects_zero() {
        assert!(threads_in_range("0").is_err());
    }

    #[test]
    fn threads_in_range_accepts_positive() {
        assert_eq!(threads_in_range("4").unwrap(), 4);
    }

    #[test]
    fn to_search_config_carries_scoring_params() {
        let cli = Cli::parse_from([
            "seedsieve",
            "--index",
            "idx0",
            "--input",
            "reads.fasta",
            "--match-score",
            "5",
        ]);
        let config = cli.to_search_config();
        assert_eq!(config.match_score, 5);
        assert_eq!(config.index_files, vec![PathBuf::from("idx0")]);
    }
}
