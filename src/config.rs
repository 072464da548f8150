//! # Search configuration
//!
//! Every tunable named in spec.md §6 lives here as a single immutable
//! struct. Workers receive it behind an `Arc` rather than reading from
//! process-wide flags, per the "Global flags" redesign note: there is
//! exactly one `SearchConfig` per run, built once before any worker
//! spawns.
use std::path::PathBuf;

/// Immutable, run-wide search and scoring configuration.
///
/// Built once (typically from CLI args, see [`crate::cli`]) and shared via
/// `Arc` with every reader, processor, and writer thread.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Index files to search against, in order.
    pub index_files: Vec<PathBuf>,
    /// Path to the embedded key-value store used for checkpointing.
    pub kvdb_path: PathBuf,

    /// Number of reader threads (`R`).
    pub num_fread_threads: usize,
    /// Number of processor threads (`P`).
    pub num_proc_threads: usize,

    /// Search the forward strand only; skip the reverse-complement pass.
    pub forward_only: bool,

    /// Maximum number of accepted alignments per read (-1 = no limit, 0 = disabled).
    pub num_alignments: i64,
    /// Number of best-scoring alignments to keep once `min_lis` chains have
    /// been evaluated (0 = disabled, falls back to num_alignments rule).
    pub num_best_hits: i64,
    /// Minimum number of successful LIS chains before the best-hits rule
    /// starts pruning to the max score seen so far.
    pub min_lis: i64,

    /// Minimum number of seed hits a reference group needs before it is
    /// handed to the LIS chainer.
    pub seed_hits_threshold: usize,
    /// Padding (nucleotides) added to each side of a candidate reference
    /// region before gapped extension.
    pub edges: usize,

    /// Match/mismatch/gap scoring parameters for Smith-Waterman.
    pub match_score: i32,
    pub mismatch: i32,
    pub gap_open: i32,
    pub gap_extend: i32,

    /// Minimum Smith-Waterman score for an alignment to be accepted.
    pub min_sw_score: i32,
    /// E-value cutoff alignments must clear (used to derive `min_sw_score`
    /// alongside it; both are checked).
    pub evalue_cutoff: f64,
    /// Minimum percent identity for OTU-map eligibility.
    pub min_id: f64,
    /// Minimum percent coverage for OTU-map eligibility.
    pub min_cov: f64,

    /// Emit an OTU-map output file.
    pub otumap: bool,
    /// Track de-novo-clustering eligibility (`hit_denovo`).
    pub de_novo_otu: bool,

    /// Minimum half-window occurrence count in `lookup_tbl` for a key to be
    /// considered during the forward/reverse probe (0 = disabled). See
    /// SPEC_FULL.md's "Open Questions" note on `minoccur`.
    pub min_half_window_occurrence: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            index_files: Vec::new(),
            kvdb_path: PathBuf::from("seedsieve.kv"),
            num_fread_threads: 1,
            num_proc_threads: 1,
            forward_only: false,
            num_alignments: 1,
            num_best_hits: 0,
            min_lis: 0,
            seed_hits_threshold: 2,
            edges: 4,
            match_score: 2,
            mismatch: -3,
            gap_open: -5,
            gap_extend: -2,
            min_sw_score: 0,
            evalue_cutoff: 1.0,
            min_id: 0.0,
            min_cov: 0.0,
            otumap: false,
            de_novo_otu: false,
            min_half_window_occurrence: 0,
        }
    }
}

impl SearchConfig {
    /// `true` if `num_alignments` means "no limit" (spec.md §3: `-1`).
    pub fn unlimited_alignments(&self) -> bool {
        self.num_alignments == -1
    }

    /// `true` if the best-hits early-termination rule (§4.4) is active.
    pub fn best_hits_rule_active(&self) -> bool {
        self.num_best_hits > 0 && self.min_lis > 0
    }
}
