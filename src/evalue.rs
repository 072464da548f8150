//! # Karlin-Altschul E-value statistics
//!
//! A handful of small pure functions converting a raw alignment score into
//! the expected-number-of-alignments statistic used for acceptance (spec.md
//! §4.4 "Gapped extension": "Compute E-value from S, alignment length, and
//! database size using the scorer's configured Karlin-Altschul
//! parameters"). Kept short and doc-tested, in the style of the teacher's
//! small pure helpers in `utils.rs`.

/// The two Karlin-Altschul parameters a scorer configures for its scoring
/// matrix: `lambda` (the scale of the score distribution) and `k` (the
/// normalization constant for the number of independent HSPs expected).
#[derive(Debug, Clone, Copy)]
pub struct KarlinAltschulParams {
    pub lambda: f64,
    pub k: f64,
}

impl Default for KarlinAltschulParams {
    /// Typical ungapped-nucleotide-search defaults; the scorer usually
    /// overrides these from its own derivation.
    fn default() -> Self {
        KarlinAltschulParams {
            lambda: 0.192,
            k: 0.176,
        }
    }
}

/// `E = K * m * n * exp(-lambda * S)`, the classic Karlin-Altschul
/// statistic for an ungapped local alignment of score `S` between a query
/// of effective length `query_len` and a database of total size `db_size`.
///
/// ```
/// # use seedsieve::evalue::{evalue, KarlinAltschulParams};
/// let params = KarlinAltschulParams { lambda: 0.2, k: 0.1 };
/// let e = evalue(40, 18, 1_000_000, params);
/// assert!(e > 0.0);
/// ```
pub fn evalue(score: i32, query_len: usize, db_size: usize, params: KarlinAltschulParams) -> f64 {
    if score <= 0 {
        return f64::INFINITY;
    }
    params.k * (query_len as f64) * (db_size as f64) * (-params.lambda * score as f64).exp()
}

/// Invert [`evalue`] to find the minimum score that clears a given E-value
/// cutoff, used to derive `min_sw_score` from `evalue_cutoff` (spec.md §4.4
/// "Acceptance": `S ≥ min_SW_score` derived from the E-value cutoff).
///
/// ```
/// # use seedsieve::evalue::{min_score_for_evalue, KarlinAltschulParams};
/// let params = KarlinAltschulParams::default();
/// let min_score = min_score_for_evalue(1.0, 18, 1_000_000, params);
/// assert!(min_score > 0);
/// ```
pub fn min_score_for_evalue(
    cutoff: f64,
    query_len: usize,
    db_size: usize,
    params: KarlinAltschulParams,
) -> i32 {
    if cutoff <= 0.0 || query_len == 0 || db_size == 0 {
        return i32::MAX;
    }
    let numerator = params.k * query_len as f64 * db_size as f64 / cutoff;
    if numerator <= 1.0 {
        return 0;
    }
    (numerator.ln() / params.lambda).ceil() as i32
}
