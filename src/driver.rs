//! # Per-read driver (Component E)
//!
//! Drives one read through one (index part, strand) pass: multi-pass
//! window-stride control, early termination, length filtering, and
//! checkpoint bookkeeping. Mirrors the teacher's `lib.rs::run` control
//! flow (thread-local setup, loop over work items, continue on recoverable
//! error, propagate on fatal) adapted from "loop over regions" to "loop
//! over windows within a read." See spec.md §4.5.
use std::collections::HashSet;

use log::{debug, trace, warn};

use crate::align::{smith_waterman, to_alignment};
use crate::chain::chain_hits;
use crate::config::SearchConfig;
use crate::evalue::{evalue, min_score_for_evalue, KarlinAltschulParams};
use crate::index::{IndexPart, References};
use crate::read::Read;
use crate::seed::probe_window;
use crate::stats::WorkerStats;

/// Which strand of the read this driver invocation is searching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

/// The callback-as-job redesign (spec.md §9 "Callback-as-job"): a trait
/// with one method, standing in for the source's function-pointer job.
/// Implemented once for the real per-read pass below, and once more in
/// tests as a stub recording calls.
pub trait PerReadWorker {
    #[allow(clippy::too_many_arguments)]
    fn process(
        &self,
        read: &mut Read,
        index_num: usize,
        part_num: usize,
        part: &IndexPart,
        refs: &References,
        strand: Strand,
        is_last_part: bool,
        config: &SearchConfig,
        stats: &mut WorkerStats,
    );
}

/// The real driver: invokes the seed search and LIS/extend chain per
/// spec.md §4.3/§4.4 across up to three escalating-stride passes.
#[derive(Debug, Default)]
pub struct Driver {
    pub karlin_altschul: KarlinAltschulParams,
    pub db_size: usize,
}

impl PerReadWorker for Driver {
    fn process(
        &self,
        read: &mut Read,
        index_num: usize,
        part_num: usize,
        part: &IndexPart,
        refs: &References,
        strand: Strand,
        is_last_part: bool,
        config: &SearchConfig,
        stats: &mut WorkerStats,
    ) {
        // 1. Checkpoint bookkeeping.
        read.last_index = index_num;
        read.last_part = part_num;

        // 2. Reverse-strand early exit if this read is already done.
        if strand == Strand::Reverse && early_termination_met(read, config) {
            trace!("read {} already satisfied, skipping reverse pass", read.id);
            return;
        }

        // 3. Length statistics.
        stats.record_read_len(read.len());

        // 4. Length filtering.
        if read.len() < part.lnwin {
            warn!(
                "read {} shorter than window ({} < {})",
                read.id,
                read.len(),
                part.lnwin
            );
            read.mark_invalid();
            return;
        }

        let encoded: &[u8] = &read.encoded;
        let mut probed: HashSet<usize> = HashSet::new();
        let mut successful_chains: i64 = 0;
        let mut done = false;

        for pass_n in 0..3 {
            let stride = part.skiplengths[pass_n].max(1);
            let mut win_index = 0;
            while win_index + part.lnwin <= encoded.len() {
                if probed.insert(win_index) {
                    let hits = probe_window(part, encoded, win_index, config.min_half_window_occurrence);
                    read.absorb_seed_hits(&hits);
                }
                win_index += stride;
            }

            let (accepted_any, pass_done) = self.evaluate_pass(read, part, refs, config, &mut successful_chains);
            debug!(
                "read {} pass {} accepted={} done={}",
                read.id, pass_n, accepted_any, pass_done
            );
            if pass_done {
                done = true;
                break;
            }
        }
        let _ = done;

        // 6. Post: de-novo eligibility bookkeeping.
        if strand == Strand::Reverse && !read.hit {
            read.hit_denovo = false;
        }
        if is_last_part && read.hit_denovo {
            stats.record_denovo();
        }
        if read.hit {
            stats.record_hit();
        }
    }
}

impl Driver {
    /// Evaluate every reference group that has crossed `seed_hits_threshold`
    /// since the last evaluation: chain, extend, score, and apply the
    /// acceptance + early-termination rules (spec.md §4.4).
    ///
    /// Returns `(accepted_any, done)`.
    fn evaluate_pass(
        &self,
        read: &mut Read,
        part: &IndexPart,
        refs: &References,
        config: &SearchConfig,
        successful_chains: &mut i64,
    ) -> (bool, bool) {
        let candidates = chain_hits(&read.id_win_hits, config.seed_hits_threshold, part.lnwin, config.edges, |ref_id| {
            refs.sequence(ref_id).map(Vec::len).unwrap_or(0)
        });

        if candidates.is_empty() {
            return (false, false);
        }

        let evaluated_refs: HashSet<u32> = candidates.iter().map(|c| c.ref_id).collect();
        // Per the Open Questions resolution: clear only the consumed
        // prefix for groups actually evaluated; below-threshold groups
        // (not in `evaluated_refs`) are retained for the next pass.
        read.id_win_hits.retain(|hit| !evaluated_refs.contains(&hit.ref_id));

        let min_score = min_score_for_evalue(config.evalue_cutoff, read.len(), self.db_size, self.karlin_altschul)
            .max(config.min_sw_score);

        let mut accepted_any = false;

        for candidate in &candidates {
            let Some(reference) = refs.sequence(candidate.ref_id) else {
                continue;
            };
            let region = &reference[candidate.ref_start..candidate.ref_end.min(reference.len())];
            let Some(result) = smith_waterman(
                &read.encoded,
                region,
                part.match_score,
                part.mismatch,
                part.gap_open,
                part.gap_extend,
                part.lnwin,
            ) else {
                continue;
            };

            if result.score < min_score {
                continue;
            }

            let e = evalue(result.score, read.len(), self.db_size, self.karlin_altschul);
            let alignment = to_alignment(candidate.ref_id, &result, candidate.ref_start, read.len(), e);

            if alignment.score < config.min_sw_score {
                continue;
            }

            if config.num_alignments == 0 {
                // Disabled: candidates are still chained and extended (for
                // the length/stats bookkeeping the rest of the pass does),
                // but none are ever accepted onto the read.
                continue;
            }

            *successful_chains += 1;
            accepted_any = true;
            read.accept_alignment(alignment);

            if read.alignments_exhausted() {
                return (true, true);
            }
        }

        if config.best_hits_rule_active() && *successful_chains >= config.min_lis {
            read.alignments.retain(|a| a.score == read.max_sw_score);
            if read.alignments.len() as i64 >= config.num_best_hits {
                return (accepted_any, true);
            }
        }

        (accepted_any, false)
    }
}

/// `true` once this read's early-termination rule is already satisfied
/// (spec.md §4.5 step 2, used to skip the reverse pass entirely and, by the
/// pipeline harness, to decide whether a read is still eligible to be
/// re-fed against the next index part).
pub fn early_termination_met(read: &Read, config: &SearchConfig) -> bool {
    if !config.unlimited_alignments() && config.num_alignments > 0 {
        read.alignments_exhausted()
    } else if config.best_hits_rule_active() {
        read.alignments.len() as i64 >= config.num_best_hits
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::trie::BurstTrie;

    fn build_fixture() -> (IndexPart, References) {
        let mut part = IndexPart::new(9, [10, 5, 1], 2, -3, -5, -2);
        let seq = crate::read::encode(b"ACGTACGTACGTACGTAC");
        let w1 = seq[0..9].to_vec();
        let w2 = seq[9..18].to_vec();
        let key = part.pack_key(&w1).unwrap();
        let trie = BurstTrie::build(9, &[(w2, 0, 0)]);
        part.insert(key, Some(trie), None);

        let mut refs = References::default();
        refs.push("ref0".to_string(), seq);
        (part, refs)
    }

    #[test]
    fn exact_match_single_seed_produces_one_alignment() {
        let (part, refs) = build_fixture();
        let config = SearchConfig {
            seed_hits_threshold: 1,
            min_sw_score: 0,
            evalue_cutoff: 100.0,
            num_alignments: -1,
            ..SearchConfig::default()
        };
        let mut read = Read::new(0, b"ACGTACGTACGTACGTAC".to_vec(), None, config.num_alignments);
        let driver = Driver {
            db_size: 100,
            ..Driver::default()
        };
        let mut stats = WorkerStats::default();

        driver.process(&mut read, 0, 0, &part, &refs, Strand::Forward, true, &config, &mut stats);

        assert!(read.hit);
        assert_eq!(read.alignments.len(), 1);
        assert_eq!(read.alignments[0].score, 18 * 2);
    }

    #[test]
    fn too_short_read_is_invalid_with_no_alignments() {
        let (part, refs) = build_fixture();
        let config = SearchConfig::default();
        let mut read = Read::new(1, b"ACGT".to_vec(), None, config.num_alignments);
        let driver = Driver::default();
        let mut stats = WorkerStats::default();

        driver.process(&mut read, 0, 0, &part, &refs, Strand::Forward, true, &config, &mut stats);

        assert!(!read.is_valid);
        assert!(read.alignments.is_empty());
    }

    #[test]
    fn num_alignments_one_halts_after_first_hit() {
        let (part, refs) = build_fixture();
        let config = SearchConfig {
            seed_hits_threshold: 1,
            min_sw_score: 0,
            evalue_cutoff: 100.0,
            num_alignments: 1,
            ..SearchConfig::default()
        };
        let mut read = Read::new(2, b"ACGTACGTACGTACGTAC".to_vec(), None, config.num_alignments);
        let driver = Driver {
            db_size: 100,
            ..Driver::default()
        };
        let mut stats = WorkerStats::default();

        driver.process(&mut read, 0, 0, &part, &refs, Strand::Forward, true, &config, &mut stats);

        assert_eq!(read.alignments.len(), 1);
        assert!(read.alignments_exhausted());
    }

    #[test]
    fn num_alignments_zero_disables_alignment_output() {
        let (part, refs) = build_fixture();
        let config = SearchConfig {
            seed_hits_threshold: 1,
            min_sw_score: 0,
            evalue_cutoff: 100.0,
            num_alignments: 0,
            ..SearchConfig::default()
        };
        let mut read = Read::new(4, b"ACGTACGTACGTACGTAC".to_vec(), None, config.num_alignments);
        let driver = Driver {
            db_size: 100,
            ..Driver::default()
        };
        let mut stats = WorkerStats::default();

        driver.process(&mut read, 0, 0, &part, &refs, Strand::Forward, true, &config, &mut stats);

        assert!(!read.hit, "num_alignments = 0 must suppress every alignment");
        assert!(read.alignments.is_empty());
    }

    struct RecordingWorker {
        calls: std::sync::atomic::AtomicUsize,
    }

    impl PerReadWorker for RecordingWorker {
        fn process(
            &self,
            _read: &mut Read,
            _index_num: usize,
            _part_num: usize,
            _part: &IndexPart,
            _refs: &References,
            _strand: Strand,
            _is_last_part: bool,
            _config: &SearchConfig,
            _stats: &mut WorkerStats,
        ) {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[test]
    fn per_read_worker_trait_is_substitutable() {
        let (part, refs) = build_fixture();
        let config = SearchConfig::default();
        let mut read = Read::new(3, b"ACGTACGTACGTACGTAC".to_vec(), None, 1);
        let worker = RecordingWorker {
            calls: std::sync::atomic::AtomicUsize::new(0),
        };
        let mut stats = WorkerStats::default();
        worker.process(&mut read, 0, 0, &part, &refs, Strand::Forward, true, &config, &mut stats);
        assert_eq!(worker.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
