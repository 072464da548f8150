//! Property-based test for spec.md §8's "Property-based" scenario: for a
//! random read embedded exactly in a random reference, seed search + LIS
//! chaining + gapped extension must together produce at least one accepted
//! alignment whose score clears the stated lower bound.
//!
//! Drives [`Driver::process`] directly (the per-read driver, Component E)
//! rather than the full threaded harness, since the property is about the
//! seed-and-extend algorithm's correctness, not the pipeline's concurrency.
use proptest::prelude::*;

use seedsieve::driver::{Driver, PerReadWorker, Strand};
use seedsieve::config::SearchConfig;
use seedsieve::index::trie::BurstTrie;
use seedsieve::index::{IndexPart, References};
use seedsieve::read::Read;
use seedsieve::stats::WorkerStats;

const PARTIALWIN: usize = 9;
const LNWIN: usize = 2 * PARTIALWIN;
const MATCH: i32 = 2;
const MISMATCH: i32 = -3;
const GAP_OPEN: i32 = -5;
const GAP_EXTEND: i32 = -2;

fn base() -> impl Strategy<Value = u8> {
    prop::sample::select(vec![b'A', b'C', b'G', b'T'])
}

fn lower_bound_score(lnwin: usize) -> i32 {
    let indel_cost = -GAP_OPEN - GAP_EXTEND;
    (lnwin as i32 - 1) * MATCH + MISMATCH.min(indel_cost)
}

/// Build a single-seed index whose only entry covers the first window of
/// `read_seq`, pointing at the position where `read_seq` was embedded in
/// `reference_seq`.
fn build_index_for(read_seq: &[u8], reference_seq: &[u8], embed_offset: usize) -> (IndexPart, References) {
    let mut part = IndexPart::new(PARTIALWIN, [LNWIN, LNWIN / 2, 1], MATCH, MISMATCH, GAP_OPEN, GAP_EXTEND);
    let read_encoded = seedsieve::read::encode(read_seq);
    let w1 = read_encoded[0..PARTIALWIN].to_vec();
    let w2 = read_encoded[PARTIALWIN..LNWIN].to_vec();
    let key = part.pack_key(&w1).expect("read bases are all valid nucleotides");
    let trie = BurstTrie::build(PARTIALWIN, &[(w2, 0, embed_offset)]);
    part.insert(key, Some(trie), None);

    let mut refs = References::default();
    refs.push("ref0".to_string(), seedsieve::read::encode(reference_seq));
    (part, refs)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn embedded_read_always_yields_an_accepted_alignment_above_the_floor(
        read_seq in prop::collection::vec(base(), LNWIN..=4 * LNWIN),
        pad_before in prop::collection::vec(base(), 0..10),
        pad_after in prop::collection::vec(base(), 0..10),
    ) {
        let embed_offset = pad_before.len();
        let mut reference_seq = pad_before.clone();
        reference_seq.extend_from_slice(&read_seq);
        reference_seq.extend_from_slice(&pad_after);

        let (part, refs) = build_index_for(&read_seq, &reference_seq, embed_offset);

        let config = SearchConfig {
            seed_hits_threshold: 1,
            min_sw_score: 0,
            evalue_cutoff: 1.0e12,
            num_alignments: -1,
            forward_only: true,
            // Wide enough that the candidate region always covers the
            // whole embedded read regardless of its randomized length.
            edges: 4 * LNWIN,
            match_score: MATCH,
            mismatch: MISMATCH,
            gap_open: GAP_OPEN,
            gap_extend: GAP_EXTEND,
            ..SearchConfig::default()
        };

        let mut read = Read::new(0, read_seq.clone(), None, config.num_alignments);
        let driver = Driver { db_size: 10_000, ..Driver::default() };
        let mut stats = WorkerStats::default();

        driver.process(&mut read, 0, 0, &part, &refs, Strand::Forward, true, &config, &mut stats);

        prop_assert!(read.hit, "expected at least one accepted alignment");
        prop_assert!(!read.alignments.is_empty());
        let best = read.alignments.iter().map(|a| a.score).max().unwrap();
        prop_assert!(
            best >= lower_bound_score(LNWIN),
            "best score {} below floor {}",
            best,
            lower_bound_score(LNWIN)
        );
    }
}
