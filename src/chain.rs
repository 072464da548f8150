//! # Seed grouping + LIS chaining (Component D, part 1)
//!
//! Partitions accumulated seed hits by reference, finds the longest
//! strictly increasing subsequence of read positions per reference (in
//! reference-position order), and turns the winning chain into a padded
//! candidate reference region for extension. See spec.md §4.4 "Grouping"
//! and "LIS selection".
use std::collections::BTreeMap;

use crate::read::SeedHit;

/// A candidate alignment region: the reference this chain points at, and
/// the padded reference-position span to extend against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub ref_id: u32,
    pub ref_start: usize,
    pub ref_end: usize,
    /// The chain itself, `(ref_pos, read_pos)` pairs in increasing order.
    pub chain: Vec<(usize, usize)>,
}

/// Group hits by `ref_id`, keeping only groups with at least
/// `seed_hits_threshold` entries (spec.md §4.4 "Grouping"). Each pair is
/// `(ref_pos, read_pos)`, taken directly from the seed hit.
pub fn group_by_reference(
    hits: &[SeedHit],
    seed_hits_threshold: usize,
) -> BTreeMap<u32, Vec<(usize, usize)>> {
    let mut groups: BTreeMap<u32, Vec<(usize, usize)>> = BTreeMap::new();
    for hit in hits {
        groups
            .entry(hit.ref_id)
            .or_default()
            .push((hit.ref_pos, hit.win_index));
    }
    groups.retain(|_, pairs| pairs.len() >= seed_hits_threshold);
    groups
}

/// Longest strictly increasing subsequence of `read_pos` over pairs sorted
/// by `ref_pos` ascending. Ties in LIS length are broken by preferring the
/// chain whose first element has the lower `read_pos`, for reproducibility
/// (spec.md §4.4).
///
/// `pairs` is `(ref_pos, read_pos)`; returns the winning chain, sorted by
/// `ref_pos` ascending, or an empty vec if `pairs` is empty.
pub fn longest_increasing_subsequence(pairs: &[(usize, usize)]) -> Vec<(usize, usize)> {
    if pairs.is_empty() {
        return Vec::new();
    }
    let mut sorted: Vec<(usize, usize)> = pairs.to_vec();
    sorted.sort_by_key(|&(ref_pos, read_pos)| (ref_pos, read_pos));

    let n = sorted.len();
    // predecessor[i] / length[i]: standard patience-sort-free O(n^2) LIS,
    // fine at the scale of one read's seed-hit groups.
    let mut length = vec![1usize; n];
    let mut predecessor = vec![None; n];

    for i in 0..n {
        for j in 0..i {
            if sorted[j].1 < sorted[i].1 && length[j] + 1 > length[i] {
                length[i] = length[j] + 1;
                predecessor[i] = Some(j);
            }
        }
    }

    let best_len = *length.iter().max().unwrap();
    // Among chains of the max length, prefer the one whose first element
    // has the lowest read_pos: scan candidates ending at each index,
    // reconstruct, and keep the lexicographically-smallest-by-start chain.
    let mut best_chain: Option<Vec<(usize, usize)>> = None;
    for end in 0..n {
        if length[end] != best_len {
            continue;
        }
        let mut chain = Vec::with_capacity(best_len);
        let mut cur = Some(end);
        while let Some(idx) = cur {
            chain.push(sorted[idx]);
            cur = predecessor[idx];
        }
        chain.reverse();
        let better = match &best_chain {
            None => true,
            Some(existing) => chain[0].1 < existing[0].1,
        };
        if better {
            best_chain = Some(chain);
        }
    }

    best_chain.unwrap_or_default()
}

/// Turn a winning chain into a padded candidate reference region (spec.md
/// §4.4: `(min ref_pos, max ref_pos + lnwin)` padded by up to `edges` on
/// each side, clamped to `[0, ref_len]`).
pub fn candidate_region(
    ref_id: u32,
    chain: Vec<(usize, usize)>,
    lnwin: usize,
    edges: usize,
    ref_len: usize,
) -> Candidate {
    let min_ref_pos = chain.iter().map(|&(r, _)| r).min().unwrap_or(0);
    let max_ref_pos = chain.iter().map(|&(r, _)| r).max().unwrap_or(0);
    let ref_start = min_ref_pos.saturating_sub(edges);
    let ref_end = (max_ref_pos + lnwin + edges).min(ref_len);
    Candidate {
        ref_id,
        ref_start,
        ref_end,
        chain,
    }
}

/// Run grouping + LIS selection + region padding for one pass's worth of
/// hits, returning one candidate per reference group that cleared the
/// seed-hits threshold.
pub fn chain_hits(
    hits: &[SeedHit],
    seed_hits_threshold: usize,
    lnwin: usize,
    edges: usize,
    ref_lens: impl Fn(u32) -> usize,
) -> Vec<Candidate> {
    group_by_reference(hits, seed_hits_threshold)
        .into_iter()
        .map(|(ref_id, pairs)| {
            let chain = longest_increasing_subsequence(&pairs);
            candidate_region(ref_id, chain, lnwin, edges, ref_lens(ref_id))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(ref_id: u32, ref_pos: usize, win_index: usize) -> SeedHit {
        SeedHit {
            ref_id,
            ref_pos,
            win_index,
        }
    }

    #[test]
    fn groups_drop_below_threshold() {
        let hits = vec![hit(1, 0, 0), hit(2, 0, 0), hit(2, 10, 5)];
        let groups = group_by_reference(&hits, 2);
        assert!(!groups.contains_key(&1));
        assert_eq!(groups.get(&2).unwrap().len(), 2);
    }

    #[test]
    fn lis_picks_the_increasing_chain() {
        // ref_pos ascending, read_pos: 0, 5, 3, 8 -> LIS is [0,5,8] (len 3)
        let pairs = vec![(0, 0), (1, 5), (2, 3), (3, 8)];
        let chain = longest_increasing_subsequence(&pairs);
        assert_eq!(chain, vec![(0, 0), (1, 5), (3, 8)]);
    }

    #[test]
    fn lis_tie_break_prefers_lower_start() {
        // Two length-2 chains: [(0,1),(1,2)] and [(0,3),(1,4)] -- pick the
        // one starting with the lower read_pos.
        let pairs = vec![(0, 3), (0, 1), (1, 4), (1, 2)];
        let chain = longest_increasing_subsequence(&pairs);
        assert_eq!(chain[0].1, 1);
    }

    #[test]
    fn candidate_region_pads_and_clamps() {
        let chain = vec![(10, 0), (20, 5)];
        let candidate = candidate_region(7, chain, 18, 4, 100);
        assert_eq!(candidate.ref_start, 6);
        assert_eq!(candidate.ref_end, 42);

        let tight = candidate_region(7, vec![(0, 0)], 18, 4, 10);
        assert_eq!(tight.ref_start, 0);
        assert_eq!(tight.ref_end, 10);
    }

    #[test]
    fn empty_pairs_yield_empty_chain() {
        assert!(longest_increasing_subsequence(&[]).is_empty());
    }
}
