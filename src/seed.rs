//! # Bitvector seed search (Component C)
//!
//! For each window on a read, probe the burst trie for an exact match in
//! one half and an approximate (≤1 edit) match in the other, using a
//! bit-parallel match vector rather than a per-position edit-distance
//! table. See spec.md §4.3 for the two-subsearch shape this module
//! implements.
use crate::index::trie::TrieNode;
use crate::index::IndexPart;
use crate::read::SeedHit;

/// Which half of the window is searched exactly vs. approximately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Exact `w1`, ≤1 edit in `w2` (spec.md §4.3, subsearch 1a).
    Forward,
    /// Exact `w2`, ≤1 edit in `w1`, scanned right-to-left (subsearch 1b).
    Reverse,
}

/// Bit-parallel ≤1-edit match state. Bit `p` of `zero_edit` is set when the
/// trie path walked so far matches the read exactly up to read-offset `p`;
/// bit `p` of `one_edit` is set when it matches allowing exactly one of
/// {substitution, insertion, deletion} somewhere in the path so far.
///
/// Both bitsets are indexed by read-offset relative to the start of the
/// half being searched, `0..=half.len()`, which comfortably fits the `u64`
/// words used here since `partialwin` is always small.
#[derive(Debug, Clone, Copy)]
pub struct MatchVector {
    zero_edit: u64,
    one_edit: u64,
    len: usize,
}

impl MatchVector {
    /// The starting state before any trie edge has been taken: offset 0
    /// matches trivially with zero edits, nothing else is reachable yet.
    pub fn start(len: usize) -> Self {
        debug_assert!(len < 63, "half-window too long for a u64 bitset");
        MatchVector {
            zero_edit: 1,
            one_edit: 0,
            len,
        }
    }

    /// Advance the automaton by one trie edge carrying symbol `edge`,
    /// against the half-window's symbols `half` (already encoded, 2-bit).
    /// Implements match / substitution / deletion / insertion transitions
    /// for the single allowed edit (spec.md §4.3 "Edit model").
    pub fn step(&self, edge: u8, half: &[u8]) -> MatchVector {
        let mut next = MatchVector {
            zero_edit: 0,
            one_edit: 0,
            len: self.len,
        };

        for p in 0..=self.len {
            let matches = p < half.len() && half[p] == edge;

            // Exact match: extend a zero-edit path through a matching base.
            if bit(self.zero_edit, p) && matches {
                next.zero_edit |= mask(p + 1);
            }

            // Substitution: consume one read base under one edit, whether
            // or not it happened to match (a "substitution" to the same
            // base is just a wasted edit, never chosen over the zero-edit
            // path, so soundness doesn't depend on excluding it here).
            if bit(self.zero_edit, p) {
                next.one_edit |= mask(p + 1);
            }
            // Deletion: consume a trie edge without consuming a read base.
            if bit(self.zero_edit, p) {
                next.one_edit |= mask(p);
            }
            // Insertion: consume a read base without consuming a trie edge,
            // i.e. skip ahead one read position before trying this edge.
            if p + 1 <= self.len && bit(self.zero_edit, p + 1) {
                next.one_edit |= mask(p + 1);
            }

            // Carry an existing one-edit path forward only on an exact
            // match; a second edit is never allowed.
            if bit(self.one_edit, p) && matches {
                next.one_edit |= mask(p + 1);
            }
        }

        next
    }

    /// `true` once an exact (zero-edit) path has reached the end of the
    /// half-window.
    pub fn exact_leaf_reachable(&self) -> bool {
        bit(self.zero_edit, self.len)
    }

    /// `true` once a ≤1-edit path has reached (or landed adjacent to, for
    /// an indel's off-by-one) the end of the half-window.
    pub fn edit_leaf_reachable(&self) -> bool {
        let end = self.len;
        bit(self.one_edit, end)
            || (end > 0 && bit(self.one_edit, end - 1))
            || bit(self.one_edit, end + 1)
    }
}

fn bit(word: u64, p: usize) -> bool {
    p < 64 && (word >> p) & 1 == 1
}

fn mask(p: usize) -> u64 {
    if p < 64 {
        1u64 << p
    } else {
        0
    }
}

/// Result of probing a single half against the trie: the exact-match flag
/// (`accept_zero_kmer`) plus any hits discovered during the walk.
pub struct ProbeResult {
    pub accept_zero_kmer: bool,
    pub hits: Vec<SeedHit>,
}

/// Walk `node` depth-first, descending on edges consistent with `vector`,
/// collecting leaf hits reachable with ≤1 edit (or exactly, which implies
/// ≤1). Mirrors the trie-intersect-with-match-vector traversal in spec.md
/// §4.3: "intersect the current match vector with the children bits; prune
/// when no bit survives."
fn walk(node: &TrieNode, half: &[u8], vector: MatchVector, win_index: usize, out: &mut ProbeResult) {
    if let Some(entries) = node.leaf_entries() {
        if vector.exact_leaf_reachable() {
            out.accept_zero_kmer = true;
        }
        if vector.exact_leaf_reachable() || vector.edit_leaf_reachable() {
            for &(ref_id, ref_pos) in entries {
                out.hits.push(SeedHit {
                    ref_id,
                    ref_pos,
                    win_index,
                });
            }
        }
        return;
    }

    for edge in 0u8..4 {
        if let Some(child) = node.child(edge) {
            let next_vector = vector.step(edge, half);
            if next_vector.zero_edit != 0 || next_vector.one_edit != 0 {
                walk(child, half, next_vector, win_index, out);
            }
        }
    }
}

/// Run both subsearches for one window: forward probe first; the reverse
/// probe only runs if the forward probe didn't already find an exact
/// match (spec.md §4.3: "Run only if `accept_zero_kmer` is still false").
///
/// `min_occurrence` is the Open Questions `minoccur` filter (spec.md §9):
/// a half-window's `lookup_tbl` entry is only probed once its reference
/// count reaches this floor. `0` disables the filter (any occurrence
/// qualifies, the source's actual — if unintended — behavior).
pub fn probe_window(part: &IndexPart, encoded: &[u8], win_index: usize, min_occurrence: usize) -> Vec<SeedHit> {
    let partialwin = part.partialwin;
    if win_index + part.lnwin > encoded.len() {
        return Vec::new();
    }
    let w1 = &encoded[win_index..win_index + partialwin];
    let w2 = &encoded[win_index + partialwin..win_index + 2 * partialwin];

    let forward = probe_half(part, w1, w2, Probe::Forward, win_index, min_occurrence);
    let mut hits = forward.hits;

    if !forward.accept_zero_kmer {
        let w2_rev: Vec<u8> = w2.iter().rev().copied().collect();
        let w1_rev: Vec<u8> = w1.iter().rev().copied().collect();
        let reverse = probe_half(part, &w2_rev, &w1_rev, Probe::Reverse, win_index, min_occurrence);
        hits.extend(reverse.hits);
    }

    hits
}

/// Probe keyed on `key_half` (looked up exactly in `lookup_tbl`), walking
/// the approximate match against `search_half`.
fn probe_half(
    part: &IndexPart,
    key_half: &[u8],
    search_half: &[u8],
    direction: Probe,
    win_index: usize,
    min_occurrence: usize,
) -> ProbeResult {
    let mut result = ProbeResult {
        accept_zero_kmer: false,
        hits: Vec::new(),
    };
    let key = match part.pack_key(key_half) {
        Some(k) => k,
        None => return result,
    };
    let required = min_occurrence.max(1);
    let entry = match part.entry(key) {
        Some(e) if e.count as usize >= required => e,
        _ => return result,
    };
    let trie = match direction {
        Probe::Forward => entry.trie_f.as_ref(),
        Probe::Reverse => entry.trie_r.as_ref(),
    };
    let Some(trie) = trie else {
        return result;
    };
    let vector = MatchVector::start(search_half.len());
    walk(trie.root(), search_half, vector, win_index, &mut result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::trie::BurstTrie;

    fn part_with_entry(partialwin: usize, path: Vec<u8>, ref_id: u32) -> IndexPart {
        let mut part = IndexPart::new(partialwin, [1, 1, 1], 2, -3, -5, -2);
        let key = part.pack_key(&path[..partialwin]).unwrap();
        let second_half_path = path[partialwin..].to_vec();
        let trie = BurstTrie::build(partialwin, &[(second_half_path, ref_id, 0)]);
        part.insert(key, Some(trie), None);
        part
    }

    #[test]
    fn exact_match_sets_accept_zero_kmer() {
        // w1 = [0,1,2], w2 = [3,0,1]
        let path = vec![0, 1, 2, 3, 0, 1];
        let part = part_with_entry(3, path.clone(), 5);
        let result = probe_half(&part, &path[0..3], &path[3..6], Probe::Forward, 0, 0);
        assert!(result.accept_zero_kmer);
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].ref_id, 5);
    }

    #[test]
    fn single_substitution_is_still_found() {
        let path = vec![0, 1, 2, 3, 0, 1];
        let part = part_with_entry(3, path.clone(), 5);
        // flip the last base of w2 (3,0,1 -> 3,0,2): one substitution.
        let mutated_w2 = vec![3, 0, 2];
        let result = probe_half(&part, &path[0..3], &mutated_w2, Probe::Forward, 0, 0);
        assert!(!result.accept_zero_kmer);
        assert_eq!(result.hits.len(), 1);
    }

    #[test]
    fn two_edits_are_not_found() {
        let path = vec![0, 1, 2, 3, 0, 1];
        let part = part_with_entry(3, path.clone(), 5);
        let mutated_w2 = vec![1, 2, 3]; // every base different
        let result = probe_half(&part, &path[0..3], &mutated_w2, Probe::Forward, 0, 0);
        assert!(result.hits.is_empty());
    }

    #[test]
    fn missing_key_yields_no_hits() {
        let part = IndexPart::new(3, [1, 1, 1], 2, -3, -5, -2);
        let result = probe_half(&part, &[0, 1, 2], &[3, 0, 1], Probe::Forward, 0, 0);
        assert!(result.hits.is_empty());
        assert!(!result.accept_zero_kmer);
    }

    #[test]
    fn probe_window_finds_exact_seed() {
        let path = vec![0, 1, 2, 3, 0, 1];
        let part = part_with_entry(3, path.clone(), 9);
        let encoded = path.clone();
        let hits = probe_window(&part, &encoded, 0, 0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].ref_id, 9);
        assert_eq!(hits[0].win_index, 0);
    }

    #[test]
    fn probe_window_out_of_range_is_empty() {
        let part = IndexPart::new(3, [1, 1, 1], 2, -3, -5, -2);
        let encoded = vec![0, 1, 2];
        assert!(probe_window(&part, &encoded, 0, 0).is_empty());
    }

    #[test]
    fn min_occurrence_filter_rejects_below_floor() {
        let path = vec![0, 1, 2, 3, 0, 1];
        let part = part_with_entry(3, path.clone(), 5); // count == 1
        let result = probe_half(&part, &path[0..3], &path[3..6], Probe::Forward, 0, 2);
        assert!(result.hits.is_empty());
    }
}
