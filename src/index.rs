//! # Index part (Component B)
//!
//! The in-memory half-window lookup table and its associated burst tries,
//! plus the reference sequences a part's seed ids point into. Loading is
//! blocking and single-threaded; once loaded, a part is read-only for the
//! lifetime of its iteration (spec.md §4.2) and shared across processors
//! behind an `Arc`.
pub mod trie;

use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::SeedsieveError;
use trie::BurstTrie;

/// One `lookup_tbl` entry: how many references contain this half-window,
/// and the forward/reverse burst-trie roots for extending past it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LookupEntry {
    pub count: u32,
    pub trie_f: Option<BurstTrie>,
    pub trie_r: Option<BurstTrie>,
}

/// A loaded (index, part) slice: the half-window table and this part's
/// window/scoring parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexPart {
    pub lookup_tbl: HashMap<u32, LookupEntry>,
    pub partialwin: usize,
    pub lnwin: usize,
    /// Three successive window-slide strides: pass 0 scans coarsest (the
    /// largest stride), escalating to pass 2's exhaustive stride of 1 if
    /// earlier passes don't accept (spec.md §4.3 "Window stride
    /// schedule"). Must be monotonic non-increasing.
    pub skiplengths: [usize; 3],
    pub match_score: i32,
    pub mismatch: i32,
    pub gap_open: i32,
    pub gap_extend: i32,
}

impl IndexPart {
    pub fn new(
        partialwin: usize,
        skiplengths: [usize; 3],
        match_score: i32,
        mismatch: i32,
        gap_open: i32,
        gap_extend: i32,
    ) -> Self {
        debug_assert!(skiplengths[0] >= skiplengths[1] && skiplengths[1] >= skiplengths[2]);
        IndexPart {
            lookup_tbl: HashMap::new(),
            partialwin,
            lnwin: 2 * partialwin,
            skiplengths,
            match_score,
            mismatch,
            gap_open,
            gap_extend,
        }
    }

    /// Pack a half-window of 2-bit symbols into an integer key, MSB-first
    /// (spec.md §4.3). `half` must contain exactly `partialwin` symbols in
    /// `0..=3`; a symbol of [`crate::read::INVALID_BASE`] or higher makes
    /// the key unrepresentable and this returns `None`.
    pub fn pack_key(&self, half: &[u8]) -> Option<u32> {
        debug_assert_eq!(half.len(), self.partialwin);
        let mut key: u32 = 0;
        for &c in half {
            if c > 3 {
                return None;
            }
            key = (key << 2) | u32::from(c);
        }
        Some(key)
    }

    pub fn entry(&self, key: u32) -> Option<&LookupEntry> {
        self.lookup_tbl.get(&key)
    }

    /// Insert or extend the entry for `key`; used by fixtures and by the
    /// external indexer's loader.
    pub fn insert(&mut self, key: u32, trie_f: Option<BurstTrie>, trie_r: Option<BurstTrie>) {
        let entry = self.lookup_tbl.entry(key).or_default();
        entry.count += 1;
        if trie_f.is_some() {
            entry.trie_f = trie_f;
        }
        if trie_r.is_some() {
            entry.trie_r = trie_r;
        }
    }

    /// Load a part from this crate's own bincode stand-in format (spec.md
    /// §6: the real indexer's byte layout is out of scope; this loader
    /// owns construction and loading of its own fixture format end-to-end).
    pub fn load(index_num: usize, part: usize, base_dir: &Path) -> Result<(IndexPart, References)> {
        let path = base_dir.join(format!("index{index_num}.part{part}.seedsieve"));
        let file = File::open(&path).map_err(|e| SeedsieveError::IndexLoad {
            index_num,
            part,
            reason: e.to_string(),
        })?;
        let reader = std::io::BufReader::new(file);
        let on_disk: OnDiskPart = bincode::deserialize_from(reader).map_err(|e| SeedsieveError::IndexLoad {
            index_num,
            part,
            reason: e.to_string(),
        })?;
        Ok((on_disk.part, on_disk.references))
    }

    /// Write this part and its references to the stand-in format `load`
    /// reads back. Used by fixture setup in tests and by whatever builds
    /// index files for this crate's own test suite.
    pub fn save(&self, references: &References, path: &Path) -> Result<()> {
        let file = File::create(path).context("creating index part file")?;
        let writer = BufWriter::new(file);
        let on_disk = OnDiskPart {
            part: self.clone(),
            references: references.clone(),
        };
        bincode::serialize_into(writer, &on_disk).context("serializing index part")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OnDiskPart {
    part: IndexPart,
    references: References,
}

/// List the part numbers available for `index_num` under `base_dir`, sorted
/// ascending. The outer loop (spec.md §4.6 "for each index file, for each
/// part") uses this to discover how many parts a given index has without
/// the caller needing to know in advance.
pub fn discover_parts(base_dir: &Path, index_num: usize) -> Result<Vec<usize>> {
    let prefix = format!("index{index_num}.part");
    let suffix = ".seedsieve";
    let mut parts = Vec::new();
    for entry in std::fs::read_dir(base_dir).context("listing index directory")? {
        let entry = entry.context("reading index directory entry")?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(part_str) = name.strip_prefix(&prefix).and_then(|s| s.strip_suffix(suffix)) {
            if let Ok(part_num) = part_str.parse::<usize>() {
                parts.push(part_num);
            }
        }
    }
    parts.sort_unstable();
    Ok(parts)
}

/// Parallel array of full reference sequences and headers for the current
/// part, indexed by the seed ids stored in trie leaves.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct References {
    pub headers: Vec<String>,
    pub encoded: Vec<Vec<u8>>,
}

impl References {
    pub fn push(&mut self, header: String, encoded: Vec<u8>) -> u32 {
        let id = self.encoded.len() as u32;
        self.headers.push(header);
        self.encoded.push(encoded);
        id
    }

    pub fn len(&self) -> usize {
        self.encoded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoded.is_empty()
    }

    pub fn sequence(&self, ref_id: u32) -> Option<&[u8]> {
        self.encoded.get(ref_id as usize).map(Vec::as_slice)
    }

    pub fn header(&self, ref_id: u32) -> Option<&str> {
        self.headers.get(ref_id as usize).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_key_is_msb_first() {
        let part = IndexPart::new(3, [1, 1, 1], 2, -3, -5, -2);
        // 0,1,2 -> 0b00_01_10 = 6
        assert_eq!(part.pack_key(&[0, 1, 2]), Some(6));
    }

    #[test]
    fn pack_key_rejects_invalid_symbol() {
        let part = IndexPart::new(3, [1, 1, 1], 2, -3, -5, -2);
        assert_eq!(part.pack_key(&[0, 4, 2]), None);
    }

    #[test]
    fn insert_accumulates_count() {
        let mut part = IndexPart::new(3, [1, 1, 1], 2, -3, -5, -2);
        part.insert(6, None, None);
        part.insert(6, None, None);
        assert_eq!(part.entry(6).unwrap().count, 2);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut part = IndexPart::new(3, [1, 1, 1], 2, -3, -5, -2);
        part.insert(6, Some(BurstTrie::build(3, &[(vec![0, 1, 2], 0, 0)])), None);
        let mut refs = References::default();
        refs.push("ref0".to_string(), vec![0, 1, 2, 0, 1, 2]);

        let path = dir.path().join("index0.part0.seedsieve");
        part.save(&refs, &path).unwrap();

        let (loaded_part, loaded_refs) = IndexPart::load(0, 0, dir.path()).unwrap();
        assert_eq!(loaded_part.partialwin, 3);
        assert_eq!(loaded_refs.header(0), Some("ref0"));
        assert_eq!(loaded_part.entry(6).unwrap().count, 1);
    }

    #[test]
    fn load_missing_part_is_index_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = IndexPart::load(0, 0, dir.path()).unwrap_err();
        assert!(err.to_string().contains("failed to load index part"));
    }

    #[test]
    fn discover_parts_finds_and_sorts_existing_parts() {
        let dir = tempfile::tempdir().unwrap();
        let part = IndexPart::new(3, [1, 1, 1], 2, -3, -5, -2);
        let refs = References::default();
        part.save(&refs, &dir.path().join("index0.part2.seedsieve")).unwrap();
        part.save(&refs, &dir.path().join("index0.part0.seedsieve")).unwrap();
        part.save(&refs, &dir.path().join("index1.part0.seedsieve")).unwrap();

        let parts = discover_parts(dir.path(), 0).unwrap();
        assert_eq!(parts, vec![0, 2]);
    }
}
