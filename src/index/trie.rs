//! # Burst trie
//!
//! A depth-bounded radix trie over the 2-bit nucleotide alphabet. Interior
//! nodes branch on the next base; every path from the root to a leaf is
//! exactly `depth` bases long, and leaves hold the flat list of
//! `(reference id, position)` occurrences of that path — the "burst"
//! container spec.md's glossary describes, simplified to a fixed depth
//! since every half-window indexed here has the same length.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrieNode {
    Branch(Box<[Option<TrieNode>; 4]>),
    Leaf(Vec<(u32, usize)>),
}

impl TrieNode {
    fn empty_branch() -> Self {
        TrieNode::Branch(Box::new([None, None, None, None]))
    }

    /// Descend one edge (a 2-bit base, 0..=3). Returns `None` if the
    /// subtree is absent.
    pub fn child(&self, edge: u8) -> Option<&TrieNode> {
        match self {
            TrieNode::Branch(children) => children[edge as usize].as_ref(),
            TrieNode::Leaf(_) => None,
        }
    }

    pub fn leaf_entries(&self) -> Option<&[(u32, usize)]> {
        match self {
            TrieNode::Leaf(entries) => Some(entries),
            TrieNode::Branch(_) => None,
        }
    }
}

/// A burst trie built over fixed-length 2-bit paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurstTrie {
    root: TrieNode,
    pub depth: usize,
}

impl BurstTrie {
    /// Build a trie from `(path, ref_id, position)` entries. Every `path`
    /// must have exactly `depth` 2-bit symbols (values `0..=3`).
    pub fn build(depth: usize, entries: &[(Vec<u8>, u32, usize)]) -> Self {
        let mut root = TrieNode::empty_branch();
        for (path, ref_id, pos) in entries {
            debug_assert_eq!(path.len(), depth);
            insert(&mut root, path, *ref_id, *pos);
        }
        BurstTrie { root, depth }
    }

    pub fn root(&self) -> &TrieNode {
        &self.root
    }
}

fn insert(node: &mut TrieNode, path: &[u8], ref_id: u32, pos: usize) {
    match path.split_first() {
        None => {
            // Reached the leaf depth for this path.
            match node {
                TrieNode::Leaf(entries) => entries.push((ref_id, pos)),
                TrieNode::Branch(children) if children.iter().all(Option::is_none) => {
                    *node = TrieNode::Leaf(vec![(ref_id, pos)]);
                }
                TrieNode::Branch(_) => {
                    unreachable!("path length shorter than the trie's fixed depth")
                }
            }
        }
        Some((&edge, rest)) => {
            if let TrieNode::Branch(children) = node {
                let slot = &mut children[edge as usize];
                let child = slot.get_or_insert_with(|| {
                    if rest.is_empty() {
                        TrieNode::Leaf(Vec::new())
                    } else {
                        TrieNode::empty_branch()
                    }
                });
                insert(child, rest, ref_id, pos);
            } else {
                unreachable!("path longer than the trie's fixed depth")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_lookup_single_entry() {
        let trie = BurstTrie::build(3, &[(vec![0, 1, 2], 7, 42)]);
        let n1 = trie.root().child(0).unwrap();
        let n2 = n1.child(1).unwrap();
        let n3 = n2.child(2).unwrap();
        assert_eq!(n3.leaf_entries().unwrap(), &[(7, 42)]);
        assert!(trie.root().child(1).is_none());
    }

    #[test]
    fn shared_prefix_entries_share_subtree() {
        let trie = BurstTrie::build(
            2,
            &[(vec![0, 0], 1, 0), (vec![0, 0], 2, 5), (vec![0, 1], 3, 9)],
        );
        let leaf_00 = trie.root().child(0).unwrap().child(0).unwrap();
        assert_eq!(leaf_00.leaf_entries().unwrap(), &[(1, 0), (2, 5)]);
        let leaf_01 = trie.root().child(0).unwrap().child(1).unwrap();
        assert_eq!(leaf_01.leaf_entries().unwrap(), &[(3, 9)]);
    }
}
