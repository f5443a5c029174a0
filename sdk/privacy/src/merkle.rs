//! Merkle Tree for Note Commitments
//!
//! Append-only tree over the commitment list of one shard. Its root is the
//! shard's anchor; witness paths prove membership without revealing the leaf.
//!
//! ```text
//!                    Root (anchor)
//!                   /    \
//!                 H01    H23
//!                /  \   /   \
//!               C0  C1 C2   [empty]
//! ```

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::commitment::Commitment;

/// Tree depth (supports 2^29 notes per shard)
pub const TREE_DEPTH: usize = 29;

static EMPTY_ROOTS: OnceLock<Vec<[u8; 32]>> = OnceLock::new();

/// Hash two children to get the parent
pub fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Root of an empty subtree of height `level` (level 0 is the all-zero leaf)
pub fn empty_root(level: usize) -> &'static [u8; 32] {
    let roots = EMPTY_ROOTS.get_or_init(|| {
        let mut roots = Vec::with_capacity(TREE_DEPTH + 1);
        let mut current = [0u8; 32];
        roots.push(current);
        for _ in 0..TREE_DEPTH {
            current = hash_pair(&current, &current);
            roots.push(current);
        }
        roots
    });
    &roots[level]
}

/// A Merkle path proving inclusion of a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklePath {
    /// Sibling hashes from leaf to root
    pub siblings: Vec<[u8; 32]>,
    /// Position bits (false = current node is the left child)
    pub path_bits: Vec<bool>,
    /// The leaf position
    pub position: u64,
}

impl MerklePath {
    /// Well-known path used by zero-value dummy inputs: all siblings empty,
    /// leaf at position 0. It never touches a live tree.
    pub fn empty() -> Self {
        Self {
            siblings: (0..TREE_DEPTH).map(|level| *empty_root(level)).collect(),
            path_bits: vec![false; TREE_DEPTH],
            position: 0,
        }
    }

    /// Root obtained by hashing `leaf` up along this path
    pub fn root(&self, leaf: &Commitment) -> [u8; 32] {
        let mut current = leaf.0;
        for (sibling, is_right) in self.siblings.iter().zip(self.path_bits.iter()) {
            current = if *is_right {
                hash_pair(sibling, &current)
            } else {
                hash_pair(&current, sibling)
            };
        }
        current
    }

    /// Verify that this path proves inclusion of `leaf` under `root`
    pub fn verify(&self, leaf: &Commitment, root: &[u8; 32]) -> bool {
        self.siblings.len() == TREE_DEPTH
            && self.path_bits.len() == TREE_DEPTH
            && &self.root(leaf) == root
    }
}

/// Sparse Merkle tree; only non-empty nodes are stored
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// Non-empty nodes: (level, index) -> hash
    nodes: HashMap<(usize, u64), [u8; 32]>,
    /// Leaf positions by commitment (first occurrence)
    positions: HashMap<Commitment, u64>,
    next_index: u64,
    root: [u8; 32],
}

impl MerkleTree {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            positions: HashMap::new(),
            next_index: 0,
            root: *empty_root(TREE_DEPTH),
        }
    }

    /// Build a tree holding `commitments` in order
    pub fn from_commitments<'a, I>(commitments: I) -> Self
    where
        I: IntoIterator<Item = &'a Commitment>,
    {
        let mut tree = Self::new();
        for cm in commitments {
            tree.insert(cm);
        }
        tree
    }

    pub fn root(&self) -> [u8; 32] {
        self.root
    }

    pub fn len(&self) -> u64 {
        self.next_index
    }

    pub fn is_empty(&self) -> bool {
        self.next_index == 0
    }

    /// Append a commitment and return its position
    pub fn insert(&mut self, commitment: &Commitment) -> u64 {
        let position = self.next_index;
        self.nodes.insert((0, position), commitment.0);
        self.positions.entry(*commitment).or_insert(position);

        let mut current_index = position;
        let mut current_hash = commitment.0;

        for level in 0..TREE_DEPTH {
            let is_right = current_index & 1 == 1;
            let sibling = self.node(level, current_index ^ 1);

            current_hash = if is_right {
                hash_pair(&sibling, &current_hash)
            } else {
                hash_pair(&current_hash, &sibling)
            };
            current_index /= 2;
            self.nodes.insert((level + 1, current_index), current_hash);
        }

        self.root = current_hash;
        self.next_index += 1;
        position
    }

    /// Position of a commitment, if present
    pub fn position_of(&self, commitment: &Commitment) -> Option<u64> {
        self.positions.get(commitment).copied()
    }

    pub fn contains(&self, commitment: &Commitment) -> bool {
        self.positions.contains_key(commitment)
    }

    /// Witness path for the leaf at `position`
    pub fn path(&self, position: u64) -> Option<MerklePath> {
        if position >= self.next_index {
            return None;
        }

        let mut siblings = Vec::with_capacity(TREE_DEPTH);
        let mut path_bits = Vec::with_capacity(TREE_DEPTH);
        let mut current_index = position;

        for level in 0..TREE_DEPTH {
            path_bits.push(current_index & 1 == 1);
            siblings.push(self.node(level, current_index ^ 1));
            current_index /= 2;
        }

        Some(MerklePath {
            siblings,
            path_bits,
            position,
        })
    }

    /// Witness path for a commitment
    pub fn witness(&self, commitment: &Commitment) -> Option<MerklePath> {
        self.path(self.position_of(commitment)?)
    }

    fn node(&self, level: usize, index: u64) -> [u8; 32] {
        self.nodes
            .get(&(level, index))
            .copied()
            .unwrap_or(*empty_root(level))
    }
}

impl Default for MerkleTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tree() {
        let tree = MerkleTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.root(), *empty_root(TREE_DEPTH));
    }

    #[test]
    fn test_insert_and_path() {
        let mut tree = MerkleTree::new();

        let c1 = Commitment([1u8; 32]);
        let c2 = Commitment([2u8; 32]);

        assert_eq!(tree.insert(&c1), 0);
        assert_eq!(tree.insert(&c2), 1);

        let path1 = tree.witness(&c1).unwrap();
        assert!(path1.verify(&c1, &tree.root()));

        let path2 = tree.path(1).unwrap();
        assert!(path2.verify(&c2, &tree.root()));
    }

    #[test]
    fn test_path_invalid_commitment() {
        let mut tree = MerkleTree::new();
        let c1 = Commitment([1u8; 32]);
        tree.insert(&c1);

        let path = tree.path(0).unwrap();
        assert!(!path.verify(&Commitment([99u8; 32]), &tree.root()));
        assert!(tree.path(1).is_none());
    }

    #[test]
    fn test_root_changes() {
        let mut tree = MerkleTree::new();
        let root0 = tree.root();

        tree.insert(&Commitment([1u8; 32]));
        let root1 = tree.root();
        assert_ne!(root0, root1, "root should change after insert");

        tree.insert(&Commitment([2u8; 32]));
        assert_ne!(root1, tree.root(), "root should change after each insert");
    }

    #[test]
    fn test_from_commitments_matches_incremental() {
        let cms: Vec<_> = (0..5u8).map(|i| Commitment([i; 32])).collect();
        let built = MerkleTree::from_commitments(&cms);

        let mut incremental = MerkleTree::new();
        for cm in &cms {
            incremental.insert(cm);
        }
        assert_eq!(built.root(), incremental.root());
        assert_eq!(built.position_of(&cms[3]), Some(3));
    }

    #[test]
    fn test_empty_path_is_well_known() {
        let path = MerklePath::empty();
        assert_eq!(path, MerklePath::empty());
        assert!(path.verify(&Commitment([0u8; 32]), empty_root(TREE_DEPTH)));
    }

    #[test]
    fn test_empty_root_vector() {
        assert_eq!(
            hex::encode(empty_root(1)),
            "f5a5fd42d16a20302798ef6ed309979b43003d2320d9f0e8ea9831a92759fb4b"
        );
    }
}
