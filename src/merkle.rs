//! Fixed-depth commitment tree over the Poseidon pair hash.
//!
//! The tree always has exactly `2^depth` leaf slots: real leaves fill from
//! index 0 in allowlist order, zero padding fills the rest. Every layer is
//! retained, so exporting an authentication path is a lookup rather than a
//! recomputation. The consuming membership circuit verifies paths of exactly
//! `depth` levels, which is why depth is fixed up front and why padding must
//! hash like any other leaf.

use crate::error::{BallotError, BallotResult};
use crate::utils::hash_pair;
use pasta_curves::pallas;

/// Largest supported tree depth. 2^32 leaf slots is already far beyond any
/// realistic eligibility set.
pub const MAX_TREE_DEPTH: usize = 32;

/// An authentication path from a leaf to the root.
///
/// One (sibling, bit) pair per level, leaf upward. `bits[k] == 1` means the
/// current node at level `k` is the right child, so the sibling goes on the
/// left when recombining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPath {
    pub siblings: Vec<pallas::Base>,
    pub bits: Vec<u8>,
}

impl AuthPath {
    /// Replays the path from a leaf and returns the root it reconnects to.
    #[must_use]
    pub fn recombine(&self, leaf: pallas::Base) -> pallas::Base {
        let mut current = leaf;

        for (sibling, bit) in self.siblings.iter().zip(self.bits.iter()) {
            current = if *bit == 0 {
                hash_pair(current, *sibling)
            } else {
                hash_pair(*sibling, current)
            };
        }

        current
    }

    /// Number of levels in the path.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }
}

/// A fixed-depth binary commitment tree.
///
/// Leaf positions are allowlist positions: changing the eligibility set in
/// any way rebuilds the tree and re-issues every path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitmentTree {
    layers: Vec<Vec<pallas::Base>>,
    leaf_count: usize,
    depth: usize,
}

impl CommitmentTree {
    /// Build a tree of exactly `2^depth` slots from the given leaves.
    ///
    /// # Arguments
    /// * `leaves` - Real leaf commitments in allowlist order
    /// * `depth` - Tree depth; must match the consuming circuit
    ///
    /// # Errors
    /// Returns [`BallotError::CapacityExceeded`] if there are more leaves
    /// than slots (the set is never truncated), or
    /// [`BallotError::MalformedInput`] for a depth outside `1..=32`.
    pub fn build(leaves: Vec<pallas::Base>, depth: usize) -> BallotResult<Self> {
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(BallotError::malformed_input(format!(
                "Tree depth must be between 1 and {MAX_TREE_DEPTH} (got {depth})"
            )));
        }

        let capacity = 1usize << depth;
        if leaves.len() > capacity {
            return Err(BallotError::CapacityExceeded {
                count: leaves.len(),
                depth,
                capacity,
            });
        }

        let leaf_count = leaves.len();
        let mut base = leaves;
        base.resize(capacity, pallas::Base::zero());

        let mut layers = Vec::with_capacity(depth + 1);
        layers.push(base);

        for level in 0..depth {
            let mut next = Vec::with_capacity(layers[level].len() / 2);
            for i in (0..layers[level].len()).step_by(2) {
                next.push(hash_pair(layers[level][i], layers[level][i + 1]));
            }
            layers.push(next);
        }

        Ok(Self {
            layers,
            leaf_count,
            depth,
        })
    }

    /// Tree root.
    #[must_use]
    pub fn root(&self) -> pallas::Base {
        self.layers[self.depth][0]
    }

    /// Configured tree depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of real (non-padding) leaves.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Real leaf at `index`, or `None` outside the real-leaf range.
    #[must_use]
    pub fn leaf(&self, index: usize) -> Option<pallas::Base> {
        if index < self.leaf_count {
            Some(self.layers[0][index])
        } else {
            None
        }
    }

    /// Exports the authentication path for a real leaf.
    ///
    /// # Arguments
    /// * `leaf_index` - Position of the leaf in allowlist order
    ///
    /// # Errors
    /// Returns [`BallotError::MalformedInput`] if the index is outside the
    /// real-leaf range. Padding slots never get paths.
    pub fn export_path(&self, leaf_index: usize) -> BallotResult<AuthPath> {
        if leaf_index >= self.leaf_count {
            return Err(BallotError::malformed_input(format!(
                "Leaf index {leaf_index} is out of range ({} real leaves)",
                self.leaf_count
            )));
        }

        let mut siblings = Vec::with_capacity(self.depth);
        let mut bits = Vec::with_capacity(self.depth);
        let mut index = leaf_index;

        for level in 0..self.depth {
            siblings.push(self.layers[level][index ^ 1]);
            bits.push((index & 1) as u8);
            index >>= 1;
        }

        Ok(AuthPath { siblings, bits })
    }

    /// Checks that a path reconnects a leaf to this tree's root.
    #[must_use]
    pub fn verify_path(&self, leaf: pallas::Base, path: &AuthPath) -> bool {
        path.depth() == self.depth && path.recombine(leaf) == self.root()
    }
}
