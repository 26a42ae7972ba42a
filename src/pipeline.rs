//! Build-phase pipeline: allowlist entries in, tree and path artifacts out.
//!
//! The pipeline derives one commitment leaf per entry, builds the fixed-depth
//! tree, and exports a path artifact for every real leaf. Leaf order follows
//! entry order, so the allowlist file is the authoritative record of who sits
//! where.

use crate::allowlist::AllowlistEntry;
use crate::commitment::{derive_leaf, email_hash};
use crate::election::Election;
use crate::error::{BallotError, BallotResult};
use crate::merkle::CommitmentTree;
use crate::types::{PathArtifact, TreeArtifact};
use crate::utils::field_to_decimal;
use log::{debug, info};
use pasta_curves::group::ff::PrimeField;
use std::collections::HashSet;

/// One voter's exported path, tagged with its owner and leaf position.
#[derive(Debug, Clone)]
pub struct VoterPath {
    /// Canonical email of the owning voter.
    pub email: String,
    /// Position of the voter's leaf in the tree.
    pub leaf_index: usize,
    /// The serializable path document for this voter.
    pub artifact: PathArtifact,
}

/// Everything the build phase produces for one election.
#[derive(Debug)]
pub struct TreeBuild {
    /// The in-memory tree, kept for direct queries.
    pub tree: CommitmentTree,
    /// The public tree summary document.
    pub artifact: TreeArtifact,
    /// Per-voter path documents, in leaf order.
    pub paths: Vec<VoterPath>,
}

/// Builds the commitment tree for an election and exports every voter's
/// auth path.
///
/// Entries must already be canonicalized, which [`AllowlistEntry::new`]
/// guarantees. Duplicate emails and duplicate tokens are rejected here as
/// well so that callers constructing entries by hand get the same
/// guarantees as the CSV parser; a duplicate token would collide two
/// voters' nullifiers.
///
/// # Errors
/// Returns [`BallotError::MalformedInput`] for duplicate emails or tokens,
/// [`BallotError::CapacityExceeded`] when the entries do not fit in a
/// depth-`depth` tree, and any error from tree construction itself.
pub fn build_tree(
    entries: &[AllowlistEntry],
    election: &Election,
    depth: usize,
) -> BallotResult<TreeBuild> {
    info!(
        "Building commitment tree: {} entries, depth {}",
        entries.len(),
        depth
    );

    let mut seen_emails: HashSet<String> = HashSet::new();
    let mut seen_tokens: HashSet<[u8; 32]> = HashSet::new();
    for entry in entries {
        if !seen_emails.insert(entry.email.clone()) {
            return Err(BallotError::malformed_input(format!(
                "Duplicate email in allowlist: {}",
                entry.email
            )));
        }
        // Token values are secret; the message names the email instead.
        if !seen_tokens.insert(entry.token.to_repr()) {
            return Err(BallotError::malformed_input(format!(
                "Duplicate token in allowlist (entry '{}' matches an earlier one)",
                entry.email
            )));
        }
    }

    let mut leaves = Vec::with_capacity(entries.len());
    for entry in entries {
        let from_hash = email_hash(&entry.email)?;
        leaves.push(derive_leaf(from_hash, entry.token, election.id_hash));
    }

    let tree = CommitmentTree::build(leaves, depth)?;
    let root = tree.root();
    info!("Merkle root: {}", field_to_decimal(root));

    let artifact = TreeArtifact::new(root, election.id_hash, entries.len(), depth);

    let mut paths = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let auth_path = tree.export_path(index)?;
        debug!("Exported auth path for leaf {}", index);
        paths.push(VoterPath {
            email: entry.email.clone(),
            leaf_index: index,
            artifact: PathArtifact::new(root, election.id_hash, &auth_path),
        });
    }

    Ok(TreeBuild {
        tree,
        artifact,
        paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::field_from_decimal;

    fn token_hex(value: u64) -> String {
        format!("{value:064x}")
    }

    fn entries(count: u64) -> Vec<AllowlistEntry> {
        (0..count)
            .map(|i| {
                AllowlistEntry::new(&format!("voter{i}@example.com"), &token_hex(i + 1)).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_build_exports_one_path_per_entry() {
        let election = Election::new("EID-2025-09");
        let build = build_tree(&entries(3), &election, 4).unwrap();

        assert_eq!(build.paths.len(), 3);
        assert_eq!(build.artifact.count, 3);
        assert_eq!(build.artifact.depth, 4);
        for (i, path) in build.paths.iter().enumerate() {
            assert_eq!(path.leaf_index, i);
            assert_eq!(path.email, format!("voter{i}@example.com"));
            assert_eq!(path.artifact.merkle_root, build.artifact.merkle_root);
        }
    }

    #[test]
    fn test_every_exported_path_recombines_to_the_root() {
        let election = Election::new("EID-2025-09");
        let all = entries(5);
        let build = build_tree(&all, &election, 4).unwrap();
        let root = field_from_decimal(&build.artifact.merkle_root).unwrap();

        for (entry, voter_path) in all.iter().zip(&build.paths) {
            let (stored_root, stored_eid, auth) = voter_path.artifact.decode().unwrap();
            assert_eq!(stored_root, root);
            assert_eq!(stored_eid, election.id_hash);

            let from_hash = email_hash(&entry.email).unwrap();
            let leaf = derive_leaf(from_hash, entry.token, election.id_hash);
            assert_eq!(auth.recombine(leaf), root);
        }
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let election = Election::new("EID-2025-09");
        let mut all = entries(2);
        all.push(AllowlistEntry::new("voter0@example.com", &token_hex(99)).unwrap());

        let result = build_tree(&all, &election, 4);
        assert!(matches!(result, Err(BallotError::MalformedInput(_))));
    }

    #[test]
    fn test_duplicate_token_rejected_for_hand_built_entries() {
        let election = Election::new("EID-2025-09");
        let mut all = entries(2);
        // Same token as voter0, fresh email: would collide nullifiers.
        all.push(AllowlistEntry::new("carol@example.com", &token_hex(1)).unwrap());

        let result = build_tree(&all, &election, 4);
        assert!(result.is_err());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("Duplicate token"));
        assert!(!msg.contains(&token_hex(1)));
    }

    #[test]
    fn test_capacity_overflow_propagates() {
        let election = Election::new("EID-2025-09");
        let result = build_tree(&entries(5), &election, 2);
        assert!(matches!(
            result,
            Err(BallotError::CapacityExceeded {
                count: 5,
                depth: 2,
                capacity: 4
            })
        ));
    }

    #[test]
    fn test_build_is_deterministic() {
        let election = Election::new("EID-2025-09");
        let first = build_tree(&entries(4), &election, 5).unwrap();
        let second = build_tree(&entries(4), &election, 5).unwrap();

        assert_eq!(first.artifact, second.artifact);
        for (a, b) in first.paths.iter().zip(&second.paths) {
            assert_eq!(a.artifact, b.artifact);
        }
    }

    #[test]
    fn test_root_binds_the_election() {
        let all = entries(3);
        let one = build_tree(&all, &Election::new("EID-2025-09"), 4).unwrap();
        let two = build_tree(&all, &Election::new("EID-2025-10"), 4).unwrap();

        assert_ne!(one.artifact.merkle_root, two.artifact.merkle_root);
    }
}
