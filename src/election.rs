//! Election context and id-hash derivation.
//!
//! An election is identified by operator-chosen text (deployments use ids
//! like `EID-2025-09`, but the format is a convention of the invitation
//! tooling, not enforced here). The id is folded into the field and
//! committed into every leaf and nullifier, so credentials never transfer
//! across elections.

use crate::utils::{hash_one, keccak_field};
use pasta_curves::pallas;

/// Derives the field-level election id hash.
///
/// The exact id text is hashed with no normalization. A caller that silently
/// trims or re-cases the id produces a different hash, which the vote-input
/// assembler surfaces as a consistency error against the stored artifacts.
///
/// # Arguments
///
/// * `id` - Election id text, used verbatim
///
/// # Returns
///
/// `hash_one(keccak_field(id))` as a field element
#[must_use]
pub fn derive_election_id(id: &str) -> pallas::Base {
    hash_one(keccak_field(id))
}

/// An election with its precomputed id hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Election {
    pub id: String,
    pub id_hash: pallas::Base,
}

impl Election {
    /// Create an election context for the given id.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            id_hash: derive_election_id(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_election_id_deterministic() {
        assert_eq!(derive_election_id("EID-2025-09"), derive_election_id("EID-2025-09"));
    }

    #[test]
    fn test_derive_election_id_distinct_ids() {
        assert_ne!(derive_election_id("EID-2025-09"), derive_election_id("EID-2025-10"));
    }

    #[test]
    fn test_derive_election_id_is_not_normalized() {
        // Whitespace and case both change the hash; canonicalization of the
        // id is deliberately nobody's job.
        assert_ne!(derive_election_id("EID-2025-09"), derive_election_id(" EID-2025-09"));
        assert_ne!(derive_election_id("EID-2025-09"), derive_election_id("eid-2025-09"));
    }

    #[test]
    fn test_election_precomputes_hash() {
        let election = Election::new("EID-TEST");
        assert_eq!(election.id, "EID-TEST");
        assert_eq!(election.id_hash, derive_election_id("EID-TEST"));
    }
}
