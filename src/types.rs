//! Boundary artifact types for the ballot commitment pipeline.
//!
//! Artifacts are the JSON documents that cross process boundaries: the
//! public tree description, per-voter path files, and the private/public
//! input documents the membership circuit consumes. Field names are
//! camelCase on the wire and every field element is a canonical decimal
//! string, so circuit-side parsing agrees bit for bit with the native
//! arithmetic that produced the values.

use crate::error::{BallotError, BallotResult};
use crate::merkle::AuthPath;
use crate::utils::{field_from_decimal, field_to_decimal};
use log::debug;
use pasta_curves::pallas;
use serde::{Deserialize, Serialize};

pub(crate) fn decimal_field(value: &str, what: &str) -> BallotResult<pallas::Base> {
    field_from_decimal(value).map_err(|e| match e {
        BallotError::MalformedInput(msg) => BallotError::MalformedInput(format!("{what}: {msg}")),
        other => other,
    })
}

/// Public description of a built commitment tree (`tree.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeArtifact {
    /// Tree root as a canonical decimal string.
    pub merkle_root: String,
    /// Election id hash as a canonical decimal string.
    pub election_id_hash: String,
    /// Number of real (non-padding) leaves.
    pub count: usize,
    /// Depth the tree was built with. Consumers validate their configured
    /// depth against this instead of re-declaring it.
    pub depth: usize,
}

impl TreeArtifact {
    /// Builds the artifact for a freshly constructed tree.
    #[must_use]
    pub fn new(
        root: pallas::Base,
        election_id_hash: pallas::Base,
        count: usize,
        depth: usize,
    ) -> Self {
        Self {
            merkle_root: field_to_decimal(root),
            election_id_hash: field_to_decimal(election_id_hash),
            count,
            depth,
        }
    }

    /// Checks that a loaded artifact carries canonical values.
    ///
    /// # Errors
    /// Returns [`BallotError::MalformedInput`] if either hash field does not
    /// parse as a canonical field element.
    pub fn validate(&self) -> BallotResult<()> {
        debug!(
            "Validating tree artifact: count={}, depth={}",
            self.count, self.depth
        );

        decimal_field(&self.merkle_root, "merkleRoot")?;
        decimal_field(&self.election_id_hash, "electionIdHash")?;
        Ok(())
    }
}

/// Per-voter authentication path (`paths/<email>.json`).
///
/// Stored during the build phase and handed back at vote time; the assembler
/// replays it against the re-derived leaf before trusting anything in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathArtifact {
    /// Root of the tree this path was exported from.
    pub merkle_root: String,
    /// Election id hash the tree was built for.
    pub election_id_hash: String,
    /// Sibling values, leaf level upward, as canonical decimal strings.
    pub path_elements: Vec<String>,
    /// "0" if the node is the left child at that level, "1" if the right.
    pub path_indices: Vec<String>,
}

impl PathArtifact {
    /// Builds the artifact for one exported path.
    #[must_use]
    pub fn new(root: pallas::Base, election_id_hash: pallas::Base, path: &AuthPath) -> Self {
        Self {
            merkle_root: field_to_decimal(root),
            election_id_hash: field_to_decimal(election_id_hash),
            path_elements: path.siblings.iter().map(|s| field_to_decimal(*s)).collect(),
            path_indices: path.bits.iter().map(|b| b.to_string()).collect(),
        }
    }

    /// Validates the artifact shape against the configured depth.
    ///
    /// # Errors
    /// Returns [`BallotError::Consistency`] when either array length differs
    /// from `depth`, or [`BallotError::MalformedInput`] when a value does
    /// not parse.
    pub fn validate(&self, depth: usize) -> BallotResult<()> {
        debug!(
            "Validating path artifact: {} elements, {} indices, configured depth {}",
            self.path_elements.len(),
            self.path_indices.len(),
            depth
        );

        if self.path_elements.len() != depth {
            return Err(BallotError::consistency(format!(
                "Path has {} elements but the configured depth is {depth}",
                self.path_elements.len()
            )));
        }
        if self.path_indices.len() != depth {
            return Err(BallotError::consistency(format!(
                "Path has {} indices but the configured depth is {depth}",
                self.path_indices.len()
            )));
        }

        self.decode().map(|_| ())
    }

    /// Decodes the artifact back into field-level values.
    ///
    /// # Returns
    ///
    /// The tree root, the election id hash, and the authentication path.
    ///
    /// # Errors
    /// Returns [`BallotError::MalformedInput`] for non-canonical decimal
    /// values, indices other than "0"/"1", or mismatched array lengths.
    pub fn decode(&self) -> BallotResult<(pallas::Base, pallas::Base, AuthPath)> {
        if self.path_elements.len() != self.path_indices.len() {
            return Err(BallotError::malformed_input(format!(
                "pathElements and pathIndices lengths differ ({} vs {})",
                self.path_elements.len(),
                self.path_indices.len()
            )));
        }

        let root = decimal_field(&self.merkle_root, "merkleRoot")?;
        let election_id_hash = decimal_field(&self.election_id_hash, "electionIdHash")?;

        let mut siblings = Vec::with_capacity(self.path_elements.len());
        for (level, value) in self.path_elements.iter().enumerate() {
            siblings.push(decimal_field(value, &format!("pathElements[{level}]"))?);
        }

        let mut bits = Vec::with_capacity(self.path_indices.len());
        for (level, value) in self.path_indices.iter().enumerate() {
            match value.as_str() {
                "0" => bits.push(0),
                "1" => bits.push(1),
                other => {
                    return Err(BallotError::malformed_input(format!(
                        "pathIndices[{level}] must be \"0\" or \"1\" (got '{other}')"
                    )))
                }
            }
        }

        Ok((root, election_id_hash, AuthPath { siblings, bits }))
    }
}

/// Private witness document for the membership circuit (`vote.json`).
///
/// Contains the secret token; it stays on the voter's machine and feeds the
/// prover directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteInputs {
    pub merkle_root: String,
    pub election_id_hash: String,
    /// Ballot choice as a decimal string.
    pub choice: String,
    /// Vote-scoped nullifier, the public double-vote tag.
    pub nullifier: String,
    /// Identity commitment of the canonical voter email.
    pub from_hash: String,
    /// The voter's reduced secret token.
    pub token: String,
    pub path_elements: Vec<String>,
    pub path_indices: Vec<String>,
}

impl VoteInputs {
    /// Projects the public subset (`public.json`).
    #[must_use]
    pub fn public(&self) -> PublicInputs {
        PublicInputs {
            merkle_root: self.merkle_root.clone(),
            election_id_hash: self.election_id_hash.clone(),
            choice: self.choice.clone(),
            nullifier: self.nullifier.clone(),
        }
    }
}

/// Public inputs document (`public.json`).
///
/// Safe to publish: root, election, choice, and nullifier reveal nothing
/// about which leaf the voter holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicInputs {
    pub merkle_root: String,
    pub election_id_hash: String,
    pub choice: String,
    pub nullifier: String,
}
