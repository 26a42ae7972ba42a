//! Error types for the ballot commitment pipeline.

use thiserror::Error;

/// Errors that can occur while building the commitment tree or assembling
/// circuit inputs.
///
/// Every variant is fatal for the operation that raised it: the pipeline
/// aborts and no artifact is (partially) published.
#[derive(Debug, Error)]
pub enum BallotError {
    /// Input that can never be processed: bad token encoding, empty
    /// canonical email, duplicate allowlist rows, unparseable artifact values
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Artifacts or credentials that are individually well formed but
    /// disagree with each other: election hash mismatch, path length not
    /// equal to the tree depth, a path that does not reconnect to the root
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// No stored path artifact for a voter's canonical email
    #[error("Missing artifact: no stored path for '{0}'")]
    MissingArtifact(String),

    /// The reply channel carried raw token material
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    /// More eligibility entries than a fixed-depth tree can hold
    #[error("Capacity exceeded: {count} entries, but a depth-{depth} tree holds at most {capacity}")]
    CapacityExceeded {
        count: usize,
        depth: usize,
        capacity: usize,
    },

    /// Underlying I/O failure at the artifact boundary
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact JSON could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias used throughout the library.
pub type BallotResult<T> = std::result::Result<T, BallotError>;

impl BallotError {
    /// Create a malformed input error
    pub fn malformed_input<S: Into<String>>(msg: S) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Create a consistency error
    pub fn consistency<S: Into<String>>(msg: S) -> Self {
        Self::Consistency(msg.into())
    }

    /// Create an integrity violation error
    pub fn integrity_violation<S: Into<String>>(msg: S) -> Self {
        Self::IntegrityViolation(msg.into())
    }
}
