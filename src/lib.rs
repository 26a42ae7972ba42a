//! Ballot Tree Core
//!
//! This library builds the anonymous voting commitment tree for one election
//! and assembles the matching zero-knowledge circuit inputs for one ballot,
//! without the two phases sharing anything beyond stored artifacts.
//!
//! # Components
//!
//! - [`CommitmentTree`]: Fixed-depth binary Merkle tree over voter commitments
//! - [`AuthPath`]: Authentication path proving one leaf's inclusion
//! - [`AllowlistEntry`]: One parsed allowlist row (canonical email plus token)
//! - [`build_tree`]: Build-phase pipeline from entries to exported artifacts
//! - [`assemble`]: Vote-phase re-derivation and cross-check into circuit inputs
//! - [`PathStore`]: Per-voter path artifact directory
//!
//! # Example
//!
//! ```no_run
//! use ballot_tree::{merkle::CommitmentTree, pipeline::build_tree, TREE_DEPTH};
//! ```

pub mod allowlist;
pub mod assembler;
pub mod commitment;
pub mod config;
pub mod election;
pub mod error;
pub mod merkle;
pub mod pipeline;
pub mod store;
pub mod types;
pub mod utils;


pub use allowlist::{parse_allowlist, AllowlistEntry};
pub use assembler::{assemble, assemble_from_store, CircuitInputs, VoteRequest};
pub use config::Config;
pub use election::Election;
pub use error::{BallotError, BallotResult};
pub use merkle::{AuthPath, CommitmentTree};
pub use pipeline::{build_tree, TreeBuild, VoterPath};
pub use store::PathStore;
pub use types::{PathArtifact, PublicInputs, TreeArtifact, VoteInputs};
pub use utils::{bytes_to_field, field_to_decimal, keccak_field};

/// Default Merkle tree depth for ballot commitment trees.
///
/// The value `16` creates a tree with 2^16 = 65536 leaf slots, which covers
/// any allowlist up to 65536 voters once padding leaves fill the remainder.
///
/// # Security Considerations
///
/// The depth is baked into every artifact: stored auth paths carry exactly
/// this many elements, and the membership circuit is compiled for the same
/// length. Changing the depth invalidates all stored paths, so the circuit
/// and the artifacts must be regenerated together.
///
/// # Performance Trade-offs
///
/// If your allowlist does not fit:
/// - Increase the depth by one to double the capacity
/// - Each extra level adds one hash to every path replay and one layer to
///   the build
///
/// - Larger depths grow the build cost linearly in capacity
/// - Smaller depths build faster but cap the allowlist size
pub const TREE_DEPTH: usize = 16;
