//! Leaf commitment and nullifier derivation.
//!
//! A leaf binds voter identity, secret token, and election into one field
//! element; the nullifier binds only token and election, so publishing it
//! tags a spent ballot without pointing back at the voter.

use crate::allowlist::canonicalize_email;
use crate::error::{BallotError, BallotResult};
use crate::utils::{hash_one, hash_pair, hash_three, keccak_field};
use pasta_curves::pallas;

/// Derives the identity commitment for a voter email.
///
/// Canonicalizes the email and folds it into the field. This value appears
/// as `fromHash` in the private vote document.
///
/// # Errors
///
/// Returns [`BallotError::MalformedInput`] if the email is empty after
/// canonicalization.
pub fn email_hash(email: &str) -> BallotResult<pallas::Base> {
    let canonical = canonicalize_email(email);
    if canonical.is_empty() {
        return Err(BallotError::malformed_input(
            "Voter email is empty after canonicalization",
        ));
    }

    Ok(hash_one(keccak_field(&canonical)))
}

/// Derives the leaf commitment for one eligible voter.
///
/// # Arguments
///
/// * `email_hash` - Identity commitment from [`email_hash`]
/// * `token` - The voter's reduced secret token
/// * `election_id_hash` - Election id hash from
///   [`derive_election_id`](crate::election::derive_election_id)
#[inline]
#[must_use]
pub fn derive_leaf(
    email_hash: pallas::Base,
    token: pallas::Base,
    election_id_hash: pallas::Base,
) -> pallas::Base {
    hash_three(email_hash, token, election_id_hash)
}

/// Derives the vote-scoped nullifier.
///
/// The email does not participate: one token in one election yields exactly
/// one nullifier, derivable by anyone holding the token and the election id.
#[inline]
#[must_use]
pub fn derive_nullifier(election_id_hash: pallas::Base, token: pallas::Base) -> pallas::Base {
    hash_pair(election_id_hash, token)
}
