//! Vote-input assembly: re-derivation, consistency checks, and the
//! reply-channel integrity gate.
//!
//! The build phase and the vote phase never share state beyond the stored
//! artifacts, so everything the voter submits is re-derived here and checked
//! against what the tree actually committed to before any witness document
//! is produced.

use crate::allowlist::{canonicalize_email, token_to_field, TOKEN_HEX_LENGTH};
use crate::commitment::{derive_leaf, derive_nullifier, email_hash};
use crate::election::derive_election_id;
use crate::error::{BallotError, BallotResult};
use crate::store::PathStore;
use crate::types::{PathArtifact, PublicInputs, VoteInputs};
use crate::utils::field_to_decimal;
use log::debug;

/// What the ingestion layer hands over for one ballot.
#[derive(Debug, Clone)]
pub struct VoteRequest {
    /// Election id text, exactly as issued.
    pub election_id: String,
    /// Voter email; canonicalized before any use.
    pub email: String,
    /// The voter's secret token as 64 hex characters.
    pub token_hex: String,
    /// Ballot choice.
    pub choice: u64,
    /// Visible reply-channel text, if the ballot came in over one.
    pub reply_body: Option<String>,
}

/// Assembled circuit inputs: the private witness document plus its public
/// projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitInputs {
    pub vote: VoteInputs,
    pub public: PublicInputs,
}

// The invitation labels the secret as "Token: <64 hex>". Any echo of that
// label followed by a full-length hex run, or of the request's own token
// value, disqualifies the reply.
fn reply_leaks_token(reply: &str, token_hex: &str) -> bool {
    let reply_lower = reply.to_lowercase();

    let token_lower = token_hex.trim().to_lowercase();
    let token_bare = token_lower.strip_prefix("0x").unwrap_or(&token_lower);
    if token_bare.len() == TOKEN_HEX_LENGTH && reply_lower.contains(token_bare) {
        return true;
    }

    for (pos, _) in reply_lower.match_indices("token:") {
        let rest = reply_lower[pos + 6..].trim_start();
        let run = rest.chars().take_while(|c| c.is_ascii_hexdigit()).count();
        let boundary_ok = rest
            .chars()
            .nth(run)
            .map_or(true, |c| !c.is_ascii_alphanumeric());
        if run == TOKEN_HEX_LENGTH && boundary_ok {
            return true;
        }
    }

    false
}

fn check_reply(request: &VoteRequest) -> BallotResult<()> {
    if let Some(reply) = &request.reply_body {
        if reply_leaks_token(reply, &request.token_hex) {
            return Err(BallotError::integrity_violation(
                "Reply contains raw token material; ballots must never echo the secret",
            ));
        }
    }
    Ok(())
}

/// Assembles the circuit input documents for one ballot.
///
/// `stored` is the voter's path artifact from the build phase and `depth` is
/// the deployment's configured tree depth. Checks run in a fixed order and
/// the first failure aborts the whole assembly:
///
/// 1. The reply channel is scanned for raw token material. A hit rejects
///    the ballot regardless of every other field being valid.
/// 2. Credentials are canonicalized and validated.
/// 3. The stored artifact is validated against `depth` and decoded.
/// 4. The recomputed election id hash must match the stored one.
/// 5. The re-derived leaf must reconnect to the stored root through the
///    stored path.
///
/// # Errors
/// Returns [`BallotError::IntegrityViolation`] for a leaking reply,
/// [`BallotError::MalformedInput`] for invalid credentials or artifact
/// values, and [`BallotError::Consistency`] for election or path mismatches.
pub fn assemble(
    request: &VoteRequest,
    stored: &PathArtifact,
    depth: usize,
) -> BallotResult<CircuitInputs> {
    check_reply(request)?;

    let canonical_email = canonicalize_email(&request.email);
    if canonical_email.is_empty() {
        return Err(BallotError::malformed_input(
            "Voter email is empty after canonicalization",
        ));
    }
    let token = token_to_field(&request.token_hex)?;

    stored.validate(depth)?;
    let (stored_root, stored_election, path) = stored.decode()?;

    let election_id_hash = derive_election_id(&request.election_id);
    if election_id_hash != stored_election {
        return Err(BallotError::consistency(format!(
            "Election id hash mismatch: credentials name '{}' but the stored path belongs to a different election",
            request.election_id
        )));
    }

    let from_hash = email_hash(&canonical_email)?;
    let leaf = derive_leaf(from_hash, token, election_id_hash);

    if path.recombine(leaf) != stored_root {
        return Err(BallotError::consistency(
            "Stored path does not reconnect the re-derived leaf to the stored root",
        ));
    }

    let nullifier = derive_nullifier(election_id_hash, token);
    debug!(
        "Assembled circuit inputs: choice={}, nullifier={}",
        request.choice,
        field_to_decimal(nullifier)
    );

    let vote = VoteInputs {
        merkle_root: field_to_decimal(stored_root),
        election_id_hash: field_to_decimal(election_id_hash),
        choice: request.choice.to_string(),
        nullifier: field_to_decimal(nullifier),
        from_hash: field_to_decimal(from_hash),
        token: field_to_decimal(token),
        path_elements: path.siblings.iter().map(|s| field_to_decimal(*s)).collect(),
        path_indices: path.bits.iter().map(|b| b.to_string()).collect(),
    };
    let public = vote.public();

    Ok(CircuitInputs { vote, public })
}

/// Loads the voter's stored path document and assembles the circuit inputs.
///
/// The reply scan runs before the store lookup: a leaking reply is refused
/// even when no artifact exists for the voter.
///
/// # Errors
/// Returns [`BallotError::IntegrityViolation`] for a leaking reply,
/// [`BallotError::MissingArtifact`] when the store holds no document for the
/// email, and every error [`assemble`] itself returns.
pub fn assemble_from_store(
    request: &VoteRequest,
    store: &PathStore,
    depth: usize,
) -> BallotResult<CircuitInputs> {
    check_reply(request)?;
    let stored = store.load(&request.email)?;
    assemble(request, &stored, depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowlist::AllowlistEntry;
    use crate::election::Election;
    use crate::pipeline::build_tree;

    const TOKEN_ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";
    const OTHER_TOKEN: &str = "00000000000000000000000000000000000000000000000000000000000000ff";

    fn fixture() -> (VoteRequest, PathArtifact) {
        let election = Election::new("EID-TEST");
        let entries = vec![AllowlistEntry::new("alice@example.com", TOKEN_ONE).unwrap()];
        let build = build_tree(&entries, &election, 4).unwrap();

        let request = VoteRequest {
            election_id: "EID-TEST".to_string(),
            email: " Alice@Example.com".to_string(),
            token_hex: TOKEN_ONE.to_string(),
            choice: 2,
            reply_body: None,
        };

        (request, build.paths[0].artifact.clone())
    }

    #[test]
    fn test_assemble_happy_path() {
        let (request, stored) = fixture();
        let inputs = assemble(&request, &stored, 4).unwrap();

        assert_eq!(inputs.vote.token, "1");
        assert_eq!(inputs.vote.choice, "2");
        assert_eq!(inputs.vote.merkle_root, stored.merkle_root);
        assert_eq!(inputs.vote.path_elements.len(), 4);
        assert_eq!(inputs.public, inputs.vote.public());

        let eid = derive_election_id("EID-TEST");
        let expected = derive_nullifier(eid, pasta_curves::pallas::Base::from(1));
        assert_eq!(inputs.vote.nullifier, field_to_decimal(expected));
    }

    #[test]
    fn test_assemble_accepts_benign_reply() {
        let (mut request, stored) = fixture();
        request.reply_body = Some("I vote for option 2. Thanks!".to_string());
        assert!(assemble(&request, &stored, 4).is_ok());
    }

    #[test]
    fn test_wrong_election_is_consistency_error() {
        let (mut request, stored) = fixture();
        request.election_id = "EID-OTHER".to_string();

        let result = assemble(&request, &stored, 4);
        assert!(matches!(result, Err(BallotError::Consistency(_))));
    }

    #[test]
    fn test_wrong_token_fails_path_replay() {
        let (mut request, stored) = fixture();
        request.token_hex = OTHER_TOKEN.to_string();

        let result = assemble(&request, &stored, 4);
        assert!(matches!(result, Err(BallotError::Consistency(_))));
    }

    #[test]
    fn test_wrong_email_fails_path_replay() {
        let (mut request, stored) = fixture();
        request.email = "bob@example.com".to_string();

        let result = assemble(&request, &stored, 4);
        assert!(matches!(result, Err(BallotError::Consistency(_))));
    }

    #[test]
    fn test_truncated_path_is_consistency_error() {
        let (request, mut stored) = fixture();
        stored.path_elements.pop();
        stored.path_indices.pop();

        let result = assemble(&request, &stored, 4);
        assert!(matches!(result, Err(BallotError::Consistency(_))));
    }

    #[test]
    fn test_corrupted_sibling_fails_replay() {
        let (request, mut stored) = fixture();
        // A valid decimal that is not the real sibling: only the replay
        // check can catch this.
        stored.path_elements[2] = "12345".to_string();

        let result = assemble(&request, &stored, 4);
        assert!(matches!(result, Err(BallotError::Consistency(_))));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let (mut request, stored) = fixture();
        request.token_hex = "beef".to_string();

        let result = assemble(&request, &stored, 4);
        assert!(matches!(result, Err(BallotError::MalformedInput(_))));
    }

    #[test]
    fn test_empty_email_rejected() {
        let (mut request, stored) = fixture();
        request.email = "   ".to_string();

        let result = assemble(&request, &stored, 4);
        assert!(matches!(result, Err(BallotError::MalformedInput(_))));
    }

    #[test]
    fn test_reply_with_labeled_token_is_integrity_violation() {
        let (mut request, stored) = fixture();
        request.reply_body = Some(format!(
            "My ballot:\n\nToken: {OTHER_TOKEN}\n\nI vote for 1."
        ));

        let result = assemble(&request, &stored, 4);
        assert!(matches!(result, Err(BallotError::IntegrityViolation(_))));
    }

    #[test]
    fn test_reply_with_own_token_verbatim_is_integrity_violation() {
        let (mut request, stored) = fixture();
        request.reply_body = Some(format!("fyi {TOKEN_ONE} is my code, choice 0"));

        let result = assemble(&request, &stored, 4);
        assert!(matches!(result, Err(BallotError::IntegrityViolation(_))));
    }

    #[test]
    fn test_integrity_scan_runs_before_everything_else() {
        // Both the token and the artifact are broken, but the leaking reply
        // must win.
        let (mut request, mut stored) = fixture();
        request.token_hex = "zzzz".to_string();
        stored.path_elements.clear();
        request.reply_body = Some(format!("Token: {OTHER_TOKEN}"));

        let result = assemble(&request, &stored, 4);
        assert!(matches!(result, Err(BallotError::IntegrityViolation(_))));
    }

    #[test]
    fn test_reply_scan_hex_run_boundaries() {
        let sixty_three = "a".repeat(63);
        let sixty_five = "a".repeat(65);

        assert!(reply_leaks_token(&format!("Token: {OTHER_TOKEN}"), TOKEN_ONE));
        assert!(reply_leaks_token(&format!("token:{OTHER_TOKEN}"), TOKEN_ONE));
        assert!(!reply_leaks_token(&format!("Token: {sixty_three}"), TOKEN_ONE));
        assert!(!reply_leaks_token(&format!("Token: {sixty_five}"), TOKEN_ONE));
        assert!(!reply_leaks_token("Token: not hex at all", TOKEN_ONE));
        assert!(!reply_leaks_token("I vote for 2", TOKEN_ONE));
    }
}
