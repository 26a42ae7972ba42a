//! Allowlist boundary: canonical emails and voter tokens.
//!
//! The eligibility set arrives as a minimal `email,token` CSV. This module
//! canonicalizes emails the same way on both sides of the pipeline,
//! validates and reduces tokens, and rejects rows that would corrupt the
//! tree (duplicates, empty identities).

use crate::error::{BallotError, BallotResult};
use crate::utils::{bytes_to_field, validate_and_strip_hex};
use pasta_curves::group::ff::PrimeField;
use pasta_curves::pallas;
use std::collections::HashSet;

/// Expected length of a voter token in hex characters (excluding 0x prefix).
/// Tokens are 32 bytes = 64 hex characters.
pub const TOKEN_HEX_LENGTH: usize = 64;

/// Canonicalizes a voter email: trim plus lowercase.
///
/// Applied identically wherever an email enters the pipeline, so the build
/// side and the vote side always hash the same identity text.
///
/// # Examples
///
/// ```
/// use ballot_tree::allowlist::canonicalize_email;
///
/// assert_eq!(canonicalize_email("  Alice@Example.COM "), "alice@example.com");
/// ```
#[must_use]
pub fn canonicalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates a voter token and reduces it into the field.
///
/// Tokens are sampled uniformly from 256 bits, so values at or above the
/// field modulus are common; they reduce here, once, and every later use
/// sees the reduced element.
///
/// # Arguments
///
/// * `token_hex` - The token as a hex string (with or without 0x prefix)
///
/// # Errors
///
/// Returns [`BallotError::MalformedInput`] if the token is not exactly
/// 64 hex characters after prefix stripping.
pub fn token_to_field(token_hex: &str) -> BallotResult<pallas::Base> {
    let stripped = validate_and_strip_hex(token_hex, TOKEN_HEX_LENGTH)?;

    let bytes = hex::decode(&stripped)
        .map_err(|e| BallotError::malformed_input(format!("Invalid token hex: {e}")))?;
    let array: [u8; 32] = bytes
        .try_into()
        .map_err(|_| BallotError::malformed_input("Token must decode to exactly 32 bytes"))?;

    Ok(bytes_to_field(&array))
}

/// One eligibility record: a canonical email and the voter's reduced token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowlistEntry {
    pub email: String,
    pub token: pallas::Base,
}

impl AllowlistEntry {
    /// Create an entry from raw boundary values.
    ///
    /// # Errors
    ///
    /// Returns [`BallotError::MalformedInput`] if the email is empty after
    /// canonicalization or the token is not a well-formed 256-bit hex string.
    pub fn new(email: &str, token_hex: &str) -> BallotResult<Self> {
        let canonical = canonicalize_email(email);
        if canonical.is_empty() {
            return Err(BallotError::malformed_input(
                "Voter email is empty after canonicalization",
            ));
        }

        let token = token_to_field(token_hex)?;

        Ok(Self {
            email: canonical,
            token,
        })
    }
}

fn with_line<T>(result: BallotResult<T>, line_no: usize) -> BallotResult<T> {
    result.map_err(|e| match e {
        BallotError::MalformedInput(msg) => {
            BallotError::MalformedInput(format!("Line {line_no}: {msg}"))
        }
        other => other,
    })
}

/// Parses the `email,token` CSV boundary format.
///
/// The first non-blank line must be the `email,token` header. Cells are
/// trimmed, blank lines are skipped, and row errors carry the 1-based file
/// line number.
///
/// # Errors
///
/// Returns [`BallotError::MalformedInput`] for a missing or wrong header, a
/// row without exactly two cells, an invalid email or token, a duplicate
/// canonical email, or a duplicate token value. Duplicate tokens would
/// collide nullifiers and duplicate emails would collide stored-path keys,
/// so both reject the whole file.
pub fn parse_allowlist(content: &str) -> BallotResult<Vec<AllowlistEntry>> {
    let mut lines = content.lines().enumerate();

    let header = loop {
        match lines.next() {
            Some((_, line)) if line.trim().is_empty() => continue,
            Some((_, line)) => break line,
            None => return Err(BallotError::malformed_input("Allowlist is empty")),
        }
    };

    let normalized_header = header
        .split(',')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(",")
        .to_lowercase();
    if normalized_header != "email,token" {
        return Err(BallotError::malformed_input(format!(
            "Allowlist must start with an 'email,token' header (got '{}')",
            header.trim()
        )));
    }

    let mut entries = Vec::new();
    let mut seen_emails: HashSet<String> = HashSet::new();
    let mut seen_tokens: HashSet<[u8; 32]> = HashSet::new();

    for (idx, line) in lines {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let mut cells = line.split(',');
        let (email, token_hex) = match (cells.next(), cells.next(), cells.next()) {
            (Some(email), Some(token), None) => (email, token),
            _ => {
                return Err(BallotError::malformed_input(format!(
                    "Line {line_no}: expected exactly two cells 'email,token'"
                )))
            }
        };

        let entry = with_line(AllowlistEntry::new(email, token_hex), line_no)?;

        if !seen_emails.insert(entry.email.clone()) {
            return Err(BallotError::malformed_input(format!(
                "Line {line_no}: duplicate email '{}'",
                entry.email
            )));
        }
        // Token values are secret; the message never echoes them.
        if !seen_tokens.insert(entry.token.to_repr()) {
            return Err(BallotError::malformed_input(format!(
                "Line {line_no}: duplicate token (matches an earlier row)"
            )));
        }

        entries.push(entry);
    }

    Ok(entries)
}
