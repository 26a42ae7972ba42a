//! Utility functions for hex validation, field encoding, and hashing.
//!
//! Everything that crosses into circuit territory flows through this module:
//! raw bytes are reduced into `pallas::Base` on construction, and field
//! elements are serialized as canonical decimal strings so native arithmetic
//! and circuit arithmetic agree bit for bit.

use crate::error::{BallotError, BallotResult};
use halo2_gadgets::poseidon::primitives::{
    self as poseidon, ConstantLength, P128Pow5T3 as PoseidonSpec,
};
use num_bigint::BigUint;
use pasta_curves::group::ff::PrimeField;
use pasta_curves::pallas;
use sha3::{Digest, Keccak256};

fn is_valid_hex_string(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_hexdigit())
}

fn strip_hex_prefix(input: &str) -> &str {
    input
        .trim()
        .strip_prefix("0x")
        .or_else(|| input.trim().strip_prefix("0X"))
        .unwrap_or_else(|| input.trim())
}

/// Validates and strips hex prefix from a string.
///
/// # Arguments
///
/// * `input` - The hex string to validate (may include "0x" or "0X" prefix)
/// * `expected_len` - Expected length of the hex string after stripping prefix
///
/// # Returns
///
/// The stripped hex string if valid, or an error if validation fails.
///
/// # Errors
/// Returns [`BallotError::MalformedInput`] if:
/// - The hex string has incorrect length
/// - The hex string contains non-hex characters
///
/// # Examples
///
/// ```
/// use ballot_tree::utils::validate_and_strip_hex;
///
/// let result = validate_and_strip_hex("0x1234abcd", 8).unwrap();
/// assert_eq!(result, "1234abcd");
/// ```
pub fn validate_and_strip_hex(input: &str, expected_len: usize) -> BallotResult<String> {
    let stripped = strip_hex_prefix(input);

    if stripped.len() != expected_len {
        return Err(BallotError::malformed_input(format!(
            "Invalid hex string: must be {} characters (got {})",
            expected_len,
            stripped.len()
        )));
    }

    if !is_valid_hex_string(stripped) {
        return Err(BallotError::malformed_input(
            "Invalid hex string: contains non-hex characters",
        ));
    }

    Ok(stripped.to_string())
}

const BASE_U64: u64 = 256;

/// Converts 32 bytes to a field element in the Pallas curve.
///
/// The bytes are interpreted as a big-endian 256-bit integer and reduced
/// modulo the field modulus via base-256 Horner iteration. This is the one
/// constructor through which raw integers enter the field: values at or
/// above the modulus wrap instead of erroring, so both sides of the
/// pipeline reduce identically.
///
/// # Arguments
///
/// * `bytes` - 32-byte array to convert
///
/// # Returns
///
/// Field element in the Pallas curve
#[inline]
#[must_use]
pub fn bytes_to_field(bytes: &[u8; 32]) -> pallas::Base {
    let mut value = pallas::Base::zero();
    let base = pallas::Base::from(BASE_U64);

    for &byte in bytes.iter() {
        value = value * base + pallas::Base::from(byte as u64);
    }

    value
}

/// Folds a UTF-8 string into a field element.
///
/// Computes Keccak-256 over the string bytes and reduces the digest with
/// [`bytes_to_field`]. Used for both canonical emails and election ids.
///
/// # Arguments
///
/// * `input` - String to fold
///
/// # Returns
///
/// Field element derived from the Keccak-256 digest
#[must_use]
pub fn keccak_field(input: &str) -> pallas::Base {
    let digest: [u8; 32] = Keccak256::digest(input.as_bytes()).into();
    bytes_to_field(&digest)
}

/// Serializes a field element as a canonical decimal string.
///
/// The output has no sign, no leading zeros, and is always below the field
/// modulus, matching what the membership circuit expects as witness text.
///
/// # Examples
///
/// ```
/// use ballot_tree::utils::field_to_decimal;
/// use pasta_curves::pallas;
///
/// assert_eq!(field_to_decimal(pallas::Base::from(42)), "42");
/// ```
#[must_use]
pub fn field_to_decimal(field: pallas::Base) -> String {
    BigUint::from_bytes_le(field.to_repr().as_ref()).to_str_radix(10)
}

/// Parses a canonical decimal string back into a field element.
///
/// This is the strict inverse of [`field_to_decimal`] for the artifact
/// boundary: values must already be canonical. Use [`bytes_to_field`] when
/// reduction is wanted instead.
///
/// # Errors
/// Returns [`BallotError::MalformedInput`] if:
/// - The string is empty or contains non-digit characters
/// - The string has leading zeros
/// - The value is not below the field modulus
pub fn field_from_decimal(input: &str) -> BallotResult<pallas::Base> {
    // `BigUint::parse_bytes` tolerates `+` signs and `_` separators, so
    // canonical form is enforced before parsing.
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BallotError::malformed_input(format!(
            "Invalid decimal value: '{input}'"
        )));
    }
    if input.len() > 1 && input.starts_with('0') {
        return Err(BallotError::malformed_input(format!(
            "Non-canonical decimal value: leading zeros in '{input}'"
        )));
    }

    let value = BigUint::parse_bytes(input.as_bytes(), 10).ok_or_else(|| {
        BallotError::malformed_input(format!("Invalid decimal value: '{input}'"))
    })?;

    let bytes = value.to_bytes_le();
    if bytes.len() > 32 {
        return Err(BallotError::malformed_input(format!(
            "Decimal value out of field range: '{input}'"
        )));
    }

    let mut repr = [0u8; 32];
    repr[..bytes.len()].copy_from_slice(&bytes);

    Option::from(pallas::Base::from_repr(repr)).ok_or_else(|| {
        BallotError::malformed_input(format!(
            "Decimal value is not a canonical field element: '{input}'"
        ))
    })
}

/// Poseidon hash of a single field element using `P128Pow5T3`.
///
/// `ConstantLength` domain-separates by input count, so this never aliases
/// [`hash_pair`] or [`hash_three`].
#[inline]
#[must_use]
pub fn hash_one(input: pallas::Base) -> pallas::Base {
    poseidon::Hash::<_, PoseidonSpec, ConstantLength<1>, 3, 2>::init().hash([input])
}

/// Poseidon hash of two field elements using `P128Pow5T3` specification.
///
/// This is the tree-node hash: every Merkle layer combines children with it,
/// and the nullifier is derived with it.
///
/// # Arguments
///
/// * `left` - First field element to hash
/// * `right` - Second field element to hash
///
/// # Returns
///
/// The Poseidon hash of the two field elements
///
/// # Example
///
/// ```
/// use ballot_tree::utils::hash_pair;
/// use pasta_curves::pallas;
///
/// let left = pallas::Base::from(1);
/// let right = pallas::Base::from(2);
/// let hash = hash_pair(left, right);
/// ```
#[inline]
#[must_use]
pub fn hash_pair(left: pallas::Base, right: pallas::Base) -> pallas::Base {
    let inputs = [left, right];
    poseidon::Hash::<_, PoseidonSpec, ConstantLength<2>, 3, 2>::init().hash(inputs)
}

/// Poseidon hash of three field elements using `P128Pow5T3`.
///
/// This is the leaf-commitment hash.
#[inline]
#[must_use]
pub fn hash_three(a: pallas::Base, b: pallas::Base, c: pallas::Base) -> pallas::Base {
    poseidon::Hash::<_, PoseidonSpec, ConstantLength<3>, 3, 2>::init().hash([a, b, c])
}

#[cfg(test)]
mod tests {
    use super::*;

    // Pallas base field modulus, decimal.
    const MODULUS_DEC: &str =
        "28948022309329048855892746252171976963363056481941560715954676764349967630337";

    #[test]
    fn test_validate_and_strip_hex_valid() {
        let result = validate_and_strip_hex("0x1234abcd", 8);
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "1234abcd");
    }

    #[test]
    fn test_validate_and_strip_hex_uppercase_prefix() {
        let result = validate_and_strip_hex("0X1234ABCD", 8);
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "1234ABCD");
    }

    #[test]
    fn test_validate_and_strip_hex_with_whitespace() {
        let result = validate_and_strip_hex("  0x1234abcd  ", 8);
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "1234abcd");
    }

    #[test]
    fn test_validate_and_strip_hex_wrong_length() {
        let result = validate_and_strip_hex("0x1234abcd", 10);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("must be 10 characters"));
    }

    #[test]
    fn test_validate_and_strip_hex_invalid_characters() {
        let result = validate_and_strip_hex("0x1234xyzw", 8);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("non-hex characters"));
    }

    #[test]
    fn test_bytes_to_field_zero() {
        assert_eq!(bytes_to_field(&[0u8; 32]), pallas::Base::zero());
    }

    #[test]
    fn test_bytes_to_field_big_endian() {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        assert_eq!(bytes_to_field(&bytes), pallas::Base::from(1));

        bytes[31] = 0;
        bytes[30] = 1;
        assert_eq!(bytes_to_field(&bytes), pallas::Base::from(256));
    }

    #[test]
    fn test_bytes_to_field_reduces_instead_of_erroring() {
        // 2^256 - 1 is far above the modulus; the constructor must wrap.
        let all_ones = bytes_to_field(&[0xFFu8; 32]);
        let again = bytes_to_field(&[0xFFu8; 32]);
        assert_eq!(all_ones, again);
    }

    #[test]
    fn test_field_to_decimal_small_values() {
        assert_eq!(field_to_decimal(pallas::Base::zero()), "0");
        assert_eq!(field_to_decimal(pallas::Base::from(1)), "1");
        assert_eq!(field_to_decimal(pallas::Base::from(12345)), "12345");
    }

    #[test]
    fn test_field_from_decimal_roundtrip() {
        let field = pallas::Base::from(987654321);
        let decimal = field_to_decimal(field);
        assert_eq!(field_from_decimal(&decimal).unwrap(), field);
    }

    #[test]
    fn test_field_from_decimal_rejects_garbage() {
        assert!(field_from_decimal("").is_err());
        assert!(field_from_decimal("12a").is_err());
        assert!(field_from_decimal("-5").is_err());
    }

    #[test]
    fn test_field_from_decimal_rejects_lenient_biguint_forms() {
        // `BigUint::parse_bytes` alone would accept every one of these.
        assert!(field_from_decimal("+5").is_err());
        assert!(field_from_decimal("1_0").is_err());
        assert!(field_from_decimal("007").is_err());
    }

    #[test]
    fn test_field_from_decimal_zero_is_canonical() {
        // Padded trees serialize zero siblings as "0"; only that form parses.
        assert_eq!(field_from_decimal("0").unwrap(), pallas::Base::zero());
        assert!(field_from_decimal("00").is_err());
    }

    #[test]
    fn test_field_from_decimal_rejects_non_canonical() {
        // The modulus itself is the smallest non-canonical value.
        assert!(field_from_decimal(MODULUS_DEC).is_err());

        let way_too_big = "9".repeat(100);
        assert!(field_from_decimal(&way_too_big).is_err());
    }

    #[test]
    fn test_field_from_decimal_accepts_modulus_minus_one() {
        let max = "28948022309329048855892746252171976963363056481941560715954676764349967630336";
        let field = field_from_decimal(max).unwrap();
        assert_eq!(field_to_decimal(field), max);
    }

    #[test]
    fn test_keccak_field_deterministic() {
        assert_eq!(keccak_field("alice@example.com"), keccak_field("alice@example.com"));
        assert_ne!(keccak_field("alice@example.com"), keccak_field("bob@example.com"));
    }

    #[test]
    fn test_hash_pair_deterministic_and_order_sensitive() {
        let a = pallas::Base::from(1);
        let b = pallas::Base::from(2);
        assert_eq!(hash_pair(a, b), hash_pair(a, b));
        assert_ne!(hash_pair(a, b), hash_pair(b, a));
    }

    #[test]
    fn test_hash_arities_do_not_alias() {
        let a = pallas::Base::from(7);
        let b = pallas::Base::from(11);
        assert_ne!(hash_one(a), a);
        assert_ne!(hash_pair(a, b), hash_three(a, b, pallas::Base::zero()));
    }
}
