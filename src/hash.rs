//! The rolling 32-bit polynomial hash behind fingerprint tokens.
//!
//! The hash is deliberately simple: `hash = hash * 31 + codepoint`, wrapped
//! to the signed 32-bit range at every step. It is not cryptographic; the
//! only requirements are stability across processes and reimplementations,
//! and enough spread that distinct feature strings rarely collide in
//! practice.

use crate::types::ContentType;

/// Hash a string to a signed 32-bit integer.
///
/// Iterates Unicode code points and accumulates `hash * 31 + codepoint`
/// with wrapping arithmetic. The empty string hashes to `0`.
pub fn token_hash(input: &str) -> i32 {
    let mut hash: i32 = 0;
    for ch in input.chars() {
        hash = hash.wrapping_mul(31).wrapping_add(ch as u32 as i32);
    }
    hash
}

/// Render a hash as a fingerprint token: the uppercase content-type prefix,
/// an underscore, and the absolute hash value as uppercase hex.
///
/// A 32-bit value is at most 8 hex digits; the 16-character ceiling exists
/// so the token format survives a future widening of the hash.
pub fn format_token(content_type: ContentType, hash: i32) -> String {
    let hex = format!("{:X}", hash.unsigned_abs());
    let truncated = &hex[..hex.len().min(16)];
    format!("{}_{}", content_type.token_prefix(), truncated)
}
