//! Deterministic content digests (versioned).
//!
//! Deduplication needs a stable identity for structured values: two
//! `text_refs` objects that are structurally equal must map to the same doc.
//! We use a **simple, deterministic, non-cryptographic** digest:
//!
//! - algorithm: **FNV-1a 64-bit**
//! - input: the canonical JSON serialization of the value
//! - output: `"fnv1a64:<16 lowercase hex digits>"`
//!
//! `serde_json` keeps object keys sorted (the `preserve_order` feature is
//! not enabled anywhere in this workspace), so serializing a `Value` is
//! already canonical: two objects differing only in key order digest
//! identically.
//!
//! This digest is **not** a security primitive; it is a stability/identity
//! tool for in-batch deduplication.

use serde_json::Value;

/// Prefix used in serialized digests.
pub const DIGEST_V1_PREFIX: &str = "fnv1a64:";

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x00000100000001b3;

/// Compute a v1 digest (FNV-1a 64-bit) over arbitrary bytes.
pub fn fnv1a64_digest_bytes(bytes: &[u8]) -> String {
    let mut hash = FNV_OFFSET_BASIS;
    for b in bytes {
        hash ^= (*b) as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    format!("{DIGEST_V1_PREFIX}{hash:016x}")
}

/// Structural-identity key for a JSON value.
pub fn value_digest_v1(value: &Value) -> String {
    fnv1a64_digest_bytes(value.to_string().as_bytes())
}
