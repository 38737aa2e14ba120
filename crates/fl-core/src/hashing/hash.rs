//! Hash helpers – the digest algorithm is encapsulated here so the rest of
//! the engine never depends on blake3 directly.
//!
//! BLAKE3 is used for its speed and because its 256-bit digest matches the
//! "256-bit content hash" the world-state checkpoint invariant calls for.

use crate::hashing::to_canonical_json;
use blake3::Hasher;
use serde_json::Value;

/// Hashes a string and returns its hex digest.
pub fn hash_str(input: &str) -> String {
    let mut h = Hasher::new();
    h.update(input.as_bytes());
    h.finalize().to_hex().to_string()
}

/// Hashes a JSON value after canonicalising it.
pub fn hash_value(v: &Value) -> String {
    hash_str(&to_canonical_json(v))
}

/// Derives a `u64` deterministically from an arbitrary list of parts, keyed
/// by a process-wide seed. Every randomised decision in the engine (fault
/// firing, latency sampling, noise taps) goes through this function instead
/// of `rand`, so a fixed seed reproduces a run byte-for-byte.
pub fn seeded_u64(seed: u64, parts: &[&str]) -> u64 {
    let mut h = Hasher::new();
    h.update(&seed.to_le_bytes());
    for p in parts {
        h.update(b"\0");
        h.update(p.as_bytes());
    }
    let digest = h.finalize();
    let bytes = digest.as_bytes();
    u64::from_le_bytes(bytes[0..8].try_into().unwrap())
}

/// Derives a deterministic float in `[0, 1)` from the same input space as
/// [`seeded_u64`], for Bernoulli-trial style decisions (fault probability,
/// noise taps).
pub fn seeded_unit(seed: u64, parts: &[&str]) -> f64 {
    (seeded_u64(seed, parts) as f64) / (u64::MAX as f64)
}
