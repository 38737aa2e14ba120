//! Hashing and canonical-JSON helpers.
//!
//! Deterministic replay depends on stable serialisation: `to_canonical_json`
//! guarantees a stable key order for JSON objects, and `hash_str`/`hash_value`
//! turn that into stable identifiers for state snapshots and fault
//! signatures. `seeded_u64`/`seeded_unit` are the engine's sole source of
//! "randomness"; everything derives from the process seed instead of `rand`.

pub mod canonical_json;
pub mod hash;

pub use canonical_json::to_canonical_json;
pub use hash::{hash_str, hash_value, seeded_u64, seeded_unit};
