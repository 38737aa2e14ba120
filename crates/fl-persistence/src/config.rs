//! Environment-derived defaults for a run, loaded once per process.
//! CLI flags always take precedence; these are the fallbacks when a flag is
//! omitted, mirroring the rest of this workspace's `.env` + env-var
//! convention.

use once_cell::sync::Lazy;

pub const DEFAULT_SEED: u64 = 1337;
pub const DEFAULT_MEMORY_PATH: &str = "memory_bank.json";

pub struct EnvDefaults {
    pub seed: u64,
    pub memory_path: String,
}

static ENV_DEFAULTS: Lazy<EnvDefaults> = Lazy::new(|| {
    let _ = dotenvy::dotenv();
    let seed = std::env::var("FAULTLINE_SEED")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_SEED);
    let memory_path = std::env::var("FAULTLINE_MEMORY_PATH").unwrap_or_else(|_| DEFAULT_MEMORY_PATH.to_string());
    EnvDefaults { seed, memory_path }
});

pub fn env_defaults() -> &'static EnvDefaults {
    &ENV_DEFAULTS
}
