//! Genesis config loader using TOML and serde.
//! Describes the initial token distribution and governance parameters.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default quorum: 50% dari total locked weight (basis points).
pub const DEFAULT_QUORUM_BPS: u32 = 5_000;
/// Default panjang voting window (blocks).
pub const DEFAULT_VOTE_LENGTH: u64 = 2_000;
/// Default minimum lock length (blocks).
pub const DEFAULT_LOCK_MIN_LENGTH: u64 = 5;
/// Default lock length untuk proposal `mintLocked` yang lolos (blocks).
pub const DEFAULT_MINT_LOCK_LENGTH: u64 = 720;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Token name
    pub name: String,

    /// Token ticker
    pub ticker: String,

    #[serde(default)]
    pub governance: GovernanceConfig,

    /// Initial liquid balances.
    #[serde(default)]
    pub balances: Vec<GenesisBalance>,

    /// Initial vault entries.
    #[serde(default)]
    pub vault: Vec<GenesisVaultEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    pub quorum_bps: u32,
    pub vote_length: u64,
    pub lock_min_length: u64,
    pub mint_lock_length: u64,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        GovernanceConfig {
            quorum_bps: DEFAULT_QUORUM_BPS,
            vote_length: DEFAULT_VOTE_LENGTH,
            lock_min_length: DEFAULT_LOCK_MIN_LENGTH,
            mint_lock_length: DEFAULT_MINT_LOCK_LENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisBalance {
    pub address: String,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisVaultEntry {
    pub address: String,
    pub balance: u64,
    pub start: u64,
    pub end: u64,
}

/// Load genesis config from a TOML file path.
/// If file is missing or parse fails, an error is returned.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<GenesisConfig> {
    let p = path.as_ref();
    let s = fs::read_to_string(p)
        .with_context(|| format!("failed to read genesis config {}", p.display()))?;
    let cfg: GenesisConfig = toml::from_str(&s)
        .with_context(|| format!("failed to parse genesis config {}", p.display()))?;
    Ok(cfg)
}
