//! # Contract State Module
//!
//! Module ini adalah **ENTRY POINT** dan **FACADE** untuk seluruh state
//! contract: ledger, vault, proposal, role, dan governance settings.
//!
//! ## Arsitektur
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         mod.rs (FACADE)                         │
//! │  - ContractState struct definition                              │
//! │  - Settings / QuorumFraction                                    │
//! │  - from_genesis(), public re-exports                            │
//! └─────────────────────────────────────────────────────────────────┘
//!                                    │
//!          ┌─────────────────────────┼─────────────────────────┐
//!          ▼                         ▼                         ▼
//!  ┌──────────────┐         ┌──────────────┐         ┌──────────────┐
//!  │   Account    │         │    Vault     │         │  Governance  │
//!  │   Ledger     │         │   (locks)    │         │   Engine     │
//!  └──────────────┘         └──────────────┘         └──────────────┘
//!                                    │                         │
//!                                    ▼                         ▼
//!                           ┌──────────────┐         ┌──────────────┐
//!                           │   Payload    │◀────────│ State-Patch  │
//!                           │  Dispatcher  │         │    Guard     │
//!                           └──────────────┘         └──────────────┘
//!                                    │
//!                    ┌───────────────┴───────────────┐
//!                    ▼                               ▼
//!           ┌──────────────┐                ┌──────────────┐
//!           │    Batch     │                │  State Root  │
//!           │   Executor   │                │ Computation  │
//!           └──────────────┘                └──────────────┘
//! ```
//!
//! ## Module Structure
//!
//! | Module | Fungsi |
//! |--------|--------|
//! | `internal_account` | Ledger: credit, debit, transfer, balance reads |
//! | `internal_vault` | VaultEntry, lock, increaseVault, unlock, transferLocked |
//! | `internal_governance` | Proposal lifecycle: propose, vote, finalize |
//! | `internal_patch` | Allow/deny policy untuk proposal `set` |
//! | `internal_batch` | All-or-nothing batch di atas working copy |
//! | `internal_payload` | Dispatcher: satu `match` exhaustive per action |
//! | `internal_state_root` | SHA3-512 digest dari snapshot canonical |
//!
//! ## Aturan Atomicity (PENTING!)
//!
//! Setiap handler mengikuti pola **validate-then-commit**: semua check
//! dijalankan terhadap state yang belum berubah, dan write baru dilakukan
//! setelah semua check lolos. Jika handler mengembalikan `Err`, state
//! dijamin identik dengan sebelum call. Batch memakai working copy
//! (`clone`) yang hanya di-commit jika semua sub-action sukses.
//!
//! ## Determinism
//!
//! Semua map adalah `BTreeMap`, semua arithmetic integer (checked `u64`,
//! `u128` untuk perbandingan quorum). Tidak ada clock, randomness, atau I/O.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{
    GenesisConfig, DEFAULT_LOCK_MIN_LENGTH, DEFAULT_MINT_LOCK_LENGTH, DEFAULT_QUORUM_BPS,
    DEFAULT_VOTE_LENGTH,
};
use crate::error::ContractError;
use crate::types::{safe_add, Address, MAX_SAFE_INTEGER};

mod internal_account;
mod internal_batch;
mod internal_governance;
mod internal_patch;
mod internal_payload;
mod internal_state_root;
mod internal_vault;

pub use internal_governance::{Cast, Proposal, ProposalKind, ProposalStatus};
pub use internal_patch::{PatchTarget, PROTECTED_KEYS};
pub use internal_state_root::StateRoot;
pub use internal_vault::VaultEntry;

/// Basis points penuh (100%).
pub const BPS_DENOMINATOR: u32 = 10_000;

// ════════════════════════════════════════════════════════════════════════════
// QUORUM FRACTION
// ════════════════════════════════════════════════════════════════════════════

/// Quorum sebagai fixed-point basis points, `1..=10000` (0.0001 .. 1.0).
///
/// Tidak ada float di jalur consensus: perbandingan quorum dilakukan dengan
/// `u128` integer arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct QuorumFraction(u32);

impl QuorumFraction {
    pub fn from_bps(bps: u32) -> Result<Self, ContractError> {
        if bps == 0 || bps > BPS_DENOMINATOR {
            return Err(ContractError::invalid_setting(
                "quorum",
                format!("{} basis points is outside 1..=10000", bps),
            ));
        }
        Ok(QuorumFraction(bps))
    }

    pub fn bps(self) -> u32 {
        self.0
    }

    /// Parse decimal textual (`"0.3"`, `"1"`, `"0.0001"`) menjadi basis points.
    /// Maksimal 4 digit pecahan, tanpa exponent, harus di dalam (0, 1].
    pub fn parse_decimal(text: &str) -> Result<Self, ContractError> {
        let bad = |reason: &str| ContractError::invalid_setting("quorum", reason);

        let (whole, frac) = match text.split_once('.') {
            Some((w, f)) => (w, f),
            None => (text, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad("expected a decimal between 0 and 1"));
        }
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad("expected a decimal between 0 and 1"));
        }
        if frac.len() > 4 {
            return Err(bad("at most 4 fractional digits are supported"));
        }

        let whole: u32 = match whole.trim_start_matches('0') {
            "" => 0,
            "1" => 1,
            _ => return Err(bad("quorum cannot exceed 1")),
        };
        let mut frac_bps: u32 = 0;
        for (i, digit) in frac.bytes().enumerate() {
            frac_bps += u32::from(digit - b'0') * 10u32.pow(3 - i as u32);
        }

        let bps = whole * BPS_DENOMINATOR + frac_bps;
        if bps == 0 {
            return Err(bad("quorum must be greater than 0"));
        }
        if bps > BPS_DENOMINATOR {
            return Err(bad("quorum cannot exceed 1"));
        }
        Ok(QuorumFraction(bps))
    }

    /// `participation >= quorum * total_weight`, integer only.
    pub fn is_met(self, participation: u64, total_weight: u64) -> bool {
        u128::from(participation) * u128::from(BPS_DENOMINATOR)
            >= u128::from(self.0) * u128::from(total_weight)
    }
}

impl TryFrom<u32> for QuorumFraction {
    type Error = ContractError;
    fn try_from(bps: u32) -> Result<Self, Self::Error> {
        QuorumFraction::from_bps(bps)
    }
}

impl From<QuorumFraction> for u32 {
    fn from(q: QuorumFraction) -> u32 {
        q.0
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GOVERNANCE SETTINGS
// ════════════════════════════════════════════════════════════════════════════

/// Governance parameters. Hanya berubah lewat proposal `set` yang lolos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub quorum: QuorumFraction,
    /// Voting window (blocks) setelah `createdAt`
    pub vote_length: u64,
    /// Minimum lock length untuk lock / transferLocked
    pub lock_min_length: u64,
    /// Lock length vault entry dari proposal `mintLocked`
    pub mint_lock_length: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            quorum: QuorumFraction(DEFAULT_QUORUM_BPS),
            vote_length: DEFAULT_VOTE_LENGTH,
            lock_min_length: DEFAULT_LOCK_MIN_LENGTH,
            mint_lock_length: DEFAULT_MINT_LOCK_LENGTH,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CONTRACT STATE
// ════════════════════════════════════════════════════════════════════════════

/// Snapshot lengkap contract. Di-pass masuk dan dikembalikan oleh `apply`;
/// engine tidak menyimpan state apa pun di antara call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractState {
    /// Token name
    #[serde(default)]
    pub name: String,

    /// Token ticker
    #[serde(default)]
    pub ticker: String,

    /// Saldo liquid per address
    /// - Berkurang saat: transfer, lock, transferLocked
    /// - Bertambah saat: receive transfer, unlock, mint
    /// - Entry yang habis (0) tetap disimpan
    #[serde(default)]
    pub balances: BTreeMap<Address, u64>,

    /// Locked entries per address, urutan = urutan pembuatan
    #[serde(default)]
    pub vault: BTreeMap<Address, Vec<VaultEntry>>,

    /// Proposal list, append-only, `id == index`
    #[serde(default)]
    pub votes: Vec<Proposal>,

    /// Role label per address
    #[serde(default)]
    pub roles: BTreeMap<Address, String>,

    #[serde(default)]
    pub settings: Settings,

    /// Custom key yang ditulis oleh proposal `set`
    #[serde(default)]
    pub extensions: BTreeMap<String, Value>,
}

impl ContractState {
    pub fn new(name: impl Into<String>, ticker: impl Into<String>) -> Self {
        ContractState {
            name: name.into(),
            ticker: ticker.into(),
            ..Default::default()
        }
    }

    /// Build snapshot awal dari genesis config.
    ///
    /// Semua address, amount, dan window divalidasi; duplicate balance
    /// entry untuk address yang sama dijumlahkan.
    pub fn from_genesis(cfg: &GenesisConfig) -> Result<Self> {
        let mut state = ContractState::new(cfg.name.clone(), cfg.ticker.clone());

        let gov = &cfg.governance;
        state.settings.quorum = QuorumFraction::from_bps(gov.quorum_bps)
            .context("invalid governance.quorum_bps")?;
        for (field, value) in [
            ("vote_length", gov.vote_length),
            ("lock_min_length", gov.lock_min_length),
            ("mint_lock_length", gov.mint_lock_length),
        ] {
            if value == 0 || value > MAX_SAFE_INTEGER {
                bail!("governance.{} must be between 1 and {}", field, MAX_SAFE_INTEGER);
            }
        }
        state.settings.vote_length = gov.vote_length;
        state.settings.lock_min_length = gov.lock_min_length;
        state.settings.mint_lock_length = gov.mint_lock_length;

        for entry in &cfg.balances {
            let addr = Address::parse(&entry.address)
                .with_context(|| format!("invalid genesis balance address {:?}", entry.address))?;
            let current = state.balances.get(&addr).copied().unwrap_or(0);
            let updated = safe_add(current, entry.amount)
                .with_context(|| format!("genesis balance of {} overflows", addr))?;
            state.balances.insert(addr, updated);
        }

        for entry in &cfg.vault {
            let addr = Address::parse(&entry.address)
                .with_context(|| format!("invalid genesis vault address {:?}", entry.address))?;
            if entry.balance == 0 || entry.balance > MAX_SAFE_INTEGER {
                bail!("genesis vault entry of {} has an invalid balance", addr);
            }
            if entry.end <= entry.start || entry.end > MAX_SAFE_INTEGER {
                bail!("genesis vault entry of {} must end after it starts", addr);
            }
            state.vault.entry(addr).or_default().push(VaultEntry {
                balance: entry.balance,
                start: entry.start,
                end: entry.end,
            });
        }

        tracing::info!(
            name = %state.name,
            accounts = state.balances.len(),
            vaults = state.vault.len(),
            "genesis state built"
        );
        Ok(state)
    }

    /// Address punya ledger entry atau vault (walau kosong).
    pub fn is_present(&self, addr: &Address) -> bool {
        self.balances.contains_key(addr) || self.vault.contains_key(addr)
    }

    /// Total supply: semua saldo liquid + semua vault entry.
    pub fn total_supply(&self) -> u128 {
        let liquid: u128 = self.balances.values().map(|b| u128::from(*b)).sum();
        let locked: u128 = self
            .vault
            .values()
            .flat_map(|entries| entries.iter())
            .map(|e| u128::from(e.balance))
            .sum();
        liquid + locked
    }

    pub fn get_proposal(&self, id: u64) -> Option<&Proposal> {
        usize::try_from(id).ok().and_then(|idx| self.votes.get(idx))
    }
}
