//! # VDAO Engine Library
//!
//! State-transition engine untuk token ledger dengan vesting vault dan
//! token-weighted governance. Diberikan snapshot state, satu action, dan
//! block context, engine secara deterministik menghasilkan snapshot baru
//! (plus read result opsional) atau menolak action tanpa mutasi apa pun.
//!
//! ## Module Overview
//!
//! | Module | Fungsi |
//! |--------|--------|
//! | `types` | Address, safe-integer bound, BlockContext, validators |
//! | `error` | `ContractError`: taxonomy failure per action |
//! | `config` | Genesis config (TOML) dan default governance |
//! | `action` | `ActionInput` (tag `function`), `Action`, `ReadResult`, `Transition` |
//! | `state` | `ContractState`: ledger, vault, governance, patch guard, batch, state root |
//! | `cli` | Replay CLI `vdao`: genesis, apply, state-root |
//!
//! ## Contoh
//!
//! ```
//! use vdao_engine::{apply, Action, ActionInput, Address, BlockContext, ContractState};
//!
//! let admin = Address::parse("uhE-QeYS8i4pmUtnxQyHD7dzXFNaJ9oMK-IM-QPNY6M").unwrap();
//! let mut state = ContractState::new("Verto DAO", "VDAO");
//! state.balances.insert(admin.clone(), 1_000_000);
//!
//! let action = Action::new(admin, ActionInput::Lock { qty: 200_000, lock_length: 100 });
//! let next = apply(&state, &action, BlockContext::at(10)).unwrap();
//! assert_eq!(next.state.total_supply(), 1_000_000);
//! assert!(next.result.is_none());
//! ```
//!
//! ## Determinism
//!
//! ```text
//! (state, action, height) identik → Transition identik, byte-per-byte.
//! Tidak ada clock, randomness, float, atau iterasi unordered.
//! ```

pub mod action;
pub mod cli;
pub mod config;
pub mod error;
pub mod state;
pub mod types;

pub use action::{Action, ActionInput, BatchItem, ProposeInput, ReadResult, Transition};
pub use config::GenesisConfig;
pub use error::{ContractError, ErrorKind};
pub use state::{
    Cast, ContractState, Proposal, ProposalKind, ProposalStatus, QuorumFraction, Settings,
    StateRoot, VaultEntry,
};
pub use types::{Address, BlockContext, MAX_SAFE_INTEGER};

/// Transition function murni.
///
/// Snapshot input tidak pernah dimutasi. Jika `Err`, caller cukup tetap
/// memakai snapshot lama.
pub fn apply(
    state: &ContractState,
    action: &Action,
    ctx: BlockContext,
) -> Result<Transition, ContractError> {
    let mut next = state.clone();
    let result = next.execute(&action.caller, &action.input, ctx)?;
    Ok(Transition { state: next, result })
}
