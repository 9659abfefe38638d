//! # Contract Error
//!
//! Satu-satunya tipe failure yang dikembalikan oleh transition function.
//!
//! Setiap variant adalah **terminal** untuk satu action: engine tidak pernah
//! retry, tidak pernah recover diam-diam, dan menjamin TIDAK ADA mutasi state
//! ketika error dikembalikan. Caller memeriksa variant (atau `kind()`), bukan
//! string pesan.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Typed failure dari satu action.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum ContractError {
    /// Account identifier tidak well-formed
    #[error("invalid address: {0:?}")]
    InvalidAddress(String),

    /// Quantity <= 0, melebihi safe-integer bound, atau overflow saat credit
    #[error("invalid amount")]
    InvalidAmount,

    /// Target sama dengan caller
    #[error("target cannot be the caller")]
    SelfTransfer,

    /// Saldo liquid tidak cukup
    #[error("insufficient balance: needed {needed}, available {available}")]
    InsufficientBalance { needed: u64, available: u64 },

    /// Account tidak ada di ledger
    #[error("unknown account: {0}")]
    UnknownAccount(String),

    /// Lock length di bawah minimum window
    #[error("lock length {got} is below the minimum of {min}")]
    LockTooShort { min: u64, got: i64 },

    /// increaseVault hanya boleh memperpanjang
    #[error("new lock end must be after the current end")]
    LockCannotShorten,

    /// Index vault entry tidak ada
    #[error("unknown vault entry {0}")]
    UnknownVaultEntry(u64),

    /// Caller tidak pernah punya balance atau vault
    #[error("caller is not part of the DAO")]
    NotInDao,

    /// Caller tidak punya locked balance untuk propose
    #[error("caller has no locked stake")]
    NoLockedStake,

    /// Tipe proposal tidak dikenal
    #[error("invalid proposal type: {0:?}")]
    InvalidProposalType(String),

    /// Key termasuk reserved denylist state-patch
    #[error("key {0:?} is protected and cannot be patched")]
    ProtectedKey(String),

    /// Key/value proposal `set` tidak sesuai shape yang diharapkan
    #[error("invalid value for setting {key:?}: {reason}")]
    InvalidSetting { key: String, reason: String },

    /// Proposal tidak ada atau sudah tidak active
    #[error("unknown or inactive proposal {0}")]
    UnknownProposal(u64),

    /// Voting window sudah lewat
    #[error("voting window is closed")]
    VotingClosed,

    /// Voting window belum berakhir (finalize terlalu awal)
    #[error("voting window is still open")]
    VotingStillOpen,

    /// Caller sudah vote di proposal ini
    #[error("caller has already voted")]
    AlreadyVoted,

    /// Tidak ada lock yang eligible pada height pembuatan proposal
    #[error("caller has no stake eligible for this proposal")]
    NoEligibleStake,

    /// Batch item membawa `caller` yang bukan caller terautentikasi
    #[error("batch item caller {0} does not match the authenticated caller")]
    CallerMismatch(String),

    /// Sub-action ke-`index` di dalam batch gagal
    #[error("batch sub-action {index} failed: {source}")]
    BatchSubActionFailed {
        index: usize,
        source: Box<ContractError>,
    },
}

/// Payload-free discriminant dari [`ContractError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidAddress,
    InvalidAmount,
    SelfTransfer,
    InsufficientBalance,
    UnknownAccount,
    LockTooShort,
    LockCannotShorten,
    UnknownVaultEntry,
    NotInDao,
    NoLockedStake,
    InvalidProposalType,
    ProtectedKey,
    InvalidSetting,
    UnknownProposal,
    VotingClosed,
    VotingStillOpen,
    AlreadyVoted,
    NoEligibleStake,
    CallerMismatch,
    BatchSubActionFailed,
}

impl ContractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ContractError::InvalidAddress(_) => ErrorKind::InvalidAddress,
            ContractError::InvalidAmount => ErrorKind::InvalidAmount,
            ContractError::SelfTransfer => ErrorKind::SelfTransfer,
            ContractError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            ContractError::UnknownAccount(_) => ErrorKind::UnknownAccount,
            ContractError::LockTooShort { .. } => ErrorKind::LockTooShort,
            ContractError::LockCannotShorten => ErrorKind::LockCannotShorten,
            ContractError::UnknownVaultEntry(_) => ErrorKind::UnknownVaultEntry,
            ContractError::NotInDao => ErrorKind::NotInDao,
            ContractError::NoLockedStake => ErrorKind::NoLockedStake,
            ContractError::InvalidProposalType(_) => ErrorKind::InvalidProposalType,
            ContractError::ProtectedKey(_) => ErrorKind::ProtectedKey,
            ContractError::InvalidSetting { .. } => ErrorKind::InvalidSetting,
            ContractError::UnknownProposal(_) => ErrorKind::UnknownProposal,
            ContractError::VotingClosed => ErrorKind::VotingClosed,
            ContractError::VotingStillOpen => ErrorKind::VotingStillOpen,
            ContractError::AlreadyVoted => ErrorKind::AlreadyVoted,
            ContractError::NoEligibleStake => ErrorKind::NoEligibleStake,
            ContractError::CallerMismatch(_) => ErrorKind::CallerMismatch,
            ContractError::BatchSubActionFailed { .. } => ErrorKind::BatchSubActionFailed,
        }
    }

    /// Error paling dalam, menembus semua lapisan `BatchSubActionFailed`.
    pub fn root_cause(&self) -> &ContractError {
        match self {
            ContractError::BatchSubActionFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub(crate) fn invalid_setting(key: &str, reason: impl Into<String>) -> Self {
        ContractError::InvalidSetting {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strips_payload() {
        let err = ContractError::InsufficientBalance { needed: 10, available: 5 };
        assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
        assert_eq!(ContractError::UnknownProposal(3).kind(), ErrorKind::UnknownProposal);
    }

    #[test]
    fn test_root_cause_unwraps_nested_batches() {
        let err = ContractError::BatchSubActionFailed {
            index: 1,
            source: Box::new(ContractError::BatchSubActionFailed {
                index: 0,
                source: Box::new(ContractError::SelfTransfer),
            }),
        };
        assert_eq!(err.root_cause(), &ContractError::SelfTransfer);
        assert_eq!(err.kind(), ErrorKind::BatchSubActionFailed);
    }

    #[test]
    fn test_error_serialization() {
        let err = ContractError::LockTooShort { min: 5, got: 1 };
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"kind\":\"lockTooShort\""));
        let restored: ContractError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, restored);
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(ContractError::VotingClosed.to_string(), "voting window is closed");
        let err = ContractError::BatchSubActionFailed {
            index: 2,
            source: Box::new(ContractError::InvalidAmount),
        };
        assert_eq!(err.to_string(), "batch sub-action 2 failed: invalid amount");
    }
}
