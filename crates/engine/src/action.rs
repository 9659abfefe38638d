//! action envelope, input variants and transition result types
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::{Cast, ContractState};
use crate::types::Address;

/// Satu action yang sudah diautentikasi: input + caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub input: ActionInput,
    pub caller: Address,
}

impl Action {
    pub fn new(caller: Address, input: ActionInput) -> Self {
        Self { input, caller }
    }
}

/// Closed set of action inputs, dispatched on the `function` tag.
///
/// Quantities and lock lengths are signed on the wire so that a negative
/// value reaches validation and fails with `InvalidAmount` / `LockTooShort`.
/// Targets are raw strings and are validated by the handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "function", rename_all = "camelCase")]
pub enum ActionInput {
    /// Transfer liquid balance caller -> target
    Transfer { target: String, qty: i64 },

    /// Liquid + vaulted balance
    Balance {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
    },

    /// Liquid balance only
    UnlockedBalance {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
    },

    /// Move liquid balance into a new vault entry
    Lock {
        qty: i64,
        #[serde(rename = "lockLength")]
        lock_length: i64,
    },

    /// Extend the end height of one vault entry
    IncreaseVault {
        id: u64,
        #[serde(rename = "lockLength")]
        lock_length: i64,
    },

    /// Release every due vault entry of the caller
    Unlock,

    /// Sum of the target's vault entries
    VaultBalance {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
    },

    /// Debit caller's liquid balance into the target's vault
    TransferLocked {
        target: String,
        qty: i64,
        #[serde(rename = "lockLength")]
        lock_length: i64,
    },

    Propose(ProposeInput),

    Vote { id: u64, cast: Cast },

    Finalize { id: u64 },

    /// All-or-nothing sequence of sub-actions
    TransactionBatch { transactions: Vec<BatchItem> },
}

impl ActionInput {
    /// Nilai tag `function` di wire (untuk logging).
    pub fn function_name(&self) -> &'static str {
        match self {
            ActionInput::Transfer { .. } => "transfer",
            ActionInput::Balance { .. } => "balance",
            ActionInput::UnlockedBalance { .. } => "unlockedBalance",
            ActionInput::Lock { .. } => "lock",
            ActionInput::IncreaseVault { .. } => "increaseVault",
            ActionInput::Unlock => "unlock",
            ActionInput::VaultBalance { .. } => "vaultBalance",
            ActionInput::TransferLocked { .. } => "transferLocked",
            ActionInput::Propose(_) => "propose",
            ActionInput::Vote { .. } => "vote",
            ActionInput::Finalize { .. } => "finalize",
            ActionInput::TransactionBatch { .. } => "transactionBatch",
        }
    }

    /// True untuk action yang tidak pernah memutasi state.
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            ActionInput::Balance { .. }
                | ActionInput::UnlockedBalance { .. }
                | ActionInput::VaultBalance { .. }
        )
    }
}

/// Raw proposal payload. Shape per type is checked by the governance engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposeInput {
    /// mint | mintLocked | set | indicative
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default)]
    pub note: String,
}

/// Satu elemen `transactions` di dalam batch. Sub-action selalu jalan
/// sebagai caller batch; `caller` opsional hanya boleh mengulang address
/// yang sama, selain itu item ditolak dengan `CallerMismatch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<Address>,
    #[serde(flatten)]
    pub input: ActionInput,
}

impl From<ActionInput> for BatchItem {
    fn from(input: ActionInput) -> Self {
        BatchItem { caller: None, input }
    }
}

/// Payload yang dikembalikan oleh read action (dan batch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadResult {
    Balance { target: Address, balance: u64 },
    Batch { results: Vec<ReadResult> },
}

/// Hasil sukses dari `apply`: snapshot baru + read result opsional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: ContractState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ReadResult>,
}
