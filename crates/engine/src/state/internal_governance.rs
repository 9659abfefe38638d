//! # Governance Engine
//!
//! Proposal lifecycle: `propose` → `vote` → `finalize`.
//!
//! ## State Machine
//!
//! ```text
//!              ┌──────────┐
//!   propose ──▶│  active  │── vote (0..n kali, satu per address)
//!              └────┬─────┘
//!                   │ finalize (height > createdAt + voteLength)
//!     ┌─────────────┼──────────────────┐
//!     ▼             ▼                  ▼
//! ┌────────┐   ┌────────┐      ┌──────────────┐
//! │ passed │   │ failed │      │ quorumFailed │
//! └────────┘   └────────┘      └──────────────┘
//! ```
//!
//! Semua status selain `active` adalah terminal.
//!
//! ## Voting Weight
//!
//! Weight seorang voter adalah jumlah vault entry miliknya yang aktif pada
//! `createdAt` proposal (`start <= createdAt < end`). Lock yang dibuat
//! setelah proposal tidak pernah menambah weight.
//!
//! `totalWeight` adalah jumlah SEMUA vault entry di seluruh account pada saat
//! propose, termasuk entry yang sudah due tetapi belum di-unlock. Nilainya
//! di-snapshot sekali dan menjadi basis quorum.
//!
//! ## Quorum
//!
//! `(yays + nays) * 10000 >= quorum_bps * totalWeight`, integer `u128`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::ProposeInput;
use crate::error::ContractError;
use crate::types::{end_height, safe_add, validate_amount, Address, BlockContext};
use super::internal_patch::PatchTarget;
use super::{ContractState, VaultEntry};

// ════════════════════════════════════════════════════════════════════════════
// PROPOSAL DATA STRUCTURES
// ════════════════════════════════════════════════════════════════════════════

/// Jenis proposal beserta payload-nya. Di-serialize dengan tag `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProposalKind {
    /// Credit `qty` ke saldo liquid recipient
    Mint { recipient: Address, qty: u64 },
    /// Vault entry baru untuk recipient selama `mintLockLength` block
    MintLocked { recipient: Address, qty: u64 },
    /// State patch lewat guard
    Set {
        key: String,
        value: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        recipient: Option<Address>,
    },
    /// Tanpa efek, hanya note
    Indicative,
}

impl ProposalKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ProposalKind::Mint { .. } => "mint",
            ProposalKind::MintLocked { .. } => "mintLocked",
            ProposalKind::Set { .. } => "set",
            ProposalKind::Indicative => "indicative",
        }
    }
}

/// Status proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProposalStatus {
    /// Voting masih berjalan atau belum di-finalize
    Active,
    /// Quorum tercapai dan yays > nays, efek sudah dijalankan
    Passed,
    /// Quorum tercapai tetapi yays <= nays
    Failed,
    /// Partisipasi di bawah quorum
    QuorumFailed,
}

/// Pilihan vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cast {
    Yay,
    Nay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    /// Index di `votes`
    pub id: u64,
    #[serde(flatten)]
    pub kind: ProposalKind,
    pub note: String,
    /// Block height saat proposal dibuat
    pub created_at: u64,
    /// Snapshot jumlah semua vault entry saat `created_at`
    pub total_weight: u64,
    pub yays: u64,
    pub nays: u64,
    /// Address yang sudah vote
    pub voted: BTreeSet<Address>,
    pub status: ProposalStatus,
}

impl Proposal {
    /// Height terakhir di mana vote masih diterima.
    pub fn voting_end(&self, vote_length: u64) -> u64 {
        self.created_at.saturating_add(vote_length)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CONTRACTSTATE GOVERNANCE METHODS
// ════════════════════════════════════════════════════════════════════════════

impl ContractState {
    /// Proposal dengan status `active`, atau `UnknownProposal`.
    fn active_proposal(&self, id: u64) -> Result<&Proposal, ContractError> {
        self.get_proposal(id)
            .filter(|p| p.status == ProposalStatus::Active)
            .ok_or(ContractError::UnknownProposal(id))
    }

    /// Membuat proposal baru.
    ///
    /// # Langkah (URUT - CONSENSUS-CRITICAL)
    ///
    /// 1. Caller punya ledger atau vault (`NotInDao`)
    /// 2. Caller punya locked balance > 0 (`NoLockedStake`)
    /// 3. Type dikenal (`InvalidProposalType`)
    /// 4. Payload sesuai type (`InvalidAddress`, `InvalidAmount`,
    ///    `ProtectedKey`, `InvalidSetting`)
    /// 5. Snapshot total locked weight (semua vault entry)
    /// 6. Append proposal `active` dengan id = index
    ///
    /// # Returns
    ///
    /// * `Ok(id)` - ID proposal yang baru dibuat
    pub(crate) fn propose(
        &mut self,
        caller: &Address,
        input: &ProposeInput,
        ctx: BlockContext,
    ) -> Result<u64, ContractError> {
        // 1. Caller pernah berpartisipasi
        if !self.is_present(caller) {
            return Err(ContractError::NotInDao);
        }

        // 2. Caller punya stake terkunci
        if self.vault_total(caller) == 0 {
            return Err(ContractError::NoLockedStake);
        }

        // 3-4. Type + payload
        let kind = match input.kind.as_str() {
            "mint" | "mintLocked" => {
                let recipient = Address::parse(input.recipient.as_deref().unwrap_or_default())?;
                let qty = validate_amount(input.qty.ok_or(ContractError::InvalidAmount)?)?;
                if input.kind == "mint" {
                    ProposalKind::Mint { recipient, qty }
                } else {
                    ProposalKind::MintLocked { recipient, qty }
                }
            }
            "set" => {
                let target = PatchTarget::validate(
                    input.key.as_deref(),
                    input.value.as_ref(),
                    input.recipient.as_deref(),
                )?;
                let recipient = match target {
                    PatchTarget::Role { recipient, .. } => Some(recipient),
                    _ => None,
                };
                ProposalKind::Set {
                    key: input.key.clone().unwrap_or_default(),
                    value: input.value.clone().unwrap_or(Value::Null),
                    recipient,
                }
            }
            "indicative" => ProposalKind::Indicative,
            other => return Err(ContractError::InvalidProposalType(other.to_string())),
        };

        // 5. Snapshot weight
        let total_weight = self.total_locked_weight();

        // 6. Append
        let id = self.votes.len() as u64;
        tracing::info!(
            id,
            proposer = %caller,
            kind = kind.type_name(),
            total_weight,
            "proposal created"
        );
        self.votes.push(Proposal {
            id,
            kind,
            note: input.note.clone(),
            created_at: ctx.height,
            total_weight,
            yays: 0,
            nays: 0,
            voted: BTreeSet::new(),
            status: ProposalStatus::Active,
        });
        Ok(id)
    }

    /// Cast vote untuk proposal.
    ///
    /// # Langkah (URUT - CONSENSUS-CRITICAL)
    ///
    /// 1. Proposal ada dan `active` (`UnknownProposal`)
    /// 2. `height <= createdAt + voteLength` (`VotingClosed`)
    /// 3. Caller belum vote (`AlreadyVoted`)
    /// 4. Caller punya ledger atau vault (`NotInDao`)
    /// 5. Weight = vault caller yang aktif pada `createdAt`
    /// 6. Weight > 0 (`NoEligibleStake`)
    /// 7. Tambah ke yays/nays, catat caller di `voted`
    pub(crate) fn vote(
        &mut self,
        caller: &Address,
        id: u64,
        cast: Cast,
        ctx: BlockContext,
    ) -> Result<(), ContractError> {
        // 1
        let proposal = self.active_proposal(id)?;

        // 2
        if ctx.height > proposal.voting_end(self.settings.vote_length) {
            return Err(ContractError::VotingClosed);
        }

        // 3
        if proposal.voted.contains(caller) {
            return Err(ContractError::AlreadyVoted);
        }

        // 4
        if !self.is_present(caller) {
            return Err(ContractError::NotInDao);
        }

        // 5-6
        let weight = self.eligible_weight(caller, proposal.created_at);
        if weight == 0 {
            return Err(ContractError::NoEligibleStake);
        }

        let (yays, nays) = match cast {
            Cast::Yay => (safe_add(proposal.yays, weight)?, proposal.nays),
            Cast::Nay => (proposal.yays, safe_add(proposal.nays, weight)?),
        };

        // 7. Commit
        let idx = id as usize;
        if let Some(p) = self.votes.get_mut(idx) {
            p.yays = yays;
            p.nays = nays;
            p.voted.insert(caller.clone());
        }

        tracing::debug!(id, voter = %caller, ?cast, weight, "vote cast");
        Ok(())
    }

    /// Finalize proposal setelah voting window berakhir. Boleh dipanggil
    /// oleh address mana pun.
    ///
    /// # Langkah (URUT - CONSENSUS-CRITICAL)
    ///
    /// 1. Proposal ada dan `active` (`UnknownProposal`)
    /// 2. `height > createdAt + voteLength` (`VotingStillOpen`)
    /// 3. Quorum tidak tercapai → `quorumFailed`
    /// 4. yays > nays → `passed`, efek divalidasi lalu dijalankan sekali
    /// 5. Selain itu → `failed`
    ///
    /// # Returns
    ///
    /// * `Ok(ProposalStatus)` - Status final proposal
    pub(crate) fn finalize(
        &mut self,
        caller: &Address,
        id: u64,
        ctx: BlockContext,
    ) -> Result<ProposalStatus, ContractError> {
        // 1
        let proposal = self.active_proposal(id)?;

        // 2
        if ctx.height <= proposal.voting_end(self.settings.vote_length) {
            return Err(ContractError::VotingStillOpen);
        }

        // 3-5
        let participation = proposal.yays.saturating_add(proposal.nays);
        let status = if !self.settings.quorum.is_met(participation, proposal.total_weight) {
            ProposalStatus::QuorumFailed
        } else if proposal.yays > proposal.nays {
            ProposalStatus::Passed
        } else {
            ProposalStatus::Failed
        };

        // Validasi efek sebelum write apa pun
        let effect = if status == ProposalStatus::Passed {
            Some(self.prepare_effect(&proposal.kind, ctx)?)
        } else {
            None
        };

        if let Some(p) = self.votes.get_mut(id as usize) {
            p.status = status;
        }
        if let Some(effect) = effect {
            self.commit_effect(effect);
        }

        tracing::info!(id, finalized_by = %caller, ?status, "proposal finalized");
        Ok(status)
    }

    fn prepare_effect(
        &self,
        kind: &ProposalKind,
        ctx: BlockContext,
    ) -> Result<ProposalEffect, ContractError> {
        let effect = match kind {
            ProposalKind::Mint { recipient, qty } => ProposalEffect::Credit {
                recipient: recipient.clone(),
                new_balance: self.check_credit(recipient, *qty)?,
            },
            ProposalKind::MintLocked { recipient, qty } => {
                let end = end_height(ctx.height, self.settings.mint_lock_length)?;
                ProposalEffect::Vest {
                    recipient: recipient.clone(),
                    entry: VaultEntry::new(*qty, ctx.height, end),
                }
            }
            ProposalKind::Set { key, value, recipient } => {
                let target = PatchTarget::validate(
                    Some(key),
                    Some(value),
                    recipient.as_ref().map(Address::as_str),
                )?;
                ProposalEffect::Patch(target)
            }
            ProposalKind::Indicative => ProposalEffect::None,
        };
        Ok(effect)
    }

    fn commit_effect(&mut self, effect: ProposalEffect) {
        match effect {
            ProposalEffect::Credit { recipient, new_balance } => {
                self.balances.insert(recipient, new_balance);
            }
            ProposalEffect::Vest { recipient, entry } => {
                self.vault.entry(recipient).or_default().push(entry);
            }
            ProposalEffect::Patch(target) => self.apply_patch(target),
            ProposalEffect::None => {}
        }
    }
}

/// Efek proposal `passed` yang sudah tervalidasi.
enum ProposalEffect {
    Credit { recipient: Address, new_balance: u64 },
    Vest { recipient: Address, entry: VaultEntry },
    Patch(PatchTarget),
    None,
}
