//! Internal vault (time-locked balance) management

use serde::{Deserialize, Serialize};

use crate::action::ReadResult;
use crate::error::ContractError;
use crate::types::{
    end_height, ensure_not_self, safe_add, validate_amount, validate_lock_length, Address,
    BlockContext, MAX_SAFE_INTEGER,
};
use super::ContractState;

/// Satu locked-balance entry.
///
/// Invariant: `balance > 0` dan `end > start`. `end` hanya boleh bertambah.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VaultEntry {
    /// Amount yang terkunci
    pub balance: u64,
    /// Block height saat entry dibuat
    pub start: u64,
    /// Block height saat entry boleh di-unlock
    pub end: u64,
}

impl VaultEntry {
    pub fn new(balance: u64, start: u64, end: u64) -> Self {
        Self { balance, start, end }
    }

    /// Entry sudah boleh di-unlock pada `height`.
    pub fn is_due(&self, height: u64) -> bool {
        height >= self.end
    }

    /// Entry sudah ada pada `height` dan belum berakhir.
    pub fn is_active_at(&self, height: u64) -> bool {
        self.start <= height && self.end > height
    }

    /// Sisa block sebelum entry boleh di-unlock.
    pub fn remaining_blocks(&self, height: u64) -> u64 {
        self.end.saturating_sub(height)
    }
}

impl ContractState {
    // ============================================================
    // VAULT QUERIES
    // ============================================================

    pub fn get_vault(&self, addr: &Address) -> &[VaultEntry] {
        self.vault.get(addr).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Jumlah semua entry (due atau belum).
    pub fn vault_total(&self, addr: &Address) -> u64 {
        self.get_vault(addr)
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.balance))
    }

    /// Jumlah entry milik `addr` yang aktif pada `height`.
    pub fn eligible_weight(&self, addr: &Address, height: u64) -> u64 {
        self.get_vault(addr)
            .iter()
            .filter(|e| e.is_active_at(height))
            .fold(0u64, |acc, e| acc.saturating_add(e.balance))
    }

    /// Jumlah seluruh vault entry di semua account, termasuk entry yang
    /// sudah due tetapi belum di-unlock.
    pub fn total_locked_weight(&self) -> u64 {
        self.vault
            .keys()
            .fold(0u64, |acc, addr| acc.saturating_add(self.vault_total(addr)))
    }

    // ============================================================
    // VAULT HANDLERS
    // ============================================================

    /// Pindahkan `qty` dari saldo liquid caller ke vault entry baru
    /// `{qty, start: height, end: height + lock_length}`.
    pub(crate) fn lock(
        &mut self,
        caller: &Address,
        qty: i64,
        lock_length: i64,
        ctx: BlockContext,
    ) -> Result<(), ContractError> {
        let qty = validate_amount(qty)?;
        let length = validate_lock_length(lock_length, self.settings.lock_min_length)?;
        let end = end_height(ctx.height, length)?;
        let caller_after = self.check_debit(caller, qty)?;

        self.balances.insert(caller.clone(), caller_after);
        self.vault
            .entry(caller.clone())
            .or_default()
            .push(VaultEntry::new(qty, ctx.height, end));

        tracing::debug!(account = %caller, qty, end, "balance locked");
        Ok(())
    }

    /// Perpanjang entry `id` milik caller menjadi `height + lock_length`.
    /// Tidak pernah memperpendek.
    pub(crate) fn increase_vault(
        &mut self,
        caller: &Address,
        id: u64,
        lock_length: i64,
        ctx: BlockContext,
    ) -> Result<(), ContractError> {
        let idx = usize::try_from(id).map_err(|_| ContractError::UnknownVaultEntry(id))?;
        let current_end = self
            .get_vault(caller)
            .get(idx)
            .map(|e| e.end)
            .ok_or(ContractError::UnknownVaultEntry(id))?;

        if lock_length < 0 || lock_length as u64 > MAX_SAFE_INTEGER {
            return Err(ContractError::InvalidAmount);
        }
        let new_end = end_height(ctx.height, lock_length as u64)?;
        if new_end <= current_end {
            return Err(ContractError::LockCannotShorten);
        }

        if let Some(entry) = self.vault.get_mut(caller).and_then(|v| v.get_mut(idx)) {
            entry.end = new_end;
        }

        tracing::debug!(account = %caller, id, new_end, "vault entry extended");
        Ok(())
    }

    /// Release semua entry caller yang sudah due ke saldo liquid.
    ///
    /// Bukan error jika tidak ada yang due. Vault yang kosong tetap disimpan.
    /// Returns jumlah yang di-release.
    pub(crate) fn unlock(
        &mut self,
        caller: &Address,
        ctx: BlockContext,
    ) -> Result<u64, ContractError> {
        let released = self
            .get_vault(caller)
            .iter()
            .filter(|e| e.is_due(ctx.height))
            .try_fold(0u64, |acc, e| safe_add(acc, e.balance))?;
        if released == 0 {
            return Ok(0);
        }
        let caller_after = self.check_credit(caller, released)?;

        if let Some(entries) = self.vault.get_mut(caller) {
            entries.retain(|e| !e.is_due(ctx.height));
        }
        self.balances.insert(caller.clone(), caller_after);

        tracing::debug!(account = %caller, released, "vault entries unlocked");
        Ok(released)
    }

    /// Debit saldo liquid caller menjadi vault entry baru milik target.
    pub(crate) fn transfer_locked(
        &mut self,
        caller: &Address,
        target: &str,
        qty: i64,
        lock_length: i64,
        ctx: BlockContext,
    ) -> Result<(), ContractError> {
        let target = Address::parse(target)?;
        ensure_not_self(caller, &target)?;
        let qty = validate_amount(qty)?;
        let length = validate_lock_length(lock_length, self.settings.lock_min_length)?;
        let end = end_height(ctx.height, length)?;
        let caller_after = self.check_debit(caller, qty)?;

        self.balances.insert(caller.clone(), caller_after);
        self.vault
            .entry(target.clone())
            .or_default()
            .push(VaultEntry::new(qty, ctx.height, end));

        tracing::debug!(from = %caller, to = %target, qty, end, "locked balance transferred");
        Ok(())
    }

    /// Jumlah vault target (0 jika tidak punya vault).
    pub(crate) fn read_vault_balance(
        &self,
        caller: &Address,
        target: Option<&str>,
    ) -> Result<ReadResult, ContractError> {
        let target = Self::resolve_read_target(caller, target)?;
        let balance = self.vault_total(&target);
        Ok(ReadResult::Balance { target, balance })
    }
}
