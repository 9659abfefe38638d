//! Internal account ledger
//! credit / debit primitives plus the transfer and balance-read handlers

use crate::action::ReadResult;
use crate::error::ContractError;
use crate::types::{ensure_not_self, safe_add, validate_amount, Address};
use super::ContractState;

impl ContractState {
    /// Saldo liquid, 0 untuk address yang tidak ada.
    pub fn get_balance(&self, addr: &Address) -> u64 {
        self.balances.get(addr).copied().unwrap_or(0)
    }

    /// Saldo baru jika `amount` di-credit ke `addr`, tanpa menulis.
    pub(crate) fn check_credit(&self, addr: &Address, amount: u64) -> Result<u64, ContractError> {
        safe_add(self.get_balance(addr), amount)
    }

    /// Saldo baru jika `amount` di-debit dari `addr`, tanpa menulis.
    pub(crate) fn check_debit(&self, addr: &Address, amount: u64) -> Result<u64, ContractError> {
        let available = *self
            .balances
            .get(addr)
            .ok_or_else(|| ContractError::UnknownAccount(addr.to_string()))?;
        if available < amount {
            return Err(ContractError::InsufficientBalance { needed: amount, available });
        }
        Ok(available - amount)
    }

    /// Tambah saldo liquid; entry dibuat jika belum ada.
    pub fn credit(&mut self, addr: &Address, amount: u64) -> Result<(), ContractError> {
        let updated = self.check_credit(addr, amount)?;
        self.balances.insert(addr.clone(), updated);
        Ok(())
    }

    /// Kurangi saldo liquid. Entry yang habis tetap disimpan dengan nilai 0.
    pub fn debit(&mut self, addr: &Address, amount: u64) -> Result<(), ContractError> {
        let updated = self.check_debit(addr, amount)?;
        self.balances.insert(addr.clone(), updated);
        Ok(())
    }

    /// Transfer liquid balance dari caller ke target.
    ///
    /// # Langkah (URUT)
    ///
    /// 1. Target well-formed (`InvalidAddress`)
    /// 2. Target != caller (`SelfTransfer`)
    /// 3. Qty positif dan dalam bound (`InvalidAmount`)
    /// 4. Caller punya saldo cukup (`UnknownAccount` / `InsufficientBalance`)
    /// 5. Credit target tidak overflow (`InvalidAmount`)
    /// 6. Commit debit + credit
    pub(crate) fn transfer(
        &mut self,
        caller: &Address,
        target: &str,
        qty: i64,
    ) -> Result<(), ContractError> {
        let target = Address::parse(target)?;
        ensure_not_self(caller, &target)?;
        let qty = validate_amount(qty)?;

        let caller_after = self.check_debit(caller, qty)?;
        let target_after = self.check_credit(&target, qty)?;

        self.balances.insert(caller.clone(), caller_after);
        self.balances.insert(target.clone(), target_after);

        tracing::debug!(from = %caller, to = %target, qty, "transfer applied");
        Ok(())
    }

    /// Resolve target opsional untuk read: default ke caller.
    pub(crate) fn resolve_read_target(
        caller: &Address,
        target: Option<&str>,
    ) -> Result<Address, ContractError> {
        match target {
            Some(t) => Address::parse(t),
            None => Ok(caller.clone()),
        }
    }

    /// Liquid + vaulted balance dari target. `InvalidAmount` jika jumlahnya
    /// melewati safe-integer bound.
    pub(crate) fn read_balance(
        &self,
        caller: &Address,
        target: Option<&str>,
    ) -> Result<ReadResult, ContractError> {
        let target = Self::resolve_read_target(caller, target)?;
        if !self.is_present(&target) {
            return Err(ContractError::UnknownAccount(target.to_string()));
        }
        let balance = safe_add(self.get_balance(&target), self.vault_total(&target))?;
        Ok(ReadResult::Balance { target, balance })
    }

    /// Liquid balance saja.
    pub(crate) fn read_unlocked_balance(
        &self,
        caller: &Address,
        target: Option<&str>,
    ) -> Result<ReadResult, ContractError> {
        let target = Self::resolve_read_target(caller, target)?;
        if !self.is_present(&target) {
            return Err(ContractError::UnknownAccount(target.to_string()));
        }
        let balance = self.get_balance(&target);
        Ok(ReadResult::Balance { target, balance })
    }
}
