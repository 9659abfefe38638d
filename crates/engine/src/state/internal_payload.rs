//! Action dispatch
//! Satu `match` exhaustive: setiap `ActionInput` punya tepat satu handler.

use crate::action::{ActionInput, ReadResult};
use crate::error::ContractError;
use crate::types::{Address, BlockContext};
use super::ContractState;

impl ContractState {
    /// Jalankan satu action in-place.
    ///
    /// Read action mengembalikan `Some(ReadResult)`, write action `None`,
    /// batch selalu `Some(ReadResult::Batch)`. Jika `Err`, state tidak berubah.
    pub fn execute(
        &mut self,
        caller: &Address,
        input: &ActionInput,
        ctx: BlockContext,
    ) -> Result<Option<ReadResult>, ContractError> {
        let outcome = match input {
            ActionInput::Transfer { target, qty } => {
                self.transfer(caller, target, *qty).map(|_| None)
            }
            ActionInput::Balance { target } => {
                self.read_balance(caller, target.as_deref()).map(Some)
            }
            ActionInput::UnlockedBalance { target } => {
                self.read_unlocked_balance(caller, target.as_deref()).map(Some)
            }
            ActionInput::Lock { qty, lock_length } => {
                self.lock(caller, *qty, *lock_length, ctx).map(|_| None)
            }
            ActionInput::IncreaseVault { id, lock_length } => {
                self.increase_vault(caller, *id, *lock_length, ctx).map(|_| None)
            }
            ActionInput::Unlock => self.unlock(caller, ctx).map(|_| None),
            ActionInput::VaultBalance { target } => {
                self.read_vault_balance(caller, target.as_deref()).map(Some)
            }
            ActionInput::TransferLocked { target, qty, lock_length } => self
                .transfer_locked(caller, target, *qty, *lock_length, ctx)
                .map(|_| None),
            ActionInput::Propose(proposal) => self.propose(caller, proposal, ctx).map(|_| None),
            ActionInput::Vote { id, cast } => self.vote(caller, *id, *cast, ctx).map(|_| None),
            ActionInput::Finalize { id } => self.finalize(caller, *id, ctx).map(|_| None),
            ActionInput::TransactionBatch { transactions } => {
                self.execute_batch(caller, transactions, ctx).map(Some)
            }
        };

        match &outcome {
            Ok(_) => tracing::debug!(
                function = input.function_name(),
                caller = %caller,
                height = ctx.height,
                "action applied"
            ),
            Err(e) => tracing::debug!(
                function = input.function_name(),
                caller = %caller,
                height = ctx.height,
                error = %e,
                "action rejected"
            ),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Cast;

    const ADMIN: &str = "uhE-QeYS8i4pmUtnxQyHD7dzXFNaJ9oMK-IM-QPNY6M";
    const USER: &str = "VAg65x9jNSfO9KQHdd3tfx1vQa8qyCyJ_uj7QcxNLDk";

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[test]
    fn test_dispatch_reads_and_writes() {
        let mut state = ContractState::new("Test", "TST");
        state.balances.insert(addr(ADMIN), 1000);
        let admin = addr(ADMIN);
        let ctx = BlockContext::at(10);

        let res = state
            .execute(&admin, &ActionInput::Lock { qty: 400, lock_length: 5 }, ctx)
            .unwrap();
        assert_eq!(res, None);

        let res = state
            .execute(&admin, &ActionInput::VaultBalance { target: None }, ctx)
            .unwrap();
        assert_eq!(res, Some(ReadResult::Balance { target: admin.clone(), balance: 400 }));

        let res = state
            .execute(&admin, &ActionInput::Balance { target: None }, ctx)
            .unwrap();
        assert_eq!(res, Some(ReadResult::Balance { target: admin.clone(), balance: 1000 }));
    }

    #[test]
    fn test_dispatch_error_leaves_state() {
        let mut state = ContractState::new("Test", "TST");
        state.balances.insert(addr(ADMIN), 1000);
        let before = state.clone();
        let err = state
            .execute(
                &addr(USER),
                &ActionInput::Vote { id: 0, cast: Cast::Yay },
                BlockContext::at(1),
            )
            .unwrap_err();
        assert_eq!(err, ContractError::UnknownProposal(0));
        assert_eq!(state, before);
    }
}
