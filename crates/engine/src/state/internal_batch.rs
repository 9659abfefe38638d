//! Atomic batch execution
//! Sub-action dijalankan berurutan di working copy; commit hanya jika semua sukses.

use crate::action::{BatchItem, ReadResult};
use crate::error::ContractError;
use crate::types::{Address, BlockContext};
use super::ContractState;

impl ContractState {
    /// Jalankan `transactions` sebagai satu unit all-or-nothing.
    ///
    /// # Langkah (URUT)
    ///
    /// 1. Clone state menjadi working copy
    /// 2. Untuk setiap item (urut): semua sub-action jalan sebagai caller
    ///    batch. `item.caller`, jika ada, wajib sama (`CallerMismatch`).
    ///    Dispatch ke working copy, kumpulkan read result
    /// 3. Gagal pertama → `BatchSubActionFailed { index, source }`,
    ///    working copy dibuang, `self` tidak berubah
    /// 4. Semua sukses → working copy menggantikan `self`
    pub(crate) fn execute_batch(
        &mut self,
        caller: &Address,
        transactions: &[BatchItem],
        ctx: BlockContext,
    ) -> Result<ReadResult, ContractError> {
        let mut working = self.clone();
        let mut results = Vec::new();

        for (index, item) in transactions.iter().enumerate() {
            let outcome = match &item.caller {
                Some(claimed) if claimed != caller => {
                    Err(ContractError::CallerMismatch(claimed.to_string()))
                }
                _ => working.execute(caller, &item.input, ctx),
            };
            match outcome {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(source) => {
                    tracing::debug!(index, error = %source, "batch aborted");
                    return Err(ContractError::BatchSubActionFailed {
                        index,
                        source: Box::new(source),
                    });
                }
            }
        }

        *self = working;
        tracing::debug!(
            actions = transactions.len(),
            reads = results.len(),
            "batch committed"
        );
        Ok(ReadResult::Batch { results })
    }
}
