//! Property Tests
//!
//! Random action sequences over a small set of accounts. Each property is
//! checked after every step, whether the action was accepted or rejected:
//! - Supply conservation (no finalize in the generated ops)
//! - Vault entry shape: balance > 0, end > start
//! - Batch atomicity vs sequential replay, sub-actions bound to the batch caller
//! - Unlock idempotence at a fixed height
//! - Vote tallies never decrease
//! - State root determinism

use proptest::prelude::*;
use vdao_engine::{
    apply, Action, ActionInput, Address, BatchItem, BlockContext, Cast, ContractError,
    ContractState, ProposeInput, VaultEntry,
};

const ACCOUNTS: [&str; 3] = [
    "uhE-QeYS8i4pmUtnxQyHD7dzXFNaJ9oMK-IM-QPNY6M",
    "VAg65x9jNSfO9KQHdd3tfx1vQa8qyCyJ_uj7QcxNLDk",
    "DiFv0MDBxKEFkJEy_KNgJXNG6mxxSTcxgV0h4gzAgsc",
];

fn addr(i: usize) -> Address {
    Address::parse(ACCOUNTS[i]).expect("valid address")
}

#[derive(Debug, Clone)]
enum Op {
    Transfer { from: usize, to: usize, qty: i64 },
    Lock { who: usize, qty: i64, len: i64 },
    IncreaseVault { who: usize, id: u64, len: i64 },
    Unlock { who: usize },
    TransferLocked { from: usize, to: usize, qty: i64, len: i64 },
    Propose { who: usize },
    Vote { who: usize, id: u64, yay: bool },
    Advance(u64),
}

impl Op {
    fn to_action(&self) -> Option<Action> {
        let (caller, input) = match *self {
            Op::Transfer { from, to, qty } => (
                from,
                ActionInput::Transfer { target: ACCOUNTS[to].to_string(), qty },
            ),
            Op::Lock { who, qty, len } => (who, ActionInput::Lock { qty, lock_length: len }),
            Op::IncreaseVault { who, id, len } => {
                (who, ActionInput::IncreaseVault { id, lock_length: len })
            }
            Op::Unlock { who } => (who, ActionInput::Unlock),
            Op::TransferLocked { from, to, qty, len } => (
                from,
                ActionInput::TransferLocked {
                    target: ACCOUNTS[to].to_string(),
                    qty,
                    lock_length: len,
                },
            ),
            Op::Propose { who } => (
                who,
                ActionInput::Propose(ProposeInput {
                    kind: "indicative".to_string(),
                    recipient: None,
                    qty: None,
                    key: None,
                    value: None,
                    note: String::new(),
                }),
            ),
            Op::Vote { who, id, yay } => (
                who,
                ActionInput::Vote { id, cast: if yay { Cast::Yay } else { Cast::Nay } },
            ),
            Op::Advance(_) => return None,
        };
        Some(Action::new(addr(caller), input))
    }
}

fn arb_who() -> impl Strategy<Value = usize> {
    0..ACCOUNTS.len()
}

fn arb_qty() -> impl Strategy<Value = i64> {
    -5i64..1_500
}

fn arb_len() -> impl Strategy<Value = i64> {
    -2i64..40
}

fn arb_action_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (arb_who(), arb_who(), arb_qty()).prop_map(|(from, to, qty)| Op::Transfer { from, to, qty }),
        (arb_who(), arb_qty(), arb_len()).prop_map(|(who, qty, len)| Op::Lock { who, qty, len }),
        (arb_who(), 0u64..4, arb_len()).prop_map(|(who, id, len)| Op::IncreaseVault { who, id, len }),
        arb_who().prop_map(|who| Op::Unlock { who }),
        (arb_who(), arb_who(), arb_qty(), arb_len())
            .prop_map(|(from, to, qty, len)| Op::TransferLocked { from, to, qty, len }),
        arb_who().prop_map(|who| Op::Propose { who }),
        (arb_who(), 0u64..4, any::<bool>()).prop_map(|(who, id, yay)| Op::Vote { who, id, yay }),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => arb_action_op(),
        1 => (1u64..30).prop_map(Op::Advance),
    ]
}

/// Tiga akun @1000 liquid; akun 0 juga punya 500 locked [0, 100).
fn initial_state() -> ContractState {
    let mut state = ContractState::new("Prop", "PRP");
    for i in 0..ACCOUNTS.len() {
        state.balances.insert(addr(i), 1000);
    }
    state.vault.insert(addr(0), vec![VaultEntry::new(500, 0, 100)]);
    state
}

/// Jalankan ops secara berurutan; action yang ditolak dilewati.
fn replay(ops: &[Op]) -> (ContractState, u64) {
    let mut state = initial_state();
    let mut height = 0u64;
    for op in ops {
        match op.to_action() {
            Some(action) => {
                if let Ok(t) = apply(&state, &action, BlockContext::at(height)) {
                    state = t.state;
                }
            }
            None => {
                if let Op::Advance(n) = op {
                    height += n;
                }
            }
        }
    }
    (state, height)
}

fn vault_entries_well_formed(state: &ContractState) -> bool {
    state
        .vault
        .values()
        .flatten()
        .all(|e| e.balance > 0 && e.end > e.start)
}

proptest! {
    #[test]
    fn proptest_supply_conserved(ops in prop::collection::vec(arb_op(), 0..40)) {
        let mut state = initial_state();
        let supply = state.total_supply();
        let mut height = 0u64;
        for op in &ops {
            let Some(action) = op.to_action() else {
                if let Op::Advance(n) = op {
                    height += n;
                }
                continue;
            };
            if let Ok(t) = apply(&state, &action, BlockContext::at(height)) {
                state = t.state;
            }
            prop_assert_eq!(state.total_supply(), supply, "supply must be conserved after {:?}", op);
            prop_assert!(vault_entries_well_formed(&state), "malformed vault after {:?}", op);
        }
    }

    #[test]
    fn proptest_batch_matches_sequential(
        prefix in prop::collection::vec(arb_op(), 0..15),
        who in arb_who(),
        items in prop::collection::vec(arb_action_op(), 0..10),
    ) {
        let (state, height) = replay(&prefix);
        let ctx = BlockContext::at(height);
        let inputs: Vec<ActionInput> = items
            .iter()
            .filter_map(Op::to_action)
            .map(|a| a.input)
            .collect();

        // sequential, all as `who`: stop at the first rejection
        let mut seq = Some(state.clone());
        for input in &inputs {
            let Some(current) = seq.take() else { break };
            let action = Action::new(addr(who), input.clone());
            seq = apply(&current, &action, ctx).ok().map(|t| t.state);
        }

        let transactions: Vec<BatchItem> = inputs.into_iter().map(BatchItem::from).collect();
        let batch = Action::new(addr(who), ActionInput::TransactionBatch { transactions });
        let batched = apply(&state, &batch, ctx).ok().map(|t| t.state);

        prop_assert_eq!(batched, seq);
    }

    #[test]
    fn proptest_failing_tail_rolls_back_batch(
        prefix in prop::collection::vec(arb_op(), 0..15),
        who in arb_who(),
        items in prop::collection::vec(arb_action_op(), 0..10),
    ) {
        let (state, height) = replay(&prefix);
        let mut transactions: Vec<BatchItem> = items
            .iter()
            .filter_map(Op::to_action)
            .map(|a| BatchItem::from(a.input))
            .collect();
        // self-transfer selalu ditolak
        transactions.push(
            ActionInput::Transfer { target: ACCOUNTS[who].to_string(), qty: 1 }.into(),
        );
        let batch = Action::new(addr(who), ActionInput::TransactionBatch { transactions });
        prop_assert!(apply(&state, &batch, BlockContext::at(height)).is_err());
    }

    #[test]
    fn proptest_foreign_item_caller_never_applies(
        prefix in prop::collection::vec(arb_op(), 0..15),
        who in arb_who(),
        other in arb_who(),
        op in arb_action_op(),
    ) {
        prop_assume!(who != other);
        let (state, height) = replay(&prefix);
        let action = op.to_action().expect("action op");
        let item = BatchItem { caller: Some(addr(other)), input: action.input };
        let batch = Action::new(addr(who), ActionInput::TransactionBatch { transactions: vec![item] });
        let err = apply(&state, &batch, BlockContext::at(height)).unwrap_err();
        prop_assert_eq!(err.root_cause(), &ContractError::CallerMismatch(ACCOUNTS[other].to_string()));
    }

    #[test]
    fn proptest_unlock_idempotent(ops in prop::collection::vec(arb_op(), 0..30), who in arb_who()) {
        let (state, height) = replay(&ops);
        let ctx = BlockContext::at(height);
        let action = Action::new(addr(who), ActionInput::Unlock);
        if let Ok(first) = apply(&state, &action, ctx) {
            let second = apply(&first.state, &action, ctx).expect("second unlock");
            prop_assert_eq!(second.state, first.state);
        }
    }

    #[test]
    fn proptest_vote_tallies_monotonic(ops in prop::collection::vec(arb_op(), 0..40)) {
        let mut state = initial_state();
        let mut height = 0u64;
        for op in &ops {
            let before: Vec<(u64, u64, usize)> = state
                .votes
                .iter()
                .map(|p| (p.yays, p.nays, p.voted.len()))
                .collect();
            match op.to_action() {
                Some(action) => {
                    if let Ok(t) = apply(&state, &action, BlockContext::at(height)) {
                        state = t.state;
                    }
                }
                None => {
                    if let Op::Advance(n) = op {
                        height += n;
                    }
                }
            }
            for (p, (yays, nays, voters)) in state.votes.iter().zip(before) {
                prop_assert!(p.yays >= yays && p.nays >= nays);
                prop_assert!(p.voted.len() >= voters);
            }
        }
    }

    #[test]
    fn proptest_state_root_determinism(ops in prop::collection::vec(arb_op(), 0..30)) {
        let (a, _) = replay(&ops);
        let (b, _) = replay(&ops);
        prop_assert_eq!(a.compute_state_root(), b.compute_state_root());
        prop_assert_eq!(a.compute_state_root().to_hex().len(), 128);
    }
}
