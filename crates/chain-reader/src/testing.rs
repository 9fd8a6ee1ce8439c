//! In-memory reader for tests
//!
//! [`MockReader`] answers every read from state set by the test, without a node.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::json;
use solana_sdk::{account::Account, clock::Slot, hash::Hash, pubkey::Pubkey};
use solana_transaction_status::UiConfirmedBlock;

use crate::client::validate_message;
use crate::error::{ReaderError, ReaderResult};
use crate::reader::{AccountReader, Reader};
use crate::types::{AccountInfo, AccountInfoOptions, ChainId, LatestBlock, LatestBlockhash};

#[derive(Debug)]
struct MockState {
    balances: HashMap<Pubkey, u64>,
    accounts: HashMap<Pubkey, Account>,
    slot: Slot,
    blockhash: LatestBlockhash,
    genesis_hash: Hash,
    fee: Option<u64>,
    block: Option<UiConfirmedBlock>,
    failing: bool,
    calls: usize,
}

/// Reader whose answers are configured by the caller
#[derive(Debug)]
pub struct MockReader {
    state: Mutex<MockState>,
}

impl MockReader {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                balances: HashMap::new(),
                accounts: HashMap::new(),
                slot: 1,
                blockhash: LatestBlockhash {
                    blockhash: Hash::new_from_array([1u8; 32]),
                    last_valid_block_height: 151,
                },
                genesis_hash: Hash::default(),
                fee: Some(5_000),
                block: None,
                failing: false,
                calls: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count the call and fail it when the failure switch is on
    fn enter(&self) -> ReaderResult<MutexGuard<'_, MockState>> {
        let mut state = self.state();
        state.calls += 1;
        if state.failing {
            return Err(ReaderError::Rpc("mock reader failure".to_string()));
        }
        Ok(state)
    }

    pub fn set_balance(&self, address: Pubkey, lamports: u64) {
        self.state().balances.insert(address, lamports);
    }

    pub fn set_account(&self, address: Pubkey, account: Account) {
        self.state().accounts.insert(address, account);
    }

    pub fn set_slot(&self, slot: Slot) {
        self.state().slot = slot;
    }

    pub fn advance_slot(&self, by: Slot) {
        let mut state = self.state();
        state.slot = state.slot.saturating_add(by);
    }

    pub fn set_blockhash(&self, blockhash: Hash, last_valid_block_height: u64) {
        self.state().blockhash = LatestBlockhash {
            blockhash,
            last_valid_block_height,
        };
    }

    pub fn set_genesis_hash(&self, hash: Hash) {
        self.state().genesis_hash = hash;
    }

    /// `None` mimics a node that cannot price the message
    pub fn set_fee(&self, fee: Option<u64>) {
        self.state().fee = fee;
    }

    pub fn set_block(&self, block: UiConfirmedBlock) {
        self.state().block = Some(block);
    }

    /// While on, every read fails with an RPC error
    pub fn set_failing(&self, failing: bool) {
        self.state().failing = failing;
    }

    /// Number of reads served, failed ones included
    pub fn call_count(&self) -> usize {
        self.state().calls
    }
}

impl Default for MockReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Block with no transactions at `slot`
fn empty_block(slot: Slot, blockhash: &Hash) -> ReaderResult<UiConfirmedBlock> {
    serde_json::from_value(json!({
        "previousBlockhash": Hash::default().to_string(),
        "blockhash": blockhash.to_string(),
        "parentSlot": slot.saturating_sub(1),
        "transactions": [],
        "blockTime": null,
        "blockHeight": slot,
    }))
    .map_err(ReaderError::from)
}

#[async_trait]
impl AccountReader for MockReader {
    async fn get_account_info_with_opts(
        &self,
        address: &Pubkey,
        opts: AccountInfoOptions,
    ) -> ReaderResult<AccountInfo> {
        let state = self.enter()?;
        if let Some(min) = opts.min_context_slot {
            if state.slot < min {
                return Err(ReaderError::Rpc(format!(
                    "minimum context slot {} not reached, node at {}",
                    min, state.slot
                )));
            }
        }

        let account = state.accounts.get(address).cloned().map(|mut account| {
            if let Some(slice) = opts.data_slice {
                let start = slice.offset.min(account.data.len());
                let end = start.saturating_add(slice.length).min(account.data.len());
                account.data = account.data[start..end].to_vec();
            }
            account
        });

        Ok(AccountInfo {
            context_slot: state.slot,
            account,
        })
    }
}

#[async_trait]
impl Reader for MockReader {
    async fn balance(&self, address: &Pubkey) -> ReaderResult<u64> {
        let state = self.enter()?;
        Ok(state.balances.get(address).copied().unwrap_or_default())
    }

    async fn slot_height(&self) -> ReaderResult<Slot> {
        Ok(self.enter()?.slot)
    }

    async fn latest_blockhash(&self) -> ReaderResult<LatestBlockhash> {
        Ok(self.enter()?.blockhash)
    }

    async fn chain_id(&self) -> ReaderResult<ChainId> {
        let state = self.enter()?;
        Ok(ChainId::from_genesis_hash(&state.genesis_hash))
    }

    async fn get_fee_for_message(&self, msg: &str) -> ReaderResult<u64> {
        let state = self.enter()?;
        validate_message(msg)?;
        state.fee.ok_or(ReaderError::FeeUnavailable)
    }

    async fn get_latest_block(&self) -> ReaderResult<LatestBlock> {
        let state = self.enter()?;
        let block = match &state.block {
            Some(block) => block.clone(),
            None => empty_block(state.slot, &state.blockhash.blockhash)?,
        };
        Ok(LatestBlock {
            slot: state.slot,
            block,
        })
    }
}
