//! Read-only accessors for a Solana node
//!
//! [`Reader`] is the surface consumers depend on; it extends [`AccountReader`]
//! so anything that can read chain state can also read raw accounts.

use async_trait::async_trait;
use solana_sdk::{clock::Slot, pubkey::Pubkey};

use crate::error::ReaderResult;
use crate::types::{AccountInfo, AccountInfoOptions, ChainId, LatestBlock, LatestBlockhash};

/// Raw account access
#[async_trait]
pub trait AccountReader: Send + Sync {
    /// Fetch an account. A missing account is `Ok` with `account: None`.
    async fn get_account_info_with_opts(
        &self,
        address: &Pubkey,
        opts: AccountInfoOptions,
    ) -> ReaderResult<AccountInfo>;
}

/// Chain state reads
#[async_trait]
pub trait Reader: AccountReader {
    /// Balance of an address in lamports
    async fn balance(&self, address: &Pubkey) -> ReaderResult<u64>;

    /// Current slot
    async fn slot_height(&self) -> ReaderResult<Slot>;

    /// Most recent blockhash and the last block height it is valid for
    async fn latest_blockhash(&self) -> ReaderResult<LatestBlockhash>;

    /// Cluster identifier derived from the genesis hash
    async fn chain_id(&self) -> ReaderResult<ChainId>;

    /// Fee in lamports for a base64-encoded serialized message
    async fn get_fee_for_message(&self, msg: &str) -> ReaderResult<u64>;

    /// Most recent block at the reader's commitment, with its slot
    async fn get_latest_block(&self) -> ReaderResult<LatestBlock>;
}
