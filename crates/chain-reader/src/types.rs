use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use solana_sdk::{
    account::Account,
    clock::Slot,
    commitment_config::{CommitmentConfig, CommitmentLevel},
    hash::Hash,
};
use solana_transaction_status::UiConfirmedBlock;

use crate::error::{ReaderError, ReaderResult};

/// Genesis hash of mainnet-beta
pub const MAINNET_GENESIS_HASH: &str = "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdpKuc147dw2N9d";
/// Genesis hash of devnet
pub const DEVNET_GENESIS_HASH: &str = "EtWTRABZaYq6iMfeYKouRu166VU2xqa1wcaWoxPkrZBG";
/// Genesis hash of testnet
pub const TESTNET_GENESIS_HASH: &str = "4uhcVJyU9pJkvQyS88uRDiswHXSCkY3zQawwpjk2NsNY";

/// Cluster a node belongs to, identified by its genesis hash
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainId {
    Mainnet,
    Devnet,
    Testnet,
    Localnet,
}

impl ChainId {
    /// Map a genesis hash to a cluster. Unknown hashes are treated as a local validator.
    pub fn from_genesis_hash(hash: &Hash) -> Self {
        match hash.to_string().as_str() {
            MAINNET_GENESIS_HASH => ChainId::Mainnet,
            DEVNET_GENESIS_HASH => ChainId::Devnet,
            TESTNET_GENESIS_HASH => ChainId::Testnet,
            _ => ChainId::Localnet,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainId::Mainnet => "mainnet",
            ChainId::Devnet => "devnet",
            ChainId::Testnet => "testnet",
            ChainId::Localnet => "localnet",
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainId {
    type Err = ReaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(ChainId::Mainnet),
            "devnet" => Ok(ChainId::Devnet),
            "testnet" => Ok(ChainId::Testnet),
            "localnet" => Ok(ChainId::Localnet),
            other => Err(ReaderError::InvalidConfig(format!("unknown chain id: {}", other))),
        }
    }
}

/// Latest blockhash as reported by the node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LatestBlockhash {
    pub blockhash: Hash,
    /// Last block height at which a transaction using this blockhash is still accepted
    pub last_valid_block_height: u64,
}

/// Most recent block at the reader's commitment, with the slot it was produced in
#[derive(Clone, Debug)]
pub struct LatestBlock {
    pub slot: Slot,
    pub block: UiConfirmedBlock,
}

/// Account lookup result
#[derive(Clone, Debug, PartialEq)]
pub struct AccountInfo {
    /// Slot of the response context
    pub context_slot: Slot,
    /// `None` when the account does not exist
    pub account: Option<Account>,
}

/// Byte range of account data to return
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataSlice {
    pub offset: usize,
    pub length: usize,
}

/// Options for account lookups
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccountInfoOptions {
    /// Overrides the reader's commitment
    pub commitment: Option<CommitmentLevel>,
    pub data_slice: Option<DataSlice>,
    pub min_context_slot: Option<Slot>,
}

impl AccountInfoOptions {
    pub fn with_commitment(mut self, commitment: CommitmentLevel) -> Self {
        self.commitment = Some(commitment);
        self
    }

    pub fn with_data_slice(mut self, offset: usize, length: usize) -> Self {
        self.data_slice = Some(DataSlice { offset, length });
        self
    }

    pub fn with_min_context_slot(mut self, slot: Slot) -> Self {
        self.min_context_slot = Some(slot);
        self
    }
}

/// Parse a commitment level from its lowercase name
pub fn parse_commitment(value: &str) -> ReaderResult<CommitmentLevel> {
    match value {
        "processed" => Ok(CommitmentLevel::Processed),
        "confirmed" => Ok(CommitmentLevel::Confirmed),
        "finalized" => Ok(CommitmentLevel::Finalized),
        other => Err(ReaderError::InvalidConfig(format!(
            "unknown commitment '{}', expected processed, confirmed or finalized",
            other
        ))),
    }
}

/// `getBlock` rejects `processed`, so block reads use at least `confirmed`
pub fn block_commitment(commitment: CommitmentLevel) -> CommitmentConfig {
    match commitment {
        CommitmentLevel::Processed => CommitmentConfig::confirmed(),
        other => CommitmentConfig { commitment: other },
    }
}
