use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde_json::json;
use solana_account_decoder::{UiAccountEncoding, UiDataSliceConfig};
use solana_client::{
    client_error::ClientError,
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcBlockConfig},
    rpc_request::RpcRequest,
    rpc_response::Response,
};
use solana_sdk::{
    clock::Slot,
    commitment_config::{CommitmentConfig, CommitmentLevel},
    pubkey::Pubkey,
};
use solana_transaction_status::{TransactionDetails, UiTransactionEncoding};
use tracing::{debug, warn};

use crate::config::ReaderConfig;
use crate::error::{ReaderError, ReaderResult};
use crate::reader::{AccountReader, Reader};
use crate::types::{
    block_commitment, AccountInfo, AccountInfoOptions, ChainId, LatestBlock, LatestBlockhash,
};

/// [`Reader`] backed by a Solana JSON-RPC node
pub struct RpcReader {
    rpc: Arc<RpcClient>,
    commitment: CommitmentLevel,
    timeout: Duration,
}

impl RpcReader {
    pub fn new(rpc: Arc<RpcClient>, commitment: CommitmentLevel, timeout: Duration) -> Self {
        Self {
            rpc,
            commitment,
            timeout,
        }
    }

    /// Build a reader with its own RPC client from configuration
    pub fn from_config(config: &ReaderConfig) -> ReaderResult<Self> {
        config.validate()?;
        let commitment = config.commitment_level()?;
        let timeout = config.request_timeout();
        let rpc = RpcClient::new_with_timeout_and_commitment(
            config.rpc_url.clone(),
            timeout,
            CommitmentConfig { commitment },
        );
        Ok(Self::new(Arc::new(rpc), commitment, timeout))
    }

    /// Get the RPC client
    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    pub fn commitment(&self) -> CommitmentLevel {
        self.commitment
    }

    /// Get the RPC endpoint URL
    pub fn url(&self) -> String {
        self.rpc.url()
    }

    fn commitment_config(&self) -> CommitmentConfig {
        CommitmentConfig {
            commitment: self.commitment,
        }
    }

    /// Run one RPC call under the request timeout
    async fn call<T, F>(&self, method: &'static str, request: F) -> ReaderResult<T>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        debug!(method, "rpc call");
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                warn!(method, error = %err, "rpc call failed");
                Err(err.into())
            }
            Err(_) => {
                warn!(method, timeout = ?self.timeout, "rpc call timed out");
                Err(ReaderError::Timeout {
                    method,
                    after: self.timeout,
                })
            }
        }
    }
}

/// Reject messages that can never be a serialized transaction message
pub(crate) fn validate_message(msg: &str) -> ReaderResult<()> {
    if msg.is_empty() {
        return Err(ReaderError::InvalidMessage("empty message".to_string()));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(msg)
        .map_err(|e| ReaderError::InvalidMessage(format!("not valid base64: {}", e)))?;
    if bytes.is_empty() {
        return Err(ReaderError::InvalidMessage("empty message".to_string()));
    }
    Ok(())
}

#[async_trait]
impl AccountReader for RpcReader {
    async fn get_account_info_with_opts(
        &self,
        address: &Pubkey,
        opts: AccountInfoOptions,
    ) -> ReaderResult<AccountInfo> {
        let config = RpcAccountInfoConfig {
            encoding: Some(UiAccountEncoding::Base64),
            data_slice: opts.data_slice.map(|slice| UiDataSliceConfig {
                offset: slice.offset,
                length: slice.length,
            }),
            commitment: Some(CommitmentConfig {
                commitment: opts.commitment.unwrap_or(self.commitment),
            }),
            min_context_slot: opts.min_context_slot,
        };

        let response = self
            .call(
                "getAccountInfo",
                self.rpc.get_account_with_config(address, config),
            )
            .await?;

        Ok(AccountInfo {
            context_slot: response.context.slot,
            account: response.value,
        })
    }
}

#[async_trait]
impl Reader for RpcReader {
    async fn balance(&self, address: &Pubkey) -> ReaderResult<u64> {
        let response = self
            .call(
                "getBalance",
                self.rpc
                    .get_balance_with_commitment(address, self.commitment_config()),
            )
            .await?;
        Ok(response.value)
    }

    async fn slot_height(&self) -> ReaderResult<Slot> {
        self.call(
            "getSlot",
            self.rpc.get_slot_with_commitment(self.commitment_config()),
        )
        .await
    }

    async fn latest_blockhash(&self) -> ReaderResult<LatestBlockhash> {
        let (blockhash, last_valid_block_height) = self
            .call(
                "getLatestBlockhash",
                self.rpc
                    .get_latest_blockhash_with_commitment(self.commitment_config()),
            )
            .await?;

        Ok(LatestBlockhash {
            blockhash,
            last_valid_block_height,
        })
    }

    async fn chain_id(&self) -> ReaderResult<ChainId> {
        let genesis_hash = self
            .call("getGenesisHash", self.rpc.get_genesis_hash())
            .await?;
        let chain_id = ChainId::from_genesis_hash(&genesis_hash);
        if chain_id == ChainId::Localnet {
            warn!(%genesis_hash, "unknown genesis hash, assuming localnet");
        } else {
            debug!(%genesis_hash, %chain_id, "resolved chain id");
        }
        Ok(chain_id)
    }

    async fn get_fee_for_message(&self, msg: &str) -> ReaderResult<u64> {
        validate_message(msg)?;

        let response: Response<Option<u64>> = self
            .call(
                "getFeeForMessage",
                self.rpc.send(
                    RpcRequest::GetFeeForMessage,
                    json!([msg, self.commitment_config()]),
                ),
            )
            .await?;

        response.value.ok_or(ReaderError::FeeUnavailable)
    }

    async fn get_latest_block(&self) -> ReaderResult<LatestBlock> {
        let commitment = block_commitment(self.commitment);

        let slot = self
            .call("getSlot", self.rpc.get_slot_with_commitment(commitment))
            .await?;

        let config = RpcBlockConfig {
            encoding: Some(UiTransactionEncoding::Base64),
            transaction_details: Some(TransactionDetails::Full),
            rewards: Some(false),
            commitment: Some(commitment),
            max_supported_transaction_version: Some(0),
        };

        let block = self
            .call("getBlock", self.rpc.get_block_with_config(slot, config))
            .await?;

        Ok(LatestBlock { slot, block })
    }
}
