//! Transaction building, signing, broadcast and confirmation monitoring.
//!
//! # Responsibilities
//! - Apply the gas multiplier to the aggregator's suggestion
//! - Sign a legacy transaction with the wallet key
//! - Broadcast once, never retry
//! - Poll for the receipt within a bounded wait

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{Ethereum, TransactionBuilder};
use alloy::primitives::{Bytes, TxHash};
use alloy::rpc::types::TransactionRequest;
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::aggregator::SwapPayload;
use crate::blockchain::client::BlockchainClient;
use crate::blockchain::gas::GasMultiplier;
use crate::blockchain::types::{BlockchainError, BlockchainResult, TxReceipt};
use crate::blockchain::wallet::Wallet;

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// A transaction signed and ready for broadcast.
#[derive(Debug, Clone)]
pub struct SignedTx {
    pub tx_hash: TxHash,
    pub raw: Bytes,
}

/// Signs and submits swap payloads.
#[derive(Debug, Clone)]
pub struct TxSubmitter {
    client: BlockchainClient,
    wallet: Wallet,
    multiplier: GasMultiplier,
}

impl TxSubmitter {
    /// Create a new submitter.
    pub fn new(client: BlockchainClient, wallet: Wallet, multiplier: GasMultiplier) -> Self {
        Self {
            client,
            wallet,
            multiplier,
        }
    }

    /// Build the transaction request for a payload.
    ///
    /// Gas limit and gas price are both scaled by the multiplier (floor).
    /// `nonce` is the account's next pending nonce.
    pub fn build(&self, payload: &SwapPayload, nonce: u64) -> BlockchainResult<TransactionRequest> {
        let gas_limit = self.multiplier.apply_gas_limit(payload.gas_limit);
        let gas_price = self.multiplier.apply_gas_price(payload.gas_price);

        // The cap is compared in wei; a fraction of a gwei over still counts
        let max_gwei = self.client.config().max_gas_price_gwei;
        let max_wei = u128::from(max_gwei).saturating_mul(WEI_PER_GWEI);
        if gas_price > max_wei {
            return Err(BlockchainError::GasPriceTooHigh {
                gas_price_wei: gas_price,
                max_gwei,
            });
        }

        tracing::debug!(
            suggested_gas_limit = payload.gas_limit,
            gas_limit = gas_limit,
            suggested_gas_price = payload.gas_price,
            gas_price = gas_price,
            multiplier = %self.multiplier,
            "Applied gas multiplier"
        );

        let tx = TransactionRequest::default()
            .with_from(self.wallet.address())
            .with_to(payload.to)
            .with_value(payload.value)
            .with_input(payload.data.clone())
            .with_nonce(nonce)
            .with_gas_price(gas_price)
            .with_chain_id(self.wallet.chain_id())
            .with_gas_limit(gas_limit);

        Ok(tx)
    }

    /// Sign a transaction request with the wallet key.
    pub async fn sign(&self, tx: TransactionRequest) -> BlockchainResult<SignedTx> {
        let wallet = self.wallet.ethereum_wallet();
        let envelope = <TransactionRequest as TransactionBuilder<Ethereum>>::build(tx, &wallet)
            .await
            .map_err(|e| BlockchainError::Signing(e.to_string()))?;

        Ok(SignedTx {
            tx_hash: *envelope.tx_hash(),
            raw: envelope.encoded_2718().into(),
        })
    }

    /// Build, sign and broadcast a swap. Consumes the payload.
    pub async fn submit(&self, payload: SwapPayload) -> BlockchainResult<TxHash> {
        let nonce = self.client.get_transaction_count(self.wallet.address()).await?;

        let tx = self.build(&payload, nonce)?;
        drop(payload);
        let signed = self.sign(tx).await?;

        tracing::info!(
            tx_hash = %signed.tx_hash,
            nonce = nonce,
            from = %self.wallet.address(),
            "Broadcasting swap transaction"
        );

        let tx_hash = self.client.send_raw_transaction(&signed.raw, signed.tx_hash).await?;
        if tx_hash != signed.tx_hash {
            tracing::warn!(
                local = %signed.tx_hash,
                node = %tx_hash,
                "Node reported a different transaction hash"
            );
        }
        Ok(tx_hash)
    }

    /// Wait for a transaction to be confirmed.
    ///
    /// Polls until the receipt is `confirmation_blocks` deep or
    /// `confirmation_timeout_secs` elapses. RPC errors while polling are
    /// logged and polling continues; the transaction is never resent.
    pub async fn wait_for_confirmation(&self, tx_hash: TxHash) -> BlockchainResult<TxReceipt> {
        let config = self.client.config();
        let required_confirmations = self.client.confirmation_blocks().max(1);
        let timeout_secs = config.confirmation_timeout_secs;
        let poll_interval = Duration::from_millis(config.poll_interval_ms);

        let result = timeout(Duration::from_secs(timeout_secs), async {
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                // Get the receipt
                let receipt = match self.client.get_transaction_receipt(tx_hash).await {
                    Ok(Some(r)) => r,
                    Ok(None) => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt lookup failed");
                        continue;
                    }
                };

                let current_block = match self.client.get_block_number().await {
                    Ok(b) => b,
                    Err(e) => {
                        tracing::warn!(tx_hash = %tx_hash, error = %e, "Block number lookup failed");
                        continue;
                    }
                };
                let tx_block = receipt.block_number.unwrap_or(current_block);

                // Check if transaction succeeded
                if !receipt.status() {
                    return Err(BlockchainError::Reverted {
                        tx_hash,
                        block_number: tx_block,
                    });
                }

                // The inclusion block counts as the first confirmation
                let depth = current_block.saturating_sub(tx_block).saturating_add(1);
                let confirmations = u32::try_from(depth).unwrap_or(u32::MAX);

                if confirmations >= required_confirmations {
                    return Ok(TxReceipt {
                        tx_hash,
                        block_number: tx_block,
                        gas_used: receipt.gas_used,
                        confirmations,
                    });
                }

                tracing::debug!(
                    tx_hash = %tx_hash,
                    confirmations = confirmations,
                    required = required_confirmations,
                    "Waiting for confirmations"
                );
            }
        })
        .await;

        match result {
            Ok(status) => status,
            Err(_) => Err(BlockchainError::ConfirmationTimeout {
                tx_hash,
                waited_secs: timeout_secs,
            }),
        }
    }

    /// Get the wallet address.
    pub fn address(&self) -> alloy::primitives::Address {
        self.wallet.address()
    }
}
