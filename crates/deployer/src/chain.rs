//! Boundary to the blockchain node.
//!
//! The [`Chain`] trait abstracts the node interactions of a deployment so the
//! deployment procedure can be unit tested with mocks.

use {
    alloy::{
        network::{ReceiptResponse, TransactionBuilder},
        primitives::{Address, B256, Bytes, U256},
        providers::Provider,
        rpc::types::TransactionRequest,
        signers::local::PrivateKeySigner,
    },
    anyhow::{Context, Result},
    ethrpc::{AlloyProvider, Credentials},
    std::time::Duration,
    url::Url,
};

/// Outcome of a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// Whether the transaction executed without reverting.
    pub success: bool,
    /// Address of the created contract, if the transaction created one.
    pub contract_address: Option<Address>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Chain: Send + Sync {
    async fn chain_id(&self) -> Result<u64>;

    /// Accounts that can sign transactions, in order of preference.
    async fn signers(&self) -> Result<Vec<Address>>;

    async fn balance(&self, account: Address) -> Result<U256>;

    /// Sends a contract creation transaction and returns its hash without
    /// waiting for it to be mined.
    async fn submit_deployment(&self, from: Address, init_code: Bytes) -> Result<B256>;

    /// Blocks until the transaction has `confirmations` confirmations or
    /// `timeout` elapsed.
    async fn wait_for_confirmation(
        &self,
        tx_hash: B256,
        confirmations: u64,
        timeout: Duration,
    ) -> Result<Receipt>;
}

/// How often the node is asked whether a transaction got confirmed.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// [`Chain`] implementation backed by an RPC node.
pub struct Node {
    provider: AlloyProvider,
    local_signers: Vec<Address>,
    poll_interval: Duration,
}

impl Node {
    /// Connects to the node at `url`, signing with the accounts derived from
    /// `credentials`. Without credentials the node's own accounts are used.
    pub fn new(url: &Url, credentials: &Credentials) -> Result<Self> {
        let signers = credentials.signers().context("could not load signers")?;
        let local_signers = signers.iter().map(PrivateKeySigner::address).collect();
        Ok(Self::with_provider(
            ethrpc::provider(url, ethrpc::wallet(signers)),
            local_signers,
        ))
    }

    pub fn with_provider(provider: AlloyProvider, local_signers: Vec<Address>) -> Self {
        Self {
            provider,
            local_signers,
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(self, poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..self
        }
    }

    /// Polls until the transaction is mined and `confirmations` blocks (the
    /// one containing it included) exist.
    async fn confirmed_receipt(&self, tx_hash: B256, confirmations: u64) -> Result<Receipt> {
        let receipt = loop {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .with_context(|| format!("could not fetch receipt of {tx_hash}"))?;
            match receipt {
                Some(receipt) => break receipt,
                None => tokio::time::sleep(self.poll_interval).await,
            }
        };
        let receipt = Receipt {
            transaction_hash: receipt.transaction_hash(),
            block_number: receipt.block_number(),
            gas_used: receipt.gas_used(),
            success: receipt.status(),
            contract_address: receipt.contract_address(),
        };
        tracing::debug!(?tx_hash, block = ?receipt.block_number, "transaction mined");

        if confirmations > 1 {
            let mined = receipt
                .block_number
                .with_context(|| format!("receipt of {tx_hash} has no block number"))?;
            let target = mined.saturating_add(confirmations - 1);
            loop {
                let current = self
                    .provider
                    .get_block_number()
                    .await
                    .context("could not fetch current block number")?;
                if current >= target {
                    break;
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        }
        Ok(receipt)
    }
}

/// Contract creation transaction sent by `from`. Gas, fees and nonce are left
/// to the provider's fillers or the node.
fn deployment_request(from: Address, init_code: Bytes) -> TransactionRequest {
    TransactionRequest::default()
        .from(from)
        .with_deploy_code(init_code)
}

#[async_trait::async_trait]
impl Chain for Node {
    async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .context("could not fetch current chain id")
    }

    async fn signers(&self) -> Result<Vec<Address>> {
        if !self.local_signers.is_empty() {
            return Ok(self.local_signers.clone());
        }
        self.provider
            .get_accounts()
            .await
            .context("could not fetch accounts managed by the node")
    }

    async fn balance(&self, account: Address) -> Result<U256> {
        self.provider
            .get_balance(account)
            .await
            .with_context(|| format!("could not fetch balance of {account}"))
    }

    async fn submit_deployment(&self, from: Address, init_code: Bytes) -> Result<B256> {
        let pending = self
            .provider
            .send_transaction(deployment_request(from, init_code))
            .await
            .context("failed to submit deployment transaction")?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_confirmation(
        &self,
        tx_hash: B256,
        confirmations: u64,
        timeout: Duration,
    ) -> Result<Receipt> {
        tokio::time::timeout(timeout, self.confirmed_receipt(tx_hash, confirmations))
            .await
            .with_context(|| format!("transaction {tx_hash} was not confirmed within {timeout:?}"))?
    }
}
