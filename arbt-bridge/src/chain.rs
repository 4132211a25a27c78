use crate::error::{BridgeError, Result};
use async_trait::async_trait;
use ethers::{
    core::types::{transaction::eip2718::TypedTransaction, Address, H256, U256},
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
};
use log::info;
use std::future::Future;
use tokio::sync::OnceCell;

/// The chain operations the submission loop needs.
#[async_trait]
pub trait BridgeChain {
    async fn balance(&self, address: Address) -> Result<U256>;

    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256>;

    /// Sign with `wallet` and broadcast. Returns as soon as the node accepts
    /// the transaction; inclusion is not awaited.
    async fn send(&self, wallet: &LocalWallet, tx: TypedTransaction) -> Result<H256>;
}

/// Chain id looked up on first use and kept once known. A failed lookup
/// leaves the cache empty so the next call asks again.
#[derive(Debug, Clone, Default)]
pub struct ChainIdCache {
    cell: OnceCell<u64>,
}

impl ChainIdCache {
    pub fn new() -> Self {
        ChainIdCache::default()
    }

    pub fn get(&self) -> Option<u64> {
        self.cell.get().copied()
    }

    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<u64>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<u64>>,
    {
        self.cell.get_or_try_init(fetch).await.copied()
    }
}

/// [`BridgeChain`] over an HTTP JSON-RPC provider.
#[derive(Debug, Clone)]
pub struct RpcChain {
    provider: Provider<Http>,
    chain_id: ChainIdCache,
}

impl RpcChain {
    /// No network call is made here; the chain id is resolved by the first send.
    pub fn new(provider: Provider<Http>) -> Self {
        RpcChain {
            provider,
            chain_id: ChainIdCache::new(),
        }
    }

    pub fn provider(&self) -> &Provider<Http> {
        &self.provider
    }

    async fn chain_id(&self) -> Result<u64> {
        self.chain_id
            .get_or_fetch(|| async {
                let chain_id = self.provider.get_chainid().await?.as_u64();
                info!("Connected to chain ID: {}", chain_id);
                Ok(chain_id)
            })
            .await
    }
}

#[async_trait]
impl BridgeChain for RpcChain {
    async fn balance(&self, address: Address) -> Result<U256> {
        Ok(self.provider.get_balance(address, None).await?)
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256> {
        Ok(self.provider.estimate_gas(tx, None).await?)
    }

    async fn send(&self, wallet: &LocalWallet, tx: TypedTransaction) -> Result<H256> {
        let chain_id = self.chain_id().await?;
        let wallet = wallet.clone().with_chain_id(chain_id);
        let client = SignerMiddleware::new(self.provider.clone(), wallet);

        let pending_tx = client
            .send_transaction(tx, None)
            .await
            .map_err(|e| BridgeError::Transaction(format!("Failed to send transaction: {}", e)))?;

        Ok(pending_tx.tx_hash())
    }
}
