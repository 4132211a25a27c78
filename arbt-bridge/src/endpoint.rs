//! Round-robin RPC endpoint selection.
//!
//! Acquisition happens once at startup. The connection returned is reused for
//! the whole run; a transport failure afterwards shows up as a transaction
//! error, never as a reconnect.

use crate::chain::RpcChain;
use crate::error::{BridgeError, Result};
use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use log::{debug, warn};

/// Liveness check for a single endpoint.
#[async_trait]
pub trait EndpointProbe {
    type Connection: Send;

    async fn probe(&self, url: &str) -> Result<Self::Connection>;
}

/// Probes an HTTP JSON-RPC endpoint by asking for the current block number
/// and hands back a chain client over it.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpProbe;

#[async_trait]
impl EndpointProbe for HttpProbe {
    type Connection = RpcChain;

    async fn probe(&self, url: &str) -> Result<RpcChain> {
        let provider = Provider::<Http>::try_from(url)?;
        let block = provider.get_block_number().await?;
        debug!("{} is at block {}", url, block);
        Ok(RpcChain::new(provider))
    }
}

#[derive(Debug, Clone)]
pub struct EndpointSelector {
    endpoints: Vec<String>,
    cursor: usize,
}

impl EndpointSelector {
    pub fn new(endpoints: Vec<String>) -> Self {
        EndpointSelector {
            endpoints,
            cursor: 0,
        }
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Index of the endpoint the next acquisition starts from.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Try each endpoint at most once, starting at the cursor, and return the
    /// first one that answers the probe.
    pub async fn acquire<P>(&mut self, probe: &P) -> Result<P::Connection>
    where
        P: EndpointProbe + Sync,
    {
        let total = self.endpoints.len();

        for _ in 0..total {
            let url = &self.endpoints[self.cursor];
            self.cursor = (self.cursor + 1) % total;

            match probe.probe(url).await {
                Ok(connection) => {
                    println!("✓ Using RPC: {}", url);
                    return Ok(connection);
                }
                Err(e) => {
                    println!("✗ RPC failed: {}, trying next...", url);
                    warn!("probe of {} failed: {}", url, e);
                }
            }
        }

        Err(BridgeError::NoReachableEndpoint { tried: total })
    }
}
