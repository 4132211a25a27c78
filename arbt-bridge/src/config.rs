//! Constants, the endpoint/contract table and the private key list.

use crate::error::{BridgeError, Result};
use ethers::{
    core::types::{Address, U256},
    signers::LocalWallet,
};
use serde::{Deserialize, Serialize};
use std::{fs::File, path::Path, str::FromStr, time::Duration};
use url::Url;

/// Wallets holding less than this are considered unfunded (0.01 ETH).
pub const MIN_BALANCE_WEI: u64 = 10_000_000_000_000_000;
/// Value attached to every bridge order (0.01 ETH).
pub const BRIDGE_VALUE_WEI: u64 = 10_000_000_000_000_000;
/// Fixed legacy gas price (0.1 gwei).
pub const GAS_PRICE_WEI: u64 = 100_000_000;
pub const TX_DELAY: Duration = Duration::from_secs(30);

pub const EXPLORER_TX_URL: &str = "https://sepolia-explorer.arbitrum.io/tx/";
pub const PRICER_URL: &str = "https://pricer.t1rn.io/estimate";

pub const DEFAULT_KEYS_FILE: &str = "privateKeys.json";
pub const DEFAULT_LOG_FILE: &str = "ARBT_TX_HASH.txt";

const BRIDGE_CONTRACT: &str = "0x8D86c3573928CE125f9b2df59918c383aa2B514D";

const DEFAULT_RPC_URLS: [&str; 4] = [
    "https://sepolia-rollup.arbitrum.io/rpc",
    "https://arbitrum-sepolia-rpc.publicnode.com",
    "https://arbitrum-sepolia.blockpi.network/v1/rpc/public",
    "https://endpoints.omniatech.io/v1/arbitrum/sepolia/public",
];

pub fn min_balance() -> U256 {
    U256::from(MIN_BALANCE_WEI)
}

pub fn bridge_value() -> U256 {
    U256::from(BRIDGE_VALUE_WEI)
}

pub fn gas_price() -> U256 {
    U256::from(GAS_PRICE_WEI)
}

/// One row of the endpoint table: an Arbitrum Sepolia RPC and the bridge
/// contract deployed there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRecord {
    pub rpc_url: String,
    pub contract: String,
}

#[derive(Debug, Clone)]
pub struct EndpointTable {
    records: Vec<EndpointRecord>,
}

impl EndpointTable {
    pub fn builtin() -> Self {
        let records = DEFAULT_RPC_URLS
            .iter()
            .map(|rpc| EndpointRecord {
                rpc_url: rpc.to_string(),
                contract: BRIDGE_CONTRACT.to_string(),
            })
            .collect();
        EndpointTable { records }
    }

    pub fn from_records(records: Vec<EndpointRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(BridgeError::Config("endpoint table is empty".to_string()));
        }
        for record in &records {
            Url::parse(&record.rpc_url)?;
            parse_address(&record.contract)?;
        }
        Ok(EndpointTable { records })
    }

    /// Load a JSON array of `{ "rpc_url", "contract" }` records.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let records: Vec<EndpointRecord> = serde_json::from_reader(file)?;
        Self::from_records(records)
    }

    pub fn records(&self) -> &[EndpointRecord] {
        &self.records
    }

    pub fn rpc_urls(&self) -> Vec<String> {
        self.records.iter().map(|r| r.rpc_url.clone()).collect()
    }

    /// The last record's contract is the one every route sends to.
    pub fn bridge_contract(&self) -> Result<Address> {
        let record = self
            .records
            .last()
            .ok_or_else(|| BridgeError::Config("endpoint table is empty".to_string()))?;
        parse_address(&record.contract)
    }
}

pub fn parse_address(address: &str) -> Result<Address> {
    let address = address.trim();
    let address = if address.starts_with("0x") {
        address.to_string()
    } else {
        format!("0x{}", address)
    };

    Address::from_str(&address)
        .map_err(|e| BridgeError::Config(format!("Failed to parse address {}: {}", address, e)))
}

/// Read the key list: a JSON array of hex private keys.
pub fn load_private_keys<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        BridgeError::Config(format!("Failed to open {}: {}", path.display(), e))
    })?;
    let keys: Vec<String> = serde_json::from_reader(file)?;
    if keys.is_empty() {
        return Err(BridgeError::Config(format!(
            "No private keys found in {}",
            path.display()
        )));
    }
    Ok(keys)
}

pub fn parse_wallet(private_key: &str) -> Result<LocalWallet> {
    let private_key = private_key.trim();
    let private_key = if private_key.starts_with("0x") {
        private_key.to_string()
    } else {
        format!("0x{}", private_key)
    };

    Ok(private_key.parse::<LocalWallet>()?)
}
