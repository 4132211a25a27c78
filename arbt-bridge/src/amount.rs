use crate::config::BRIDGE_VALUE_WEI;
use crate::error::{BridgeError, Result};
use crate::route::Route;
use async_trait::async_trait;
use ethers::core::types::U256;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Source of the amount placed in each bridge order.
#[async_trait]
pub trait AmountProvider {
    async fn get_amount(&self, route: Route) -> Result<U256>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EstimateRequest<'a> {
    from_asset: &'a str,
    to_asset: &'a str,
    from_chain: &'a str,
    to_chain: &'a str,
    amount_wei: String,
    #[serde(rename = "executorTipUSD")]
    executor_tip_usd: u64,
    overpay_option_percentage: u64,
    spread_option_percentage: u64,
}

impl<'a> EstimateRequest<'a> {
    fn for_route(route: Route) -> Self {
        EstimateRequest {
            from_asset: "eth",
            to_asset: "eth",
            from_chain: "arbt",
            to_chain: route.chain_code(),
            amount_wei: BRIDGE_VALUE_WEI.to_string(),
            executor_tip_usd: 0,
            overpay_option_percentage: 0,
            spread_option_percentage: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HexAmount {
    hex: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EstimateResponse {
    estimated_received_amount_wei: Option<HexAmount>,
}

impl EstimateResponse {
    /// A missing or zero estimate means there is nothing to bridge.
    fn amount(&self) -> Result<U256> {
        let hex = &self
            .estimated_received_amount_wei
            .as_ref()
            .ok_or_else(|| BridgeError::AmountUnavailable("no estimate in response".into()))?
            .hex;
        let digits = hex.trim_start_matches("0x");
        let amount = U256::from_str_radix(digits, 16)
            .map_err(|e| BridgeError::AmountUnavailable(format!("bad amount {}: {}", hex, e)))?;
        if amount.is_zero() {
            return Err(BridgeError::AmountUnavailable("estimate is zero".into()));
        }
        Ok(amount)
    }
}

/// Client for the bridge's pricing API.
pub struct PricerClient {
    http: Client,
    url: String,
}

impl PricerClient {
    pub fn new(url: String) -> Self {
        PricerClient {
            http: Client::new(),
            url,
        }
    }
}

#[async_trait]
impl AmountProvider for PricerClient {
    async fn get_amount(&self, route: Route) -> Result<U256> {
        let request = EstimateRequest::for_route(route);
        debug!("requesting estimate for {}", route.chain_code());

        let resp: EstimateResponse = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        resp.amount()
    }
}
