//! Encodes bridge orders for the remote order contract.
//!
//! Call layout:
//! `remoteOrder(bytes4 destination, uint32 asset, bytes32 targetAccount,
//! uint256 amount, address rewardAsset, uint256 insurance, uint256 maxReward)`

use crate::error::{BridgeError, Result};
use crate::route::Route;
use ethers::{
    abi::{self, ParamType, Token},
    core::types::{
        transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, H256, U256,
    },
};

pub const REMOTE_ORDER_SELECTOR: [u8; 4] = [0x56, 0x59, 0x1d, 0x59];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOrder {
    pub destination: [u8; 4],
    pub asset: u32,
    pub target_account: Address,
    pub amount: U256,
    pub reward_asset: Address,
    pub insurance: U256,
    pub max_reward: U256,
}

impl RemoteOrder {
    /// Native ETH order paying out to `recipient` on the route's destination.
    pub fn new(recipient: Address, amount: U256, route: Route, max_reward: U256) -> Self {
        RemoteOrder {
            destination: route.destination_id(),
            asset: 0,
            target_account: recipient,
            amount,
            reward_asset: Address::zero(),
            insurance: U256::zero(),
            max_reward,
        }
    }

    pub fn route(&self) -> Option<Route> {
        Route::from_destination_id(&self.destination)
    }

    pub fn encode(&self) -> Bytes {
        let tokens = [
            Token::FixedBytes(self.destination.to_vec()),
            Token::Uint(U256::from(self.asset)),
            Token::FixedBytes(H256::from(self.target_account).as_bytes().to_vec()),
            Token::Uint(self.amount),
            Token::Address(self.reward_asset),
            Token::Uint(self.insurance),
            Token::Uint(self.max_reward),
        ];

        let mut data = REMOTE_ORDER_SELECTOR.to_vec();
        data.extend(abi::encode(&tokens));
        data.into()
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 4 || data[..4] != REMOTE_ORDER_SELECTOR {
            return Err(BridgeError::Decode(format!(
                "not a remote order call (selector 0x{})",
                hex::encode(&data[..data.len().min(4)])
            )));
        }

        let params = [
            ParamType::FixedBytes(4),
            ParamType::Uint(32),
            ParamType::FixedBytes(32),
            ParamType::Uint(256),
            ParamType::Address,
            ParamType::Uint(256),
            ParamType::Uint(256),
        ];
        let tokens = abi::decode(&params, &data[4..])
            .map_err(|e| BridgeError::Decode(e.to_string()))?;
        let mut tokens = tokens.into_iter();
        let mut next = |what: &str| {
            tokens
                .next()
                .ok_or_else(|| BridgeError::Decode(format!("missing {}", what)))
        };

        let destination = next("destination")?
            .into_fixed_bytes()
            .ok_or_else(|| BridgeError::Decode("destination is not bytes4".into()))?;
        let asset = next("asset")?
            .into_uint()
            .ok_or_else(|| BridgeError::Decode("asset is not a uint".into()))?;
        let target = next("targetAccount")?
            .into_fixed_bytes()
            .ok_or_else(|| BridgeError::Decode("targetAccount is not bytes32".into()))?;
        let amount = next("amount")?
            .into_uint()
            .ok_or_else(|| BridgeError::Decode("amount is not a uint".into()))?;
        let reward_asset = next("rewardAsset")?
            .into_address()
            .ok_or_else(|| BridgeError::Decode("rewardAsset is not an address".into()))?;
        let insurance = next("insurance")?
            .into_uint()
            .ok_or_else(|| BridgeError::Decode("insurance is not a uint".into()))?;
        let max_reward = next("maxReward")?
            .into_uint()
            .ok_or_else(|| BridgeError::Decode("maxReward is not a uint".into()))?;

        if asset > U256::from(u32::MAX) {
            return Err(BridgeError::Decode(format!("asset {} does not fit uint32", asset)));
        }
        let mut dest = [0u8; 4];
        dest.copy_from_slice(&destination);

        Ok(RemoteOrder {
            destination: dest,
            asset: asset.as_u32(),
            target_account: Address::from(H256::from_slice(&target)),
            amount,
            reward_asset,
            insurance,
            max_reward,
        })
    }
}

/// Payload for a bridge of `amount` from `sender` to the same address on the
/// route's destination chain.
pub fn transaction_data(sender: Address, amount: U256, route: Route, value: U256) -> Bytes {
    RemoteOrder::new(sender, amount, route, value).encode()
}

/// Everything needed to price and send one bridge transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionAttempt {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub gas_price: U256,
}

impl TransactionAttempt {
    pub fn new(
        contract: Address,
        sender: Address,
        amount: U256,
        route: Route,
        value: U256,
        gas_price: U256,
    ) -> Self {
        TransactionAttempt {
            to: contract,
            data: transaction_data(sender, amount, route, value),
            value,
            gas_price,
        }
    }

    /// Request used for gas estimation.
    pub fn estimate_request(&self, from: Address) -> TypedTransaction {
        TransactionRequest::new()
            .from(from)
            .to(self.to)
            .data(self.data.clone())
            .value(self.value)
            .gas_price(self.gas_price)
            .into()
    }

    /// Request sent to the network once the gas limit is known.
    pub fn send_request(&self, from: Address, gas_limit: U256) -> TypedTransaction {
        TransactionRequest::new()
            .from(from)
            .to(self.to)
            .data(self.data.clone())
            .value(self.value)
            .gas_price(self.gas_price)
            .gas(gas_limit)
            .into()
    }
}
