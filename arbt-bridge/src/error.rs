use ethers::types::Address;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("All RPCs failed! Tried {tried} endpoint(s)")]
    NoReachableEndpoint { tried: usize },

    #[error("Insufficient balance ({balance} ETH) for {address:?}, please claim faucet!")]
    InsufficientBalance { address: Address, balance: String },

    #[error("Failed to get the amount: {0}")]
    AmountUnavailable(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Giving up after {attempts} failed attempt(s): {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] ethers::signers::WalletError),
}

impl From<ethers::providers::ProviderError> for BridgeError {
    fn from(err: ethers::providers::ProviderError) -> Self {
        BridgeError::Transaction(err.to_string())
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        BridgeError::AmountUnavailable(err.to_string())
    }
}

impl BridgeError {
    /// Process exit code for an error that ends the run.
    ///
    /// Running out of funds is a normal stop (the wallets need the faucet),
    /// everything else is a failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            BridgeError::InsufficientBalance { .. } => 0,
            _ => 1,
        }
    }

    /// Errors the submission loop retries in place instead of giving up.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BridgeError::AmountUnavailable(_) | BridgeError::Transaction(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
