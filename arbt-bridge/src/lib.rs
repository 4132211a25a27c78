//! Submits bridge orders from Arbitrum Sepolia to Base, Blast or Optimism
//! Sepolia for a list of wallets.

pub mod amount;
pub mod app;
pub mod builder;
pub mod chain;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod prompt;
pub mod route;
pub mod submit;
pub mod txlog;

pub use error::{BridgeError, Result};
pub use route::Route;
