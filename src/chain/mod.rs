//! Ethereum balance lookup.
//!
//! The coordinator only sees the [`BalanceLookup`] trait; the real
//! implementation is a thin JSON-RPC client calling `eth_getBalance`
//! against a configured node.

pub mod error;
pub mod eth;

pub use error::LookupError;
pub use eth::{BalanceLookup, EthRpcClient, is_eth_address, wei_to_eth};
